//! Hello world and websocket echo
//!
//! Try `curl http://localhost:8080/` or connect a websocket client to
//! `ws://localhost:8080/echo`.
#[macro_use] extern crate log;

use tk_reactor::server::{self, Request, Response, Service};
use tk_reactor::websocket::Packet;
use tk_reactor::{Config, ConnectionContext, Server, Status};

const BODY: &'static str = "Hello World!";

struct Hello;

impl Service for Hello {
    fn call(&mut self, req: Request) -> Response {
        info!("{} {} from {}", req.method(), req.path(), req.peer_addr());
        match req.path() {
            "/" => Response::new(Status::Ok)
                .header("Content-Type", "text/plain")
                .header("Server",
                    concat!("tk-reactor/", env!("CARGO_PKG_VERSION")))
                .body(BODY),
            _ => server::SimpleErrorPage::new(Status::NotFound).into(),
        }
    }
    fn accept_websocket(&mut self, req: &Request) -> bool {
        req.path() == "/echo"
    }
    fn message(&mut self, packet: Packet, replies: &mut Vec<Packet>) {
        replies.push(packet);
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::new().host("0.0.0.0").port(8080).done();
    let server = Server::start(&config, |ctx: &mut ConnectionContext| {
        server::bind_service(ctx, Hello);
    }).expect("start server");
    info!("Serving on {}", server.local_addr());
    server.join();
}
