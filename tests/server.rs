extern crate crossbeam_channel;
extern crate tk_reactor;

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use tk_reactor::channel::Collector;
use tk_reactor::server::{self, Request, Response, Service};
use tk_reactor::websocket::Packet;
use tk_reactor::{Config, ConnectionContext, Server, Status};


fn connect(server: &Server) -> TcpStream {
    let sock = TcpStream::connect(server.local_addr()).unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    sock
}

fn read_head(sock: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        sock.read_exact(&mut byte).unwrap();
        head.push(byte[0]);
    }
    String::from_utf8(head).unwrap()
}

#[test]
fn serve_requests() {
    let config = Config::new().port(0).done();
    let server = Server::start(&config, |ctx: &mut ConnectionContext| {
        server::bind_service(ctx, |req: Request| {
            Response::new(Status::Ok).body(format!("path={}", req.path()))
        });
    }).unwrap();
    assert!(server.is_running());

    let mut sock = connect(&server);
    sock.write_all(b"GET /one HTTP/1.1\r\nHost: test\r\n\r\n").unwrap();
    let head = read_head(&mut sock);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    let mut body = [0u8; 19];
    sock.read_exact(&mut body).unwrap();
    assert_eq!(&body[..], b"9\r\npath=/one\r\n0\r\n\r\n");

    sock.write_all(b"GET /two HTTP/1.1\r\nConnection: close\r\n\r\n")
        .unwrap();
    let mut rest = String::new();
    sock.read_to_string(&mut rest).unwrap();
    assert!(rest.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(rest.ends_with("9\r\npath=/two\r\n0\r\n\r\n"));

    server.stop();
    server.stop();
    server.join();
}

struct Pusher;

impl Service for Pusher {
    fn call(&mut self, _req: Request) -> Response {
        Response::new(Status::NotFound)
    }
    fn accept_websocket(&mut self, _req: &Request) -> bool {
        true
    }
}

#[test]
fn remote_push() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let config = Config::new().port(0).done();
    let server = Server::start(&config, move |ctx: &mut ConnectionContext| {
        tx.send(ctx.id()).unwrap();
        server::bind_service(ctx, Pusher);
    }).unwrap();

    let mut sock = connect(&server);
    sock.write_all(b"GET /events HTTP/1.1\r\n\
        Host: test\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n").unwrap();
    let head = read_head(&mut sock);
    assert!(head.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));

    let id = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    let remote = server.remote();
    remote.send_packet(id, Packet::Text("push".into())).unwrap();
    let mut frame = [0u8; 6];
    sock.read_exact(&mut frame).unwrap();
    assert_eq!(&frame, b"\x81\x04push");

    remote.close(id).unwrap();
    let mut rest = Vec::new();
    sock.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn peer_eof_closes_socket() {
    let config = Config::new().port(0).done();
    let server = Server::start(&config, |ctx: &mut ConnectionContext| {
        // input is consumed but nothing is ever written
        let (sink, _) = Collector::<Vec<u8>>::unbounded();
        ctx.input().subscribe(sink);
    }).unwrap();

    let mut sock = connect(&server);
    sock.write_all(b"some bytes").unwrap();
    sock.shutdown(Shutdown::Write).unwrap();
    let mut rest = Vec::new();
    sock.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn response_written_before_close_on_eof() {
    let config = Config::new().port(0).done();
    let server = Server::start(&config, |ctx: &mut ConnectionContext| {
        server::bind_service(ctx, |req: Request| {
            Response::new(Status::Ok).body(format!("path={}", req.path()))
        });
    }).unwrap();

    let mut sock = connect(&server);
    sock.write_all(b"GET /half HTTP/1.1\r\nHost: test\r\n\r\n").unwrap();
    sock.shutdown(Shutdown::Write).unwrap();
    let mut rest = String::new();
    sock.read_to_string(&mut rest).unwrap();
    assert!(rest.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(rest.ends_with("a\r\npath=/half\r\n0\r\n\r\n"));
}
