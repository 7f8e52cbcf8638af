extern crate tk_reactor;

use std::sync::Arc;

use tk_reactor::server::{self, Request, Response, Service};
use tk_reactor::websocket::{self, Packet};
use tk_reactor::{Config, ConnectionContext, Protocol, Status};


fn context(config: &Arc<Config>) -> ConnectionContext {
    ConnectionContext::new("127.0.0.1:40000".parse().unwrap(), config)
}

fn echo_path(req: Request) -> Response {
    Response::new(Status::Ok)
        .header("Content-Type", "text/plain")
        .body(format!("{} {}", req.method(), req.path()))
}

fn feed(ctx: &ConnectionContext, data: &[u8]) -> String {
    ctx.input().offer(data.to_vec());
    String::from_utf8_lossy(&ctx.output().take_bytes()).into_owned()
}

#[test]
fn simple_request() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, echo_path);
    let out = feed(&ctx, b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"), "{:?}", out);
    assert!(out.contains("Content-Type: text/plain\r\n"));
    assert!(out.ends_with("Transfer-Encoding: chunked\r\n\r\n\
                           a\r\nGET /hello\r\n0\r\n\r\n"), "{:?}", out);
    assert!(!ctx.output().is_closing());
}

#[test]
fn pipelined_in_order() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, echo_path);
    let out = feed(&ctx, b"GET /a HTTP/1.1\r\n\r\n\
                           POST /b HTTP/1.1\r\nContent-Length: 1\r\n\r\nx\
                           GET /c HTTP/1.1\r\n\r\n");
    let a = out.find("GET /a").unwrap();
    let b = out.find("POST /b").unwrap();
    let c = out.find("GET /c").unwrap();
    assert!(a < b && b < c);
    assert_eq!(out.matches("HTTP/1.1 200 OK").count(), 3);
}

#[test]
fn connection_close() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, echo_path);
    let out = feed(&ctx, b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n\
                           GET /ignored HTTP/1.1\r\n\r\n");
    assert_eq!(out.matches("HTTP/1.1 200 OK").count(), 1);
    assert!(out.contains("Connection: close\r\n"));
    assert!(ctx.output().is_closing());
    assert!(ctx.output().close_reached());
}

#[test]
fn http10() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, echo_path);
    let out = feed(&ctx, b"GET /old HTTP/1.0\r\n\r\n");
    assert!(out.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(out.contains("Connection: close\r\n"));
    assert!(out.ends_with("\r\n\r\nGET /old"));
    assert!(ctx.output().is_closing());
}

#[test]
fn expect_continue() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, |req: Request| {
        Response::new(Status::Created).body(req.body().to_vec())
    });
    let out = feed(&ctx, b"PUT /up HTTP/1.1\r\nContent-Length: 5\r\n\
                           Expect: 100-continue\r\n\r\n");
    assert_eq!(out, "HTTP/1.1 100 Continue\r\n\r\n");
    let out = feed(&ctx, b"hello");
    assert!(out.starts_with("HTTP/1.1 201 Created\r\n"));
    assert!(out.ends_with("5\r\nhello\r\n0\r\n\r\n"));
}

#[test]
fn body_too_long() {
    let ctx = context(&Config::new().max_body_length(4).done());
    server::bind_service(&ctx, echo_path);
    let out = feed(&ctx, b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\n");
    assert!(out.starts_with("HTTP/1.1 413 Request Entity Too Large\r\n"),
            "{:?}", out);
    assert!(out.contains("<h1>413 Request Entity Too Large</h1>"));
    assert!(ctx.output().is_closing());
}

#[test]
fn garbage_closes_silently() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, echo_path);
    let out = feed(&ctx, b"HELLO\r\n\r\n");
    assert_eq!(out, "");
    assert!(ctx.output().is_aborted());
}

#[test]
fn eof_inside_request() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, echo_path);
    assert_eq!(feed(&ctx, b"GET / HTTP/1.1\r\nHost: x"), "");
    ctx.input().complete();
    assert!(ctx.output().is_aborted());
}

#[test]
fn eof_between_requests() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, echo_path);
    feed(&ctx, b"GET / HTTP/1.1\r\n\r\n");
    ctx.input().complete();
    assert!(!ctx.output().is_aborted());
    assert!(ctx.output().close_reached());
}

struct Chat;

impl Service for Chat {
    fn call(&mut self, _req: Request) -> Response {
        server::SimpleErrorPage::new(Status::NotFound).into()
    }
    fn accept_websocket(&mut self, req: &Request) -> bool {
        req.path() == "/chat"
    }
    fn protocols(&self) -> &[&str] {
        &["chat"]
    }
    fn message(&mut self, packet: Packet, replies: &mut Vec<Packet>) {
        if let Packet::Text(text) = packet {
            replies.push(Packet::Text(text.to_uppercase()));
        }
    }
}

const UPGRADE: &[u8] = b"GET /chat HTTP/1.1\r\n\
    Host: server.example.com\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
    Sec-WebSocket-Protocol: chat\r\n\
    Sec-WebSocket-Version: 13\r\n\r\n";

fn client_frame(packet: Packet) -> Vec<u8> {
    let mut buf = Vec::new();
    websocket::write_packet(&mut buf, &packet, Some([0x37, 0xfa, 0x21, 0x3d]));
    buf
}

#[test]
fn websocket_session() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, Chat);
    let out = feed(&ctx, UPGRADE);
    assert_eq!(out, "HTTP/1.1 101 Switching Protocols\r\n\
                     Upgrade: websocket\r\n\
                     Connection: Upgrade\r\n\
                     Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
                     Sec-WebSocket-Protocol: chat\r\n\r\n");
    assert_eq!(ctx.protocol().get(), Protocol::WebSocket);

    ctx.input().offer(client_frame(Packet::Text("hi".into())));
    assert_eq!(ctx.output().take_bytes(), b"\x81\x02HI");
    ctx.input().offer(client_frame(Packet::Ping(b"x".to_vec())));
    assert_eq!(ctx.output().take_bytes(), b"\x8A\x01x");
    ctx.input().offer(client_frame(Packet::Close(1000, "bye".into())));
    assert_eq!(ctx.output().take_bytes(), b"\x88\x02\x03\xE8");
    assert!(ctx.output().close_reached());
}

#[test]
fn websocket_rejected() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, Chat);
    let request = String::from_utf8(UPGRADE.to_vec()).unwrap()
        .replace("Version: 13", "Version: 8");
    let out = feed(&ctx, request.as_bytes());
    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{:?}", out);
    assert_eq!(ctx.protocol().get(), Protocol::Http);
    assert!(ctx.output().is_closing());
}

#[test]
fn websocket_protocol_error() {
    let ctx = context(&Config::new().done());
    server::bind_service(&ctx, Chat);
    feed(&ctx, UPGRADE);
    // unmasked frame from a client
    let mut frame = Vec::new();
    websocket::write_packet(&mut frame, &Packet::Text("x".into()), None);
    ctx.input().offer(frame);
    assert_eq!(ctx.output().take_bytes(), b"\x88\x02\x03\xEA");
    assert!(ctx.output().close_reached());
}

#[test]
fn output_watermark_bounds_queue() {
    let config = Config::new().output_high_watermark(50).done();
    let ctx = context(&config);
    server::bind_service(&ctx, |_req: Request| {
        Response::new(Status::Ok).body(vec![b'x'; 100])
    });
    let requests = b"GET / HTTP/1.1\r\n\r\n".repeat(20);
    ctx.input().offer(requests);
    let mut responses = 0;
    loop {
        assert!(ctx.output().buffered() < 50 + 200,
                "buffered {}", ctx.output().buffered());
        let bytes = ctx.output().take_bytes();
        if bytes.is_empty() {
            break;
        }
        responses += String::from_utf8_lossy(&bytes)
            .matches("HTTP/1.1 200 OK").count();
    }
    assert_eq!(responses, 20);
}
