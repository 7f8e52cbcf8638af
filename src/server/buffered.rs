use std::net::SocketAddr;

use crate::channel::Transform;
use crate::context::{Attributes, ConnectionContext, Protocol, ProtocolSwitch};
use crate::enums::{Status, Version};
use crate::headers;
use crate::websocket::{self, Assembler, FrameEvent, Packet};
use crate::Error;
use super::{InboundEvent, OutboundEvent, RequestEvent, ResponseEvent};
use super::{ServerDecoder, ServerEncoder, SimpleErrorPage};


/// Attribute under which the request being received is stored
pub const REQUEST_ATTRIBUTE: &'static str = "tk_reactor.request";

/// Buffered request struct
///
/// The whole body is read before the service is called.
#[derive(Debug)]
pub struct Request {
    peer_addr: SocketAddr,
    method: String,
    path: String,
    host: Option<String>,
    version: Version,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
    headers_done: bool,
    expect_continue: bool,
    close: bool,
}

/// Buffered response
///
/// Body length headers are set by the encoder, adding them has no effect.
#[derive(Debug, Clone)]
pub struct Response {
    status: Status,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
    close: bool,
}

/// Application side of the buffered server
pub trait Service {
    /// Produce a response for a complete request
    fn call(&mut self, request: Request) -> Response;

    /// Return true to accept a websocket upgrade for this request
    ///
    /// Rejected upgrade requests are passed to `call()` as usual.
    fn accept_websocket(&mut self, _request: &Request) -> bool {
        false
    }

    /// Subprotocols supported, empty list means any
    fn protocols(&self) -> &[&str] {
        &[]
    }

    /// A text or binary websocket message
    ///
    /// Pings are answered and close is echoed without calling this.
    fn message(&mut self, _packet: Packet, _replies: &mut Vec<Packet>) {
    }
}

/// Aggregates request events into `Request` and calls `Service`
///
/// After an accepted upgrade it dispatches websocket messages instead.
pub struct BufferedHandler<S> {
    service: S,
    peer_addr: SocketAddr,
    attributes: Attributes,
    protocol: ProtocolSwitch,
    assembler: Assembler,
    done: bool,
}

impl Request {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
    pub fn method(&self) -> &str {
        &self.method
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    /// Value of the `Host` header
    pub fn host(&self) -> Option<&str> {
        self.host.as_ref().map(|x| &x[..])
    }
    pub fn version(&self) -> Version {
        self.version
    }
    pub fn headers(&self) -> &[(String, Vec<u8>)] {
        &self.headers
    }
    /// First header with the name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers.iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| &v[..])
    }
    pub fn body(&self) -> &[u8] {
        &self.body
    }
    /// True if the connection is closed after the response
    ///
    /// It is for `Connection: close` and for HTTP/1.0 requests.
    pub fn wants_close(&self) -> bool {
        self.close
    }
    fn header_pairs<'a>(&'a self)
        -> impl Iterator<Item=(&'a str, &'a [u8])> + 'a
    {
        self.headers.iter().map(|&(ref n, ref v)| (&n[..], &v[..]))
    }
}

impl Response {
    pub fn new(status: Status) -> Response {
        Response {
            status: status,
            headers: Vec::new(),
            body: Vec::new(),
            close: false,
        }
    }
    /// Adds a header
    pub fn header<V: AsRef<[u8]>>(mut self, name: &str, value: V) -> Response
    {
        self.headers.push((name.to_string(), value.as_ref().to_vec()));
        self
    }
    /// Sets the body, it's dropped for statuses which can't have one
    pub fn body<V: Into<Vec<u8>>>(mut self, data: V) -> Response {
        self.body = data.into();
        self
    }
    /// Close connection after the response
    pub fn close(mut self) -> Response {
        self.close = true;
        self
    }
    pub fn status(&self) -> &Status {
        &self.status
    }
}

impl<F> Service for F
    where F: FnMut(Request) -> Response,
{
    fn call(&mut self, request: Request) -> Response {
        (self)(request)
    }
}

/// Wires a buffered service to the connection
///
/// Builds the `decoder -> handler -> encoder -> write queue` chain, this is
/// what a typical connection initializer calls.
pub fn bind_service<S: Service + 'static>(ctx: &ConnectionContext, service: S) {
    ctx.input()
        .pipe(ServerDecoder::new(ctx))
        .pipe(BufferedHandler::new(ctx, service))
        .pipe(ServerEncoder::new())
        .subscribe(ctx.output().sink());
}

impl<S: Service> BufferedHandler<S> {
    pub fn new(ctx: &ConnectionContext, service: S) -> BufferedHandler<S> {
        BufferedHandler {
            service: service,
            peer_addr: ctx.peer_addr(),
            attributes: ctx.attributes().clone(),
            protocol: ctx.protocol().clone(),
            assembler: Assembler::new(ctx.config().max_frame_length),
            done: false,
        }
    }

    fn http(&mut self, event: RequestEvent, out: &mut Vec<OutboundEvent>) {
        match event {
            RequestEvent::RequestLine { method, uri, version } => {
                trace!("Request {} {} {}", method, uri, version);
                self.attributes.insert(REQUEST_ATTRIBUTE, Request {
                    peer_addr: self.peer_addr,
                    method: method,
                    path: uri,
                    host: None,
                    version: version,
                    headers: Vec::new(),
                    body: Vec::new(),
                    headers_done: false,
                    expect_continue: false,
                    close: version == Version::Http10,
                });
            }
            RequestEvent::Header { name, value } => {
                self.attributes.with(REQUEST_ATTRIBUTE, |req: &mut Request| {
                    if name.eq_ignore_ascii_case("Host") {
                        req.host = Some(
                            String::from_utf8_lossy(&value).into_owned());
                    } else if headers::is_connection(&name) {
                        req.close |= headers::is_close(&value);
                    } else if headers::is_expect(&name) {
                        req.expect_continue = headers::is_continue(&value);
                    }
                    req.headers.push((name, value));
                });
            }
            RequestEvent::Body { data, last } => {
                let found = self.attributes.with(REQUEST_ATTRIBUTE,
                    |req: &mut Request| {
                        if !req.headers_done {
                            req.headers_done = true;
                            if req.expect_continue && !last &&
                                req.version == Version::Http11
                            {
                                out.push(OutboundEvent::Http(
                                    ResponseEvent::Continue {
                                        version: req.version,
                                    }));
                            }
                        }
                        req.body.extend_from_slice(&data);
                    });
                if found.is_none() {
                    warn!("Body received without request line");
                    return;
                }
                if last {
                    if let Some(req) = self.attributes
                        .remove::<Request>(REQUEST_ATTRIBUTE)
                    {
                        self.respond(req, out);
                    }
                }
            }
        }
    }

    fn respond(&mut self, req: Request, out: &mut Vec<OutboundEvent>) {
        let version = req.version;
        let close = req.close;
        if websocket::is_websocket_upgrade(req.header_pairs()) &&
            self.service.accept_websocket(&req)
        {
            let result = websocket::negotiate(&req.method, req.header_pairs(),
                                              self.service.protocols());
            match result {
                Ok(handshake) => {
                    debug!("Websocket upgrade for {} accepted", req.path);
                    out.extend(handshake.response().into_iter()
                        .map(OutboundEvent::Http));
                    self.protocol.switch_to(Protocol::WebSocket);
                }
                Err(e) => {
                    debug!("Websocket handshake rejected: {}", e);
                    let page = SimpleErrorPage::new(Status::BadRequest);
                    self.write(version, true, page.into(), out);
                }
            }
            return;
        }
        let response = self.service.call(req);
        self.write(version, close, response, out);
    }

    fn write(&mut self, version: Version, close: bool, response: Response,
        out: &mut Vec<OutboundEvent>)
    {
        let close = close || response.close;
        let has_body = response.status.has_body();
        trace!("Response {} (close: {})", response.status.code(), close);
        out.push(OutboundEvent::Http(ResponseEvent::StatusLine {
            version: version,
            status: response.status,
        }));
        #[cfg(feature="date_header")]
        out.push(OutboundEvent::Http(ResponseEvent::date()));
        for (name, value) in response.headers {
            if close && headers::is_connection(&name) {
                continue;
            }
            out.push(OutboundEvent::Http(ResponseEvent::Header {
                name: name,
                value: value,
            }));
        }
        if close {
            out.push(OutboundEvent::Http(
                ResponseEvent::header("Connection", "close")));
        }
        if has_body && !response.body.is_empty() {
            out.push(OutboundEvent::Http(
                ResponseEvent::body(response.body, false)));
        }
        out.push(OutboundEvent::Http(ResponseEvent::body(Vec::new(), true)));
        if close {
            self.done = true;
        }
    }

    fn websocket(&mut self, event: FrameEvent, out: &mut Vec<OutboundEvent>) {
        let mut packets = Vec::new();
        if let Err(e) = self.assembler.push(event, &mut packets) {
            self.close_websocket(e.close_code(), out);
            return;
        }
        for packet in packets {
            match packet {
                Packet::Ping(data) => {
                    out.push(OutboundEvent::WebSocket(Packet::Pong(data)));
                }
                Packet::Pong(_) => {}
                Packet::Close(code, reason) => {
                    debug!("Websocket closed by peer: {} {:?}", code, reason);
                    self.close_websocket(code, out);
                    return;
                }
                packet => {
                    let mut replies = Vec::new();
                    self.service.message(packet, &mut replies);
                    for reply in replies {
                        let is_close = matches!(reply, Packet::Close(..));
                        out.push(OutboundEvent::WebSocket(reply));
                        if is_close {
                            self.done = true;
                            return;
                        }
                    }
                }
            }
        }
    }

    fn close_websocket(&mut self, code: u16, out: &mut Vec<OutboundEvent>) {
        out.push(OutboundEvent::WebSocket(Packet::Close(code, String::new())));
        self.done = true;
    }
}

fn is_limit(status: &Status) -> bool {
    matches!(*status,
        Status::RequestEntityTooLarge | Status::RequestHeaderFieldsTooLarge)
}

impl<S: Service> Transform for BufferedHandler<S> {
    type Input = InboundEvent;
    type Output = OutboundEvent;

    fn transform(&mut self, event: InboundEvent, out: &mut Vec<OutboundEvent>)
        -> Result<(), Error>
    {
        match event {
            InboundEvent::Http(ev) => self.http(ev, out),
            InboundEvent::WebSocket(ev) => self.websocket(ev, out),
        }
        Ok(())
    }

    fn fail(&mut self, error: Error, out: &mut Vec<OutboundEvent>)
        -> Result<(), Error>
    {
        if let Error::WebSocket(ref e) = error {
            self.close_websocket(e.close_code(), out);
            return Ok(());
        }
        let status = error.http_status();
        let req = self.attributes.remove::<Request>(REQUEST_ATTRIBUTE);
        match (req, status) {
            // partially parsed requests are closed without a response,
            // except for the limits which are worth reporting
            (Some(req), Some(status))
                if req.headers_done || is_limit(&status)
            => {
                debug!("Responding {} to failed request: {}",
                    status.code(), error);
                self.write(req.version, true,
                           SimpleErrorPage::new(status).into(), out);
                Ok(())
            }
            _ => Err(error),
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
