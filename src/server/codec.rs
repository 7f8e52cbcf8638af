use std::sync::Arc;

use crate::channel::Transform;
use crate::context::{ConnectionContext, Protocol, ProtocolSwitch};
use crate::websocket::{self, FrameDecoder, FrameEvent, Packet};
use crate::{Config, Error};
use super::{HttpDecoder, HttpEncoder, RequestEvent, ResponseEvent};
use super::Error as HttpError;


/// Event decoded from the connection's bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Http(RequestEvent),
    WebSocket(FrameEvent),
}

/// Event to be serialized to the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    Http(ResponseEvent),
    /// A whole websocket message, allowed after the upgrade response
    WebSocket(Packet),
    /// Bytes written verbatim
    Raw(Vec<u8>),
}

enum ActiveDecoder {
    Http(HttpDecoder),
    WebSocket(FrameDecoder),
}

/// Decoder stage of a server connection
///
/// Decodes HTTP until the protocol switch says otherwise, then replaces
/// the HTTP decoder by a websocket frame decoder.
pub struct ServerDecoder {
    config: Arc<Config>,
    protocol: ProtocolSwitch,
    active: ActiveDecoder,
    http_events: Vec<RequestEvent>,
    frame_events: Vec<FrameEvent>,
}

/// Encoder stage of a server connection
pub struct ServerEncoder {
    http: HttpEncoder,
    buf: Vec<u8>,
}

impl ServerDecoder {
    pub fn new(ctx: &ConnectionContext) -> ServerDecoder {
        ServerDecoder {
            config: ctx.config().clone(),
            protocol: ctx.protocol().clone(),
            active: ActiveDecoder::Http(HttpDecoder::new(ctx.config())),
            http_events: Vec::new(),
            frame_events: Vec::new(),
        }
    }

    fn sync_protocol(&mut self) {
        let is_http = matches!(self.active, ActiveDecoder::Http(_));
        match (is_http, self.protocol.get()) {
            (true, Protocol::WebSocket) => {
                debug!("Decoder switched to websocket frames");
                self.active = ActiveDecoder::WebSocket(
                    FrameDecoder::new(&self.config));
            }
            (false, Protocol::Http) => {
                debug!("Decoder switched back to http");
                self.active = ActiveDecoder::Http(
                    HttpDecoder::new(&self.config));
            }
            _ => {}
        }
    }
}

impl Transform for ServerDecoder {
    type Input = Vec<u8>;
    type Output = InboundEvent;

    fn transform(&mut self, bytes: Vec<u8>, out: &mut Vec<InboundEvent>)
        -> Result<(), Error>
    {
        self.sync_protocol();
        trace!("Decoding {} bytes", bytes.len());
        match self.active {
            ActiveDecoder::Http(ref mut dec) => {
                let res = dec.decode(&bytes, &mut self.http_events);
                out.extend(self.http_events.drain(..).map(InboundEvent::Http));
                res.map_err(Error::from)
            }
            ActiveDecoder::WebSocket(ref mut dec) => {
                let res = dec.decode(&bytes, &mut self.frame_events);
                out.extend(self.frame_events.drain(..)
                    .map(InboundEvent::WebSocket));
                res.map_err(Error::from)
            }
        }
    }

    fn finish(&mut self, _out: &mut Vec<InboundEvent>) -> Result<(), Error> {
        match self.active {
            ActiveDecoder::Http(ref dec) if !dec.is_idle() => {
                Err(HttpError::ConnectionReset.into())
            }
            ActiveDecoder::WebSocket(ref dec) if !dec.is_idle() => {
                Err(Error::Closed)
            }
            _ => Ok(()),
        }
    }
}

impl ServerEncoder {
    pub fn new() -> ServerEncoder {
        ServerEncoder {
            http: HttpEncoder::new(),
            buf: Vec::new(),
        }
    }
}

impl Transform for ServerEncoder {
    type Input = OutboundEvent;
    type Output = Vec<u8>;

    fn transform(&mut self, event: OutboundEvent, out: &mut Vec<Vec<u8>>)
        -> Result<(), Error>
    {
        match event {
            OutboundEvent::Http(ev) => self.http.encode(ev, &mut self.buf)?,
            OutboundEvent::WebSocket(ref packet) => {
                if !self.http.is_idle() {
                    return Err(HttpError::ResponseOutOfOrder.into());
                }
                websocket::write_packet(&mut self.buf, packet, None);
            }
            OutboundEvent::Raw(data) => {
                if !data.is_empty() {
                    out.push(data);
                }
                return Ok(());
            }
        }
        if !self.buf.is_empty() {
            out.push(self.buf.split_off(0));
        }
        Ok(())
    }
}
