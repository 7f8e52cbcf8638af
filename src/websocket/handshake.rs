use std::str::from_utf8;

use crate::buffer::trim;
use crate::enums::{Status, Version};
use crate::headers;
use crate::server::ResponseEvent;
use super::{Accept, Key, HandshakeError};


/// Result of a successful websocket handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Value for the `Sec-WebSocket-Accept` header
    pub accept: Accept,
    /// Negotiated subprotocols, in the order the client listed them
    pub protocols: Vec<String>,
}

/// Checks whether the request asks for a websocket upgrade at all
///
/// This is `true` when `Upgrade: websocket` is present, regardless of other
/// headers. Use `negotiate` to validate the request.
pub fn is_websocket_upgrade<'a, I>(fields: I) -> bool
    where I: IntoIterator<Item=(&'a str, &'a [u8])>
{
    fields.into_iter().any(|(name, value)| {
        headers::is_upgrade(name) && headers::has_token(value, "websocket")
    })
}

/// Validates an upgrade request and computes the response
///
/// `supported` is the list of subprotocols the server speaks. If it's
/// empty, protocols requested by the client are ignored.
pub fn negotiate<'a, I>(method: &str, fields: I, supported: &[&str])
    -> Result<Handshake, HandshakeError>
    where I: IntoIterator<Item=(&'a str, &'a [u8])>
{
    let mut connection = false;
    let mut upgrade = false;
    let mut version = None;
    let mut key = None;
    let mut requested = Vec::new();
    for (name, value) in fields {
        if headers::is_connection(name) {
            connection |= headers::has_token(value, "upgrade");
        } else if headers::is_upgrade(name) {
            upgrade |= headers::has_token(value, "websocket");
        } else if name.eq_ignore_ascii_case("Sec-WebSocket-Version") {
            version = Some(trim(value).to_vec());
        } else if name.eq_ignore_ascii_case("Sec-WebSocket-Key") {
            key = Some(trim(value).to_vec());
        } else if name.eq_ignore_ascii_case("Sec-WebSocket-Protocol") {
            let list = from_utf8(value).unwrap_or("");
            requested.extend(list.split(',')
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(|p| p.to_string()));
        }
    }
    if method != "GET" {
        return Err(HandshakeError::WrongMethod);
    }
    if !connection {
        return Err(HandshakeError::NotUpgrade);
    }
    if !upgrade {
        return Err(HandshakeError::WrongUpgrade);
    }
    if version.as_ref().map(|v| &v[..]) != Some(&b"13"[..]) {
        return Err(HandshakeError::UnsupportedVersion);
    }
    let key = key.ok_or(HandshakeError::MissingKey)?;
    if Key::from_header(&key).is_none() {
        return Err(HandshakeError::InvalidKey);
    }
    let mut protocols = Vec::new();
    if !requested.is_empty() && !supported.is_empty() {
        protocols = requested.into_iter()
            .filter(|p| supported.iter().any(|s| *s == p.as_str()))
            .collect();
        if protocols.is_empty() {
            return Err(HandshakeError::NoCommonProtocol);
        }
    }
    Ok(Handshake {
        accept: Accept::from_key_bytes(&key),
        protocols: protocols,
    })
}

impl Handshake {
    /// Events of the `101 Switching Protocols` response
    pub fn response(&self) -> Vec<ResponseEvent> {
        let mut events = vec![
            ResponseEvent::StatusLine {
                version: Version::Http11,
                status: Status::SwitchingProtocol,
            },
            ResponseEvent::header("Upgrade", "websocket"),
            ResponseEvent::header("Connection", "Upgrade"),
            ResponseEvent::header("Sec-WebSocket-Accept",
                                  self.accept.to_string()),
        ];
        if !self.protocols.is_empty() {
            events.push(ResponseEvent::header("Sec-WebSocket-Protocol",
                                              self.protocols.join(",")));
        }
        events.push(ResponseEvent::body(Vec::new(), true));
        events
    }
}
