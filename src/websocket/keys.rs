use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::{Rng, thread_rng};
use sha1::{Digest, Sha1};


/// WebSocket GUID constant from RFC 6455
pub const GUID: &'static str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// The `Sec-WebSocket-Accept` header value
///
/// Use `Display` to put it into a header.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Accept([u8; 20]);

/// The `Sec-WebSocket-Key` header value
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Key([u8; 16]);

impl Key {
    /// Create a new (random) key, eligible to use for client connection
    pub fn new() -> Key {
        let mut key = [0u8; 16];
        thread_rng().fill(&mut key[..]);
        return Key(key);
    }
    /// Parses a header value, it must be a base64-encoded 16 byte nonce
    pub fn from_header(value: &[u8]) -> Option<Key> {
        let bytes = STANDARD.decode(crate::buffer::trim(value)).ok()?;
        if bytes.len() != 16 {
            return None;
        }
        let mut key = [0u8; 16];
        key.copy_from_slice(&bytes);
        Some(Key(key))
    }
    /// Computes the value the server sends back
    pub fn accept(&self) -> Accept {
        Accept::from_key_bytes(self.to_string().as_bytes())
    }
}

impl Accept {
    /// Create an Accept header value from a key received in header
    ///
    /// Note: key here is a key as passed in header value (base64-encoded)
    /// despite that it's accepted as bytes (not as 16 bytes stored in Key)
    pub fn from_key_bytes(key: &[u8]) -> Accept {
        let mut sha1 = Sha1::new();
        sha1.update(key);
        sha1.update(GUID.as_bytes());
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&sha1.finalize());
        Accept(digest)
    }
}

impl fmt::Display for Accept {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&STANDARD.encode(&self.0))
    }
}

impl fmt::Debug for Accept {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "websocket::Accept({})", self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&STANDARD.encode(&self.0))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "websocket::Key({})", self)
    }
}
