use crate::buffer::stringify;
use crate::enums::{Status, Version};
use crate::headers;
use super::{Error, ResponseEvent};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// Chunked transfer encoding, the default
    Chunked,
    /// Raw bytes delimited by connection close, for HTTP/1.0 peers
    Identity,
    /// 1xx, 204 and 304 responses
    Bodyless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Headers { framing: Framing, connection: bool },
    Body { framing: Framing },
}

/// Serializes response events to the HTTP/1.1 wire format
///
/// `Content-Length` and `Transfer-Encoding` headers supplied by the
/// caller are dropped, framing is always chosen by the encoder.
#[derive(Debug)]
pub struct HttpEncoder {
    state: State,
}

fn invalid_value(value: &[u8]) -> bool {
    value.iter().any(|&x| x == b'\r' || x == b'\n')
}

fn invalid_name(name: &str) -> bool {
    name.is_empty() ||
        name.bytes().any(|x| !x.is_ascii_graphic() || x == b':')
}

impl HttpEncoder {
    pub fn new() -> HttpEncoder {
        HttpEncoder { state: State::Idle }
    }

    /// True if no response is in progress
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Appends serialized event to `out`
    ///
    /// On error nothing is appended and the encoder state is unchanged.
    pub fn encode(&mut self, event: ResponseEvent, out: &mut Vec<u8>)
        -> Result<(), Error>
    {
        use self::State::*;
        use super::ResponseEvent as E;
        match (self.state, event) {
            (Idle, E::Continue { version }) => {
                out.extend_from_slice(
                    format!("{} 100 Continue\r\n\r\n", version).as_bytes());
            }
            (Idle, E::StatusLine { version, status }) => {
                status_line(version, &status, out);
                let framing = if !status.has_body() {
                    Framing::Bodyless
                } else if version == Version::Http10 {
                    Framing::Identity
                } else {
                    Framing::Chunked
                };
                self.state = Headers { framing: framing, connection: false };
            }
            (Headers { framing, connection }, E::Header { name, value }) => {
                if invalid_name(&name) || invalid_value(&value) {
                    return Err(Error::InvalidHeader);
                }
                if headers::is_content_length(&name) ||
                   headers::is_transfer_encoding(&name)
                {
                    trace!("Dropping {}: {:?} header, body length is \
                        chosen by the encoder", name, stringify(&value));
                    return Ok(());
                }
                out.extend_from_slice(name.as_bytes());
                out.extend_from_slice(b": ");
                out.extend_from_slice(&value);
                out.extend_from_slice(b"\r\n");
                self.state = Headers {
                    framing: framing,
                    connection: connection || headers::is_connection(&name),
                };
            }
            (Headers { framing, connection }, E::Body { data, last }) => {
                if framing == Framing::Bodyless && !data.is_empty() {
                    return Err(Error::BodyNotAllowed);
                }
                match framing {
                    Framing::Chunked => {
                        out.extend_from_slice(
                            b"Transfer-Encoding: chunked\r\n");
                    }
                    Framing::Identity if !connection => {
                        out.extend_from_slice(b"Connection: close\r\n");
                    }
                    Framing::Identity | Framing::Bodyless => {}
                }
                out.extend_from_slice(b"\r\n");
                self.state = Body { framing: framing };
                self.body(framing, &data, last, out);
            }
            (Body { framing }, E::Body { data, last }) => {
                if framing == Framing::Bodyless && !data.is_empty() {
                    return Err(Error::BodyNotAllowed);
                }
                self.body(framing, &data, last, out);
            }
            (state, event) => {
                debug!("Response event {:?} in state {:?}", event, state);
                return Err(Error::ResponseOutOfOrder);
            }
        }
        Ok(())
    }

    fn body(&mut self, framing: Framing, data: &[u8], last: bool,
        out: &mut Vec<u8>)
    {
        match framing {
            Framing::Chunked => {
                if !data.is_empty() {
                    out.extend_from_slice(
                        format!("{:x}\r\n", data.len()).as_bytes());
                    out.extend_from_slice(data);
                    out.extend_from_slice(b"\r\n");
                }
                if last {
                    out.extend_from_slice(b"0\r\n\r\n");
                }
            }
            Framing::Identity => out.extend_from_slice(data),
            Framing::Bodyless => {}
        }
        if last {
            self.state = State::Idle;
        }
    }
}

fn status_line(version: Version, status: &Status, out: &mut Vec<u8>) {
    out.extend_from_slice(format!("{} {:03} {}\r\n",
        version, status.code(), status.reason()).as_bytes());
}

#[cfg(test)]
mod test {
    use crate::enums::{Status, Version};
    use crate::server::{Error, ResponseEvent};
    use super::HttpEncoder;

    fn encode(events: Vec<ResponseEvent>) -> String {
        let mut enc = HttpEncoder::new();
        let mut out = Vec::new();
        for e in events {
            enc.encode(e, &mut out).unwrap();
        }
        assert!(enc.is_idle());
        String::from_utf8(out).unwrap()
    }

    fn status(status: Status) -> ResponseEvent {
        ResponseEvent::StatusLine { version: Version::Http11, status: status }
    }

    #[test]
    fn chunked() {
        assert_eq!(encode(vec![
            status(Status::Ok),
            ResponseEvent::header("Content-Type", "text/plain"),
            ResponseEvent::header("Content-Length", "100"),
            ResponseEvent::body("hello", false),
            ResponseEvent::body(vec![b'x'; 16], false),
            ResponseEvent::body("", true),
        ]), "HTTP/1.1 200 OK\r\n\
            Content-Type: text/plain\r\n\
            Transfer-Encoding: chunked\r\n\r\n\
            5\r\nhello\r\n\
            10\r\nxxxxxxxxxxxxxxxx\r\n\
            0\r\n\r\n");
    }

    #[test]
    fn bodyless() {
        assert_eq!(encode(vec![
            status(Status::NoContent),
            ResponseEvent::header("Transfer-Encoding", "chunked"),
            ResponseEvent::body("", true),
        ]), "HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn http10() {
        assert_eq!(encode(vec![
            ResponseEvent::StatusLine {
                version: Version::Http10,
                status: Status::Ok,
            },
            ResponseEvent::body("data", true),
        ]), "HTTP/1.0 200 OK\r\nConnection: close\r\n\r\ndata");
    }

    #[test]
    fn continue_and_pipelined() {
        assert_eq!(encode(vec![
            ResponseEvent::Continue { version: Version::Http11 },
            status(Status::NotFound),
            ResponseEvent::body("", true),
            status(Status::Ok),
            ResponseEvent::body("a", true),
        ]), "HTTP/1.1 100 Continue\r\n\r\n\
            HTTP/1.1 404 Not Found\r\n\
            Transfer-Encoding: chunked\r\n\r\n0\r\n\r\n\
            HTTP/1.1 200 OK\r\n\
            Transfer-Encoding: chunked\r\n\r\n1\r\na\r\n0\r\n\r\n");
    }

    #[test]
    fn errors() {
        let mut enc = HttpEncoder::new();
        let mut out = Vec::new();
        match enc.encode(ResponseEvent::body("x", true), &mut out) {
            Err(Error::ResponseOutOfOrder) => {}
            r => panic!("unexpected {:?}", r),
        }
        enc.encode(status(Status::NotModified), &mut out).unwrap();
        match enc.encode(ResponseEvent::header("X", "a\r\nb"), &mut out) {
            Err(Error::InvalidHeader) => {}
            r => panic!("unexpected {:?}", r),
        }
        match enc.encode(ResponseEvent::body("x", true), &mut out) {
            Err(Error::BodyNotAllowed) => {}
            r => panic!("unexpected {:?}", r),
        }
    }
}
