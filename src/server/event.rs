use crate::enums::{Status, Version};


/// A piece of an incoming HTTP request
///
/// A request is exactly one `RequestLine`, zero or more `Header`s and one
/// or more `Body` events, the last of which has `last` set. When a request
/// has a body, an empty non-last `Body` is emitted as soon as headers are
/// complete, so the end of headers is visible before body bytes arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    RequestLine {
        method: String,
        uri: String,
        version: Version,
    },
    Header {
        name: String,
        value: Vec<u8>,
    },
    Body {
        data: Vec<u8>,
        last: bool,
    },
}

/// A piece of an outgoing HTTP response
///
/// Mirrors `RequestEvent`: a `StatusLine`, headers and a body stream
/// finished by a `Body` with `last` set. `Continue` is an interim
/// `100 Continue` response and may only come before the `StatusLine`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    Continue {
        version: Version,
    },
    StatusLine {
        version: Version,
        status: Status,
    },
    Header {
        name: String,
        value: Vec<u8>,
    },
    Body {
        data: Vec<u8>,
        last: bool,
    },
}

impl RequestEvent {
    /// True for the event that finishes the request
    pub fn is_last(&self) -> bool {
        matches!(*self, RequestEvent::Body { last: true, .. })
    }
}

impl ResponseEvent {
    /// Convenience constructor for a header event
    pub fn header<V: AsRef<[u8]>>(name: &str, value: V) -> ResponseEvent {
        ResponseEvent::Header {
            name: name.to_string(),
            value: value.as_ref().to_vec(),
        }
    }
    /// The `Date` header with the current time
    #[cfg(feature="date_header")]
    pub fn date() -> ResponseEvent {
        let now = ::std::time::SystemTime::now();
        ResponseEvent::header("Date", httpdate::fmt_http_date(now))
    }
    /// A body chunk
    pub fn body<V: Into<Vec<u8>>>(data: V, last: bool) -> ResponseEvent {
        ResponseEvent::Body { data: data.into(), last: last }
    }
}
