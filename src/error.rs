use std::io;

use crate::channel::ChannelError;
use crate::server;
use crate::websocket;
use crate::Status;


quick_error! {
    /// Error delivered through the error signal of a connection pipeline
    #[derive(Debug)]
    pub enum Error {
        /// Socket IO error
        Io(err: io::Error) {
            display("I/O error: {}", err)
            from()
            source(err)
        }
        /// Error decoding or encoding HTTP
        Http(err: server::Error) {
            display("http error: {}", err)
            from()
            source(err)
        }
        /// Error decoding websocket frames
        WebSocket(err: websocket::Error) {
            display("websocket error: {}", err)
            from()
            source(err)
        }
        /// Misuse of the backpressure channel
        Channel(err: ChannelError) {
            display("channel error: {}", err)
            from()
            source(err)
        }
        /// Connection is already closed
        Closed {
            display("connection closed")
        }
    }
}

impl Error {
    /// Returns a status code suitable for an error response if the error
    /// is caused by a malformed or oversized HTTP request
    pub fn http_status(&self) -> Option<Status> {
        match *self {
            Error::Http(ref e) => e.status(),
            _ => None,
        }
    }
}

#[test]
fn send_sync() {
    fn send_sync<T: Send+Sync>(_: T) {}
    send_sync(Error::Closed);
}
