//! Single-reactor HTTP/1.1 and websocket server core
//!
//! Bytes read from sockets flow through a chain of backpressure-aware
//! stages (`channel`): the protocol decoder, an application handler and
//! the protocol encoder. Everything for a connection runs on the reactor
//! thread that owns the selector.
#![recursion_limit="100"]

extern crate mio;
extern crate crossbeam_channel;
extern crate httparse;
extern crate netbuf;
extern crate sha1;
extern crate base64;
extern crate byteorder;
extern crate rand;
extern crate uuid;
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate log;
#[cfg(feature="date_header")] extern crate httpdate;


pub mod buffer;
pub mod channel;
pub mod server;
pub mod websocket;
pub mod reactor;
pub mod serve;
mod context;
mod enums;
mod error;
mod headers;

pub use context::{ConnectionContext, ConnectionId, Attributes};
pub use context::{OutputSink, QueueSink, WriteEntry, Protocol, ProtocolSwitch};
pub use enums::{Version, Status};
pub use error::Error;
pub use serve::{Server, Config};
pub use reactor::{Initializer, Remote};
