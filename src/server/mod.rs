//! HTTP server protocol implementation
//!
//! Low level parts are incremental `HttpDecoder` and `HttpEncoder`, which
//! turn bytes into `RequestEvent`s and `ResponseEvent`s into bytes. The
//! pipeline stages `ServerDecoder` and `ServerEncoder` wrap them and handle
//! the websocket upgrade. `BufferedHandler` collects whole requests and
//! passes them to a `Service`.
mod buffered;
mod codec;
mod decoder;
mod encoder;
mod error;
mod event;
mod simple_error_page;

pub use self::buffered::{Request, Response, Service, BufferedHandler};
pub use self::buffered::{bind_service, REQUEST_ATTRIBUTE};
pub use self::codec::{ServerDecoder, ServerEncoder};
pub use self::codec::{InboundEvent, OutboundEvent};
pub use self::decoder::{HttpDecoder, DecoderState};
pub use self::encoder::HttpEncoder;
pub use self::error::Error;
pub use self::event::{RequestEvent, ResponseEvent};
pub use self::simple_error_page::SimpleErrorPage;
