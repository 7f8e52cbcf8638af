//! Websocket support stuff
//!
//! The frame decoder and writer work on plain byte slices. The upgrade
//! itself is negotiated by `negotiate`, and the server codec swaps the
//! connection to websocket framing after the `101` response is encoded.

mod alloc;
mod assembler;
mod decoder;
mod error;
mod handshake;
mod keys;
mod writer;

pub use self::alloc::Packet;
pub use self::assembler::Assembler;
pub use self::decoder::{FrameDecoder, FrameEvent, FrameHeader, FrameState};
pub use self::decoder::{Opcode, apply_mask};
pub use self::error::{Error, HandshakeError};
pub use self::handshake::{Handshake, negotiate, is_websocket_upgrade};
pub use self::keys::{Accept, Key, GUID};
pub use self::writer::{Frame, write_frame, write_packet, write_close};
pub use self::writer::NO_STATUS;
