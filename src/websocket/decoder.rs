use std::cmp::min;

use byteorder::{BigEndian, ByteOrder};

use crate::Config;
use super::Error;


/// Frame opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

/// Parsed frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub fin: bool,
    pub opcode: Opcode,
    pub masked: bool,
    pub payload_length: u64,
    /// Present if and only if `masked` is set
    pub masking_key: Option<[u8; 4]>,
}

/// A piece of an incoming frame
///
/// Every `Header` is followed by `Payload` events with total length of
/// `payload_length`, the last of them has `last` set (a zero-length frame
/// still gets a single empty `Payload`). Payload is already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Header(FrameHeader),
    Payload {
        data: Vec<u8>,
        last: bool,
    },
}

/// State of the frame decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Opcode,
    PayloadLenInitial,
    /// 16-bit extended length
    PayloadLenShort,
    /// 64-bit extended length
    PayloadLenLong,
    MaskKey,
    PayloadData,
    Corrupt,
}

/// Incremental RFC 6455 frame decoder
pub struct FrameDecoder {
    state: FrameState,
    max_frame_length: u64,
    require_mask: bool,
    /// Bytes of the multi-byte field being read
    scratch: [u8; 8],
    filled: usize,
    fin: bool,
    opcode: Opcode,
    masked: bool,
    payload_length: u64,
    key: [u8; 4],
    /// Payload bytes already delivered for the current frame
    offset: u64,
}

impl Opcode {
    /// Opcode by its wire value, `None` for reserved values
    pub fn from_u8(code: u8) -> Option<Opcode> {
        use self::Opcode::*;
        match code {
            0x0 => Some(Continuation),
            0x1 => Some(Text),
            0x2 => Some(Binary),
            0x8 => Some(Close),
            0x9 => Some(Ping),
            0xA => Some(Pong),
            _ => None,
        }
    }
    /// Wire value of the opcode
    pub fn as_u8(&self) -> u8 {
        use self::Opcode::*;
        match *self {
            Continuation => 0x0,
            Text => 0x1,
            Binary => 0x2,
            Close => 0x8,
            Ping => 0x9,
            Pong => 0xA,
        }
    }
    /// Close, ping and pong
    pub fn is_control(&self) -> bool {
        self.as_u8() & 0x8 != 0
    }
}

impl FrameDecoder {
    /// Decoder with limits from the config
    pub fn new(config: &Config) -> FrameDecoder {
        FrameDecoder::with_limits(config.max_frame_length,
                                  config.require_masked_frames)
    }
    /// Decoder with explicit limits
    ///
    /// Clients should not require masking: server frames are unmasked.
    pub fn with_limits(max_frame_length: u64, require_mask: bool)
        -> FrameDecoder
    {
        FrameDecoder {
            state: FrameState::Opcode,
            max_frame_length: max_frame_length,
            require_mask: require_mask,
            scratch: [0; 8],
            filled: 0,
            fin: false,
            opcode: Opcode::Continuation,
            masked: false,
            payload_length: 0,
            key: [0; 4],
            offset: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// True if the decoder is between frames
    pub fn is_idle(&self) -> bool {
        self.state == FrameState::Opcode
    }

    /// Decodes a chunk of bytes
    ///
    /// The frame header event is emitted as soon as the header is complete,
    /// before the payload arrives. The error is returned only once, the
    /// decoder drops all input afterwards.
    pub fn decode(&mut self, data: &[u8], events: &mut Vec<FrameEvent>)
        -> Result<(), Error>
    {
        use self::FrameState::*;
        let mut pos = 0;
        while pos < data.len() {
            match self.state {
                Corrupt => return Ok(()),
                Opcode => {
                    let byte = data[pos];
                    pos += 1;
                    if let Err(e) = self.first_byte(byte) {
                        return self.fail(e);
                    }
                    self.state = PayloadLenInitial;
                }
                PayloadLenInitial => {
                    let byte = data[pos];
                    pos += 1;
                    self.masked = byte & 0x80 != 0;
                    if self.require_mask && !self.masked {
                        return self.fail(Error::Unmasked);
                    }
                    let len = byte & 0x7F;
                    if self.opcode.is_control() && len > 125 {
                        return self.fail(Error::BadControlFrame);
                    }
                    match len {
                        126 => self.state = PayloadLenShort,
                        127 => self.state = PayloadLenLong,
                        len => {
                            if let Err(e) = self.set_length(len as u64) {
                                return self.fail(e);
                            }
                            self.after_length(events);
                        }
                    }
                }
                PayloadLenShort | PayloadLenLong | MaskKey => {
                    let need = match self.state {
                        PayloadLenShort => 2,
                        PayloadLenLong => 8,
                        _ => 4,
                    };
                    let n = min(need - self.filled, data.len() - pos);
                    self.scratch[self.filled..self.filled+n]
                        .copy_from_slice(&data[pos..pos+n]);
                    self.filled += n;
                    pos += n;
                    if self.filled < need {
                        continue;
                    }
                    self.filled = 0;
                    match self.state {
                        PayloadLenShort => {
                            let len = BigEndian::read_u16(&self.scratch[..2]);
                            if let Err(e) = self.set_length(len as u64) {
                                return self.fail(e);
                            }
                            self.after_length(events);
                        }
                        PayloadLenLong => {
                            let len = BigEndian::read_u64(&self.scratch[..8]);
                            if let Err(e) = self.set_length(len) {
                                return self.fail(e);
                            }
                            self.after_length(events);
                        }
                        _ => {
                            self.key.copy_from_slice(&self.scratch[..4]);
                            self.start_payload(events);
                        }
                    }
                }
                PayloadData => {
                    let left = self.payload_length - self.offset;
                    let n = min(left, (data.len() - pos) as u64) as usize;
                    let mut chunk = data[pos..pos+n].to_vec();
                    if self.masked {
                        apply_mask(&mut chunk, self.key, self.offset);
                    }
                    pos += n;
                    self.offset += n as u64;
                    let last = self.offset == self.payload_length;
                    events.push(FrameEvent::Payload { data: chunk, last: last });
                    if last {
                        self.state = Opcode;
                    }
                }
            }
        }
        Ok(())
    }

    fn fail(&mut self, e: Error) -> Result<(), Error> {
        debug!("Websocket decoding failed: {}", e);
        self.state = FrameState::Corrupt;
        Err(e)
    }

    fn first_byte(&mut self, byte: u8) -> Result<(), Error> {
        if byte & 0x70 != 0 {
            return Err(Error::ReservedBits);
        }
        self.fin = byte & 0x80 != 0;
        self.opcode = Opcode::from_u8(byte & 0x0F)
            .ok_or(Error::InvalidOpcode(byte & 0x0F))?;
        if self.opcode.is_control() && !self.fin {
            return Err(Error::BadControlFrame);
        }
        Ok(())
    }

    fn set_length(&mut self, len: u64) -> Result<(), Error> {
        if self.opcode.is_control() && len > 125 {
            return Err(Error::BadControlFrame);
        }
        if len > self.max_frame_length {
            return Err(Error::TooLong);
        }
        self.payload_length = len;
        Ok(())
    }

    fn after_length(&mut self, events: &mut Vec<FrameEvent>) {
        if self.masked {
            self.state = FrameState::MaskKey;
        } else {
            self.start_payload(events);
        }
    }

    fn start_payload(&mut self, events: &mut Vec<FrameEvent>) {
        self.offset = 0;
        events.push(FrameEvent::Header(FrameHeader {
            fin: self.fin,
            opcode: self.opcode,
            masked: self.masked,
            payload_length: self.payload_length,
            masking_key: if self.masked { Some(self.key) } else { None },
        }));
        if self.payload_length == 0 {
            events.push(FrameEvent::Payload { data: Vec::new(), last: true });
            self.state = FrameState::Opcode;
        } else {
            self.state = FrameState::PayloadData;
        }
    }
}

/// Xors `data` with the key, `offset` is the position of `data[0]` within
/// the frame payload
pub fn apply_mask(data: &mut [u8], key: [u8; 4], offset: u64) {
    let shift = (offset % 4) as usize;
    for (idx, byte) in data.iter_mut().enumerate() {
        *byte ^= key[(idx + shift) % 4];
    }
}
