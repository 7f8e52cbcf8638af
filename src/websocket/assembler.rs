use std::str::from_utf8;

use super::{Error, FrameEvent, FrameHeader, Opcode, Packet};
use super::writer::NO_STATUS;


/// Collects frame events into complete messages
///
/// Fragmented messages are reassembled, control frames interleaved with
/// fragments are returned as they arrive.
pub struct Assembler {
    max_message_length: u64,
    frame: Option<FrameHeader>,
    control: Vec<u8>,
    message: Option<(Opcode, Vec<u8>)>,
}

impl Assembler {
    pub fn new(max_message_length: u64) -> Assembler {
        Assembler {
            max_message_length: max_message_length,
            frame: None,
            control: Vec::new(),
            message: None,
        }
    }

    /// Feeds a single event, completed messages are pushed to `out`
    pub fn push(&mut self, event: FrameEvent, out: &mut Vec<Packet>)
        -> Result<(), Error>
    {
        match event {
            FrameEvent::Header(header) => self.header(header),
            FrameEvent::Payload { data, last } => {
                let header = match self.frame {
                    Some(header) => header,
                    None => return Err(Error::UnexpectedContinuation),
                };
                if header.opcode.is_control() {
                    self.control.extend_from_slice(&data);
                    if last {
                        self.frame = None;
                        let data = self.control.split_off(0);
                        out.push(control_packet(header.opcode, data)?);
                    }
                    return Ok(());
                }
                let message_done = {
                    let &mut (_, ref mut buf) = match self.message {
                        Some(ref mut message) => message,
                        None => return Err(Error::UnexpectedContinuation),
                    };
                    if buf.len() as u64 + data.len() as u64
                        > self.max_message_length
                    {
                        return Err(Error::TooLong);
                    }
                    buf.extend_from_slice(&data);
                    last && header.fin
                };
                if last {
                    self.frame = None;
                }
                if message_done {
                    if let Some((opcode, data)) = self.message.take() {
                        out.push(data_packet(opcode, data)?);
                    }
                }
                Ok(())
            }
        }
    }

    fn header(&mut self, header: FrameHeader) -> Result<(), Error> {
        match header.opcode {
            Opcode::Continuation if self.message.is_none() => {
                return Err(Error::UnexpectedContinuation);
            }
            Opcode::Text | Opcode::Binary if self.message.is_some() => {
                return Err(Error::ExpectedContinuation);
            }
            Opcode::Text | Opcode::Binary => {
                self.message = Some((header.opcode, Vec::new()));
            }
            _ => {}
        }
        self.frame = Some(header);
        Ok(())
    }
}

fn control_packet(opcode: Opcode, data: Vec<u8>) -> Result<Packet, Error> {
    match opcode {
        Opcode::Ping => Ok(Packet::Ping(data)),
        Opcode::Pong => Ok(Packet::Pong(data)),
        _ => {
            match data.len() {
                0 => Ok(Packet::Close(NO_STATUS, String::new())),
                1 => Err(Error::BadClosePayload),
                _ => {
                    let code = ((data[0] as u16) << 8) | data[1] as u16;
                    let reason = from_utf8(&data[2..])
                        .map_err(|_| Error::BadClosePayload)?;
                    Ok(Packet::Close(code, reason.to_string()))
                }
            }
        }
    }
}

fn data_packet(opcode: Opcode, data: Vec<u8>) -> Result<Packet, Error> {
    match opcode {
        Opcode::Text => Ok(Packet::Text(String::from_utf8(data)?)),
        _ => Ok(Packet::Binary(data)),
    }
}
