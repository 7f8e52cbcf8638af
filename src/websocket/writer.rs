use byteorder::{BigEndian, ByteOrder};

use super::decoder::{Opcode, apply_mask};


/// A borrowed frame of websocket data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Ping mesage
    Ping(&'a [u8]),
    /// Pong mesage
    Pong(&'a [u8]),
    /// Text (utf-8) message
    Text(&'a str),
    /// Binary message
    Binary(&'a [u8]),
    /// Close message
    Close(u16, &'a str),
}

/// Close code that means "no status code", it's never sent on the wire
pub const NO_STATUS: u16 = 1005;

/// Writes a single frame
///
/// Servers write unmasked frames, clients must pass a masking key.
pub fn write_frame(out: &mut Vec<u8>, fin: bool, opcode: Opcode,
    data: &[u8], mask: Option<[u8; 4]>)
{
    let first_byte = opcode.as_u8() | if fin { 0x80 } else { 0 };
    let mask_bit = if mask.is_some() { 0x80 } else { 0 };
    match data.len() {
        len @ 0..=125 => {
            out.extend_from_slice(&[first_byte, mask_bit | len as u8]);
        }
        len @ 126..=65535 => {
            let mut buf = [first_byte, mask_bit | 126, 0, 0];
            BigEndian::write_u16(&mut buf[2..], len as u16);
            out.extend_from_slice(&buf);
        }
        len => {
            let mut buf = [0u8; 10];
            buf[0] = first_byte;
            buf[1] = mask_bit | 127;
            BigEndian::write_u64(&mut buf[2..], len as u64);
            out.extend_from_slice(&buf);
        }
    }
    match mask {
        Some(key) => {
            out.extend_from_slice(&key);
            let start = out.len();
            out.extend_from_slice(data);
            apply_mask(&mut out[start..], key, 0);
        }
        None => out.extend_from_slice(data),
    }
}

/// Writes a whole message as a single frame
pub fn write_packet<'a, F>(out: &mut Vec<u8>, frame: F, mask: Option<[u8; 4]>)
    where F: Into<Frame<'a>>
{
    use self::Frame::*;
    match frame.into() {
        Ping(data) => write_frame(out, true, Opcode::Ping, data, mask),
        Pong(data) => write_frame(out, true, Opcode::Pong, data, mask),
        Text(data) => {
            write_frame(out, true, Opcode::Text, data.as_bytes(), mask)
        }
        Binary(data) => write_frame(out, true, Opcode::Binary, data, mask),
        Close(code, reason) => write_close(out, code, reason, mask),
    }
}

/// Write close message to websocket
///
/// Reason is truncated to fit into a control frame.
pub fn write_close(out: &mut Vec<u8>, code: u16, reason: &str,
    mask: Option<[u8; 4]>)
{
    if code == NO_STATUS {
        write_frame(out, true, Opcode::Close, b"", mask);
        return;
    }
    let mut end = reason.len().min(123);
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    let mut data = Vec::with_capacity(2 + end);
    data.extend_from_slice(&[(code >> 8) as u8, (code & 0xFF) as u8]);
    data.extend_from_slice(reason[..end].as_bytes());
    write_frame(out, true, Opcode::Close, &data, mask);
}

#[cfg(test)]
mod test {
    use super::{write_packet, write_close, Frame};
    use crate::websocket::Opcode;

    #[test]
    fn unmasked_text() {
        let mut out = Vec::new();
        write_packet(&mut out, Frame::Text("Hello"), None);
        assert_eq!(out, b"\x81\x05Hello");
    }

    #[test]
    fn masked_text() {
        let mut out = Vec::new();
        write_packet(&mut out, Frame::Text("Hello"),
                     Some([0x37, 0xfa, 0x21, 0x3d]));
        assert_eq!(out, [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d,
                         0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    }

    #[test]
    fn lengths() {
        let mut out = Vec::new();
        write_packet(&mut out, Frame::Binary(&[0; 126]), None);
        assert_eq!(&out[..4], &[0x82, 126, 0, 126]);
        let mut out = Vec::new();
        write_packet(&mut out, Frame::Binary(&vec![0; 65536]), None);
        assert_eq!(&out[..10], &[0x82, 127, 0, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(out.len(), 65546);
    }

    #[test]
    fn close() {
        let mut out = Vec::new();
        write_close(&mut out, 1000, "bye", None);
        assert_eq!(out, b"\x88\x05\x03\xe8bye");
        let mut out = Vec::new();
        write_close(&mut out, 1005, "ignored", None);
        assert_eq!(out, [0x88, 0]);
        let long = "x".repeat(200);
        let mut out = Vec::new();
        write_close(&mut out, 1000, &long, None);
        assert_eq!(out[1], 125);
        assert_eq!(Opcode::Close.as_u8(), out[0] & 0x0F);
    }
}
