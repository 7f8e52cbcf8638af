use super::writer::Frame;

/// A websocket message
///
/// Note: unlike `Frame` this has data allocated on the heap so has static
/// lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Ping packet (with data)
    Ping(Vec<u8>),
    /// Pong packet (with data)
    Pong(Vec<u8>),
    /// Text (utf-8) messsage
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
    /// Close message
    Close(u16, String),
}

impl<'a> From<&'a Packet> for Frame<'a> {
    fn from(pkt: &'a Packet) -> Frame<'a> {
        use super::writer::Frame as F;
        use self::Packet as P;
        match *pkt {
            P::Ping(ref x) => F::Ping(x),
            P::Pong(ref x) => F::Pong(x),
            P::Text(ref x) => F::Text(x),
            P::Binary(ref x) => F::Binary(x),
            P::Close(c, ref t) => F::Close(c, t),
        }
    }
}

impl<'a> From<Frame<'a>> for Packet {
    fn from(frame: Frame<'a>) -> Packet {
        use super::writer::Frame as F;
        use self::Packet as P;
        match frame {
            F::Ping(x) => P::Ping(x.to_owned()),
            F::Pong(x) => P::Pong(x.to_owned()),
            F::Text(x) => P::Text(x.to_owned()),
            F::Binary(x) => P::Binary(x.to_owned()),
            F::Close(c, t) => P::Close(c, t.to_owned()),
        }
    }
}
