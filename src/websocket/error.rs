use std::string::FromUtf8Error;


quick_error! {
    /// Websocket protocol error
    #[derive(Debug)]
    pub enum Error {
        /// Got websocket frame with unknown opcode
        InvalidOpcode(code: u8) {
            display("opcode of the frame is invalid: {}", code)
        }
        /// Reserved bits are set but no extension is negotiated
        ReservedBits {
            display("reserved bits are set")
        }
        /// Got unmasked frame from a client
        Unmasked {
            display("received unmasked frame")
        }
        /// Control frame is fragmented or longer than 125 bytes
        BadControlFrame {
            display("received invalid control frame")
        }
        /// Received frame that is longer than configured limit
        TooLong {
            display("received frame that is too long")
        }
        /// Continuation frame without a message started
        UnexpectedContinuation {
            display("continuation frame without a message")
        }
        /// New data frame while fragmented message is in progress
        ExpectedContinuation {
            display("new message started before previous one finished")
        }
        /// Close frame with one byte payload
        BadClosePayload {
            display("invalid close frame payload")
        }
        /// Text frame can't be decoded
        InvalidUtf8(err: FromUtf8Error) {
            display("error decoding text frame: {}", err)
            from()
            source(err)
        }
    }
}

quick_error! {
    /// Upgrade request can't be accepted
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HandshakeError {
        /// Websocket upgrade requires GET method
        WrongMethod {
            display("websocket upgrade must use GET method")
        }
        /// `Connection` header doesn't contain `upgrade`
        NotUpgrade {
            display("connection header doesn't request upgrade")
        }
        /// `Upgrade` header is not `websocket`
        WrongUpgrade {
            display("upgrade header is not websocket")
        }
        /// `Sec-WebSocket-Version` is not 13
        UnsupportedVersion {
            display("unsupported websocket version")
        }
        /// No `Sec-WebSocket-Key` header
        MissingKey {
            display("no Sec-WebSocket-Key header")
        }
        /// Key is not a base64-encoded 16 byte value
        InvalidKey {
            display("invalid Sec-WebSocket-Key header")
        }
        /// None of the requested subprotocols is supported
        NoCommonProtocol {
            display("no supported subprotocol requested")
        }
    }
}

impl Error {
    /// Close code to send to the peer before closing the connection
    pub fn close_code(&self) -> u16 {
        use self::Error::*;
        match *self {
            TooLong => 1009,
            InvalidUtf8(..) => 1007,
            InvalidOpcode(..) | ReservedBits | Unmasked | BadControlFrame |
            UnexpectedContinuation | ExpectedContinuation | BadClosePayload
            => 1002,
        }
    }
}
