use httparse;

use crate::enums::Status;


quick_error! {
    /// HTTP protocol error
    #[derive(Debug)]
    pub enum Error {
        /// Request line is longer than `max_line_length`
        RequestLineTooLong {
            display("request line is too long")
        }
        /// Header line (or chunk size line) is longer than `max_line_length`
        HeaderLineTooLong {
            display("header line is too long")
        }
        /// Request line is not `METHOD SP TARGET SP VERSION`
        BadRequestLine {
            display("malformed request line")
        }
        /// HTTP version other than 1.0 or 1.1
        BadVersion {
            display("unsupported HTTP version")
        }
        /// Header line has no colon or an invalid name
        BadHeader {
            display("malformed header line")
        }
        /// Content length header is invalid (non-integer, or > 64bit)
        InvalidContentLength {
            display("invalid content-length header")
        }
        /// Duplicate content-length header, this is prohibited due to security
        DuplicateContentLength {
            display("duplicate content-length header")
        }
        /// Both content-length and chunked encoding are specified
        AmbiguousBodyLength {
            display("both content-length and transfer-encoding are present")
        }
        /// Transfer encoding is not chunked (e.g. gzip only)
        UnsupportedTransferEncoding {
            display("unsupported transfer encoding")
        }
        /// Request body is larger than `max_body_length`
        BodyTooLong {
            display("request body is too big")
        }
        /// Error parsing http chunk
        ChunkParseError(err: httparse::InvalidChunkSize) {
            display("chunk size parse error")
            from()
        }
        /// Chunk data is not followed by CRLF
        BadChunk {
            display("chunk data is not terminated properly")
        }
        /// Connection reset
        ConnectionReset {
            display("connection reset")
        }
        /// Response events arrived in a wrong order
        ResponseOutOfOrder {
            display("response events are out of order")
        }
        /// Header name or value in a response contains invalid characters
        InvalidHeader {
            display("invalid characters in a response header")
        }
        /// Body is written for a status that has no body (1xx, 204, 304)
        BodyNotAllowed {
            display("response status doesn't allow a body")
        }
    }
}

impl Error {
    /// Status that should be sent to the client for this error
    ///
    /// Returns `None` for errors that are not the client's fault, or for
    /// which no response makes sense.
    pub fn status(&self) -> Option<Status> {
        use self::Error::*;
        match *self {
            RequestLineTooLong => Some(Status::RequestURITooLong),
            HeaderLineTooLong => Some(Status::RequestHeaderFieldsTooLarge),
            BodyTooLong => Some(Status::RequestEntityTooLarge),
            UnsupportedTransferEncoding => Some(Status::NotImplemented),
            BadVersion => Some(Status::VersionNotSupported),
            BadRequestLine | BadHeader | InvalidContentLength |
            DuplicateContentLength | AmbiguousBodyLength |
            ChunkParseError(..) | BadChunk => Some(Status::BadRequest),
            ConnectionReset | ResponseOutOfOrder | InvalidHeader |
            BodyNotAllowed => None,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::enums::Status;
    use super::Error;

    #[test]
    fn statuses() {
        assert_eq!(Error::RequestLineTooLong.status(),
                   Some(Status::RequestURITooLong));
        assert_eq!(Error::HeaderLineTooLong.status().map(|s| s.code()),
                   Some(431));
        assert_eq!(Error::BodyTooLong.status().map(|s| s.code()), Some(413));
        assert_eq!(Error::AmbiguousBodyLength.status().map(|s| s.code()),
                   Some(400));
        assert_eq!(Error::ConnectionReset.status(), None);
    }
}
