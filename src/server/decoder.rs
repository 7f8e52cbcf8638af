use std::cmp::min;
use std::str::from_utf8;

use httparse;

use crate::buffer::{LineBuffer, stringify, trim};
use crate::enums::Version;
use crate::headers;
use crate::Config;
use super::{Error, RequestEvent};


/// State of the request decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    RequestLine,
    Headers,
    FixedBody,
    ChunkSize,
    ChunkData,
    /// CRLF after chunk data
    ChunkDataEnd,
    ChunkTrailer,
    Done,
    Corrupt,
}

#[derive(Debug, Default)]
struct BodyKind {
    content_length: Option<u64>,
    transfer_encoding: bool,
    chunked: bool,
}

/// Incremental HTTP/1.x request decoder
///
/// Bytes may be split at arbitrary positions. Every call appends complete
/// events to the output vector. After an error the decoder is corrupt and
/// silently drops everything fed to it.
pub struct HttpDecoder {
    state: DecoderState,
    line: LineBuffer,
    max_body_length: u64,
    body: BodyKind,
    /// Bytes left in the current fixed body or chunk
    remaining: u64,
    /// Body bytes seen in the current request
    body_seen: u64,
}

impl HttpDecoder {
    /// Decoder with limits from the config
    pub fn new(config: &Config) -> HttpDecoder {
        HttpDecoder::with_limits(config.max_line_length,
                                 config.max_body_length)
    }
    /// Decoder with explicit line and body limits
    pub fn with_limits(max_line_length: usize, max_body_length: u64)
        -> HttpDecoder
    {
        HttpDecoder {
            state: DecoderState::RequestLine,
            line: LineBuffer::new(max_line_length),
            max_body_length: max_body_length,
            body: BodyKind::default(),
            remaining: 0,
            body_seen: 0,
        }
    }
    /// Current state
    pub fn state(&self) -> DecoderState {
        self.state
    }
    /// True if no part of a request is received yet
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::RequestLine && self.line.len() == 0
    }

    /// Decodes a chunk of bytes
    ///
    /// On error the events parsed before the error are still in `events`.
    /// The error is returned only once, the decoder is quiescent afterwards.
    pub fn decode(&mut self, data: &[u8], events: &mut Vec<RequestEvent>)
        -> Result<(), Error>
    {
        use self::DecoderState::*;
        let mut pos = 0;
        loop {
            match self.state {
                Corrupt => return Ok(()),
                Done => {
                    self.reset();
                    continue;
                }
                FixedBody | ChunkData => {
                    if pos == data.len() {
                        return Ok(());
                    }
                    let n = min(self.remaining, (data.len() - pos) as u64)
                        as usize;
                    events.push(RequestEvent::Body {
                        data: data[pos..pos+n].to_vec(),
                        last: false,
                    });
                    pos += n;
                    self.remaining -= n as u64;
                    if self.remaining == 0 {
                        if self.state == FixedBody {
                            self.finish_body(events);
                        } else {
                            self.state = ChunkDataEnd;
                        }
                    }
                }
                RequestLine | Headers | ChunkSize | ChunkDataEnd
                | ChunkTrailer => {
                    if pos == data.len() {
                        return Ok(());
                    }
                    match self.line.feed(&data[pos..]) {
                        Ok(n) => pos += n,
                        Err(_) if self.state == RequestLine => {
                            return self.fail(Error::RequestLineTooLong);
                        }
                        Err(_) => {
                            return self.fail(Error::HeaderLineTooLong);
                        }
                    }
                    if !self.line.is_complete() {
                        return Ok(());
                    }
                    let line = self.line.line().to_vec();
                    self.line.clear();
                    if let Err(e) = self.process_line(&line, events) {
                        return self.fail(e);
                    }
                }
            }
        }
    }

    fn fail(&mut self, e: Error) -> Result<(), Error> {
        debug!("Request decoding failed: {}", e);
        self.state = DecoderState::Corrupt;
        self.line.clear();
        Err(e)
    }

    fn reset(&mut self) {
        self.state = DecoderState::RequestLine;
        self.body = BodyKind::default();
        self.remaining = 0;
        self.body_seen = 0;
    }

    fn finish_body(&mut self, events: &mut Vec<RequestEvent>) {
        events.push(RequestEvent::Body { data: Vec::new(), last: true });
        self.state = DecoderState::Done;
    }

    fn process_line(&mut self, line: &[u8], events: &mut Vec<RequestEvent>)
        -> Result<(), Error>
    {
        use self::DecoderState::*;
        match self.state {
            RequestLine => {
                // RFC 7230 allows empty lines before the request line
                if line.len() == 0 {
                    return Ok(());
                }
                events.push(parse_request_line(line)?);
                self.state = Headers;
            }
            Headers if line.len() == 0 => {
                self.start_body(events)?;
            }
            Headers => {
                let (name, value) = parse_header(line)?;
                self.add_header(&name, &value)?;
                events.push(RequestEvent::Header { name: name, value: value });
            }
            ChunkSize => {
                let mut sized = Vec::with_capacity(line.len() + 2);
                sized.extend_from_slice(line);
                sized.extend_from_slice(b"\r\n");
                let size = match httparse::parse_chunk_size(&sized)? {
                    httparse::Status::Complete((_, size)) => size,
                    httparse::Status::Partial => return Err(Error::BadChunk),
                };
                if size == 0 {
                    self.state = ChunkTrailer;
                } else {
                    self.body_seen = self.body_seen.saturating_add(size);
                    if self.body_seen > self.max_body_length {
                        return Err(Error::BodyTooLong);
                    }
                    self.remaining = size;
                    self.state = ChunkData;
                }
            }
            ChunkDataEnd => {
                if line.len() != 0 {
                    return Err(Error::BadChunk);
                }
                self.state = ChunkSize;
            }
            ChunkTrailer => {
                if line.len() == 0 {
                    self.finish_body(events);
                } else {
                    trace!("Ignoring trailer {:?}", stringify(line));
                }
            }
            FixedBody | ChunkData | Done | Corrupt => unreachable!(),
        }
        Ok(())
    }

    fn add_header(&mut self, name: &str, value: &[u8]) -> Result<(), Error> {
        if headers::is_content_length(name) {
            let len = from_utf8(trim(value)).ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or(Error::InvalidContentLength)?;
            if self.body.content_length.is_some() {
                return Err(Error::DuplicateContentLength);
            }
            self.body.content_length = Some(len);
        } else if headers::is_transfer_encoding(name) {
            // the last header wins, as does the last coding in the list
            self.body.transfer_encoding = true;
            self.body.chunked = headers::is_chunked(value);
        }
        Ok(())
    }

    fn start_body(&mut self, events: &mut Vec<RequestEvent>)
        -> Result<(), Error>
    {
        if self.body.transfer_encoding && self.body.content_length.is_some() {
            return Err(Error::AmbiguousBodyLength);
        }
        if self.body.transfer_encoding {
            if !self.body.chunked {
                return Err(Error::UnsupportedTransferEncoding);
            }
            self.state = DecoderState::ChunkSize;
            events.push(RequestEvent::Body { data: Vec::new(), last: false });
            return Ok(());
        }
        match self.body.content_length {
            Some(len) if len > self.max_body_length => {
                Err(Error::BodyTooLong)
            }
            Some(len) if len > 0 => {
                self.remaining = len;
                self.body_seen = len;
                self.state = DecoderState::FixedBody;
                events.push(RequestEvent::Body { data: Vec::new(), last: false });
                Ok(())
            }
            _ => {
                self.finish_body(events);
                Ok(())
            }
        }
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestEvent, Error> {
    let mut parts = line.splitn(3, |&x| x == b' ');
    let method = parts.next().ok_or(Error::BadRequestLine)?;
    let uri = parts.next().ok_or(Error::BadRequestLine)?;
    let version = parts.next().ok_or(Error::BadRequestLine)?;
    if method.is_empty() || uri.is_empty() ||
        !method.iter().all(|&b| b.is_ascii_alphabetic() || b == b'-')
    {
        return Err(Error::BadRequestLine);
    }
    if !version.starts_with(b"HTTP/") {
        return Err(Error::BadRequestLine);
    }
    let version = Version::from_bytes(version).ok_or(Error::BadVersion)?;
    let uri = from_utf8(uri).map_err(|_| Error::BadRequestLine)?;
    Ok(RequestEvent::RequestLine {
        // method checked to be ascii above
        method: String::from_utf8_lossy(method).into_owned(),
        uri: uri.to_string(),
        version: version,
    })
}

fn parse_header(line: &[u8]) -> Result<(String, Vec<u8>), Error> {
    // obsolete line folding
    if line[0] == b' ' || line[0] == b'\t' {
        return Err(Error::BadHeader);
    }
    let colon = line.iter().position(|&x| x == b':')
        .ok_or(Error::BadHeader)?;
    let name = &line[..colon];
    if name.is_empty() ||
        !name.iter().all(|&b| b.is_ascii_graphic() && b != b':')
    {
        return Err(Error::BadHeader);
    }
    let name = from_utf8(name).map_err(|_| Error::BadHeader)?;
    Ok((name.to_string(), trim(&line[colon+1..]).to_vec()))
}
