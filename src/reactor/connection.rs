use std::io::{self, Write};

use mio::{Interest, Registry, Token};
use mio::net::TcpStream;
use netbuf::Buf;

use crate::buffer::transfer;
use crate::context::ConnectionContext;
use crate::Error;


/// What the reactor should do with the socket after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Next {
    Keep,
    Close,
}

/// A socket together with its pipeline
pub(crate) struct Connection {
    stream: TcpStream,
    ctx: ConnectionContext,
    interest: Interest,
    eof: bool,
    paused: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, ctx: ConnectionContext) -> Connection {
        Connection {
            stream: stream,
            ctx: ctx,
            interest: Interest::READABLE,
            eof: false,
            paused: false,
        }
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.ctx
    }

    pub fn register(&mut self, registry: &Registry, token: Token)
        -> io::Result<()>
    {
        registry.register(&mut self.stream, token, self.interest)
    }

    pub fn deregister(&mut self, registry: &Registry) {
        if let Err(e) = registry.deregister(&mut self.stream) {
            debug!("Error deregistering {}: {}", self.ctx.id(), e);
        }
    }

    /// True if reading stopped because the pipeline had no demand
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reads until the socket blocks or the pipeline stops asking for data
    ///
    /// Each successful read is emitted as a separate item.
    pub fn read(&mut self, buf: &mut Buf) {
        let max = self.ctx.config().read_buffer_size;
        let input = self.ctx.input();
        self.paused = false;
        while !self.eof && !input.is_finished() {
            if input.demand() == 0 {
                self.paused = true;
                break;
            }
            let before = buf.len();
            match buf.read_max_from(max, &mut self.stream) {
                // returns whether `max` was reached, not the byte count
                Ok(_) if buf.len() == before => {
                    trace!("Connection {} got EOF", self.ctx.id());
                    self.eof = true;
                    input.complete();
                }
                Ok(_) => {
                    trace!("Read {} bytes from {}",
                        buf.len() - before, self.ctx.id());
                    let len = buf.len();
                    input.offer(transfer(buf, len));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("Read error on {}: {}", self.ctx.id(), e);
                    self.eof = true;
                    input.error(Error::Io(e));
                }
            }
        }
    }

    /// Writes the queue until the socket blocks
    pub fn flush(&mut self, scratch: &mut [u8]) -> io::Result<()> {
        let output = self.ctx.output();
        loop {
            let n = output.fill(scratch);
            if n == 0 {
                break;
            }
            match self.stream.write(&scratch[..n]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(written) => {
                    trace!("Written {} bytes to {}", written, self.ctx.id());
                    output.consume(written);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        output.resume();
        Ok(())
    }

    /// Flushes the write queue and updates socket interest
    pub fn process(&mut self, registry: &Registry, token: Token,
        scratch: &mut [u8])
        -> Next
    {
        let output = self.ctx.output();
        if output.is_aborted() {
            debug!("Connection {} aborted", self.ctx.id());
            return Next::Close;
        }
        if let Err(e) = self.flush(scratch) {
            debug!("Write error on {}: {}", self.ctx.id(), e);
            return Next::Close;
        }
        let output = self.ctx.output();
        if output.close_reached() {
            debug!("Connection {} closed after flush", self.ctx.id());
            return Next::Close;
        }
        // nothing more can be read, so an empty queue is final
        if self.eof && output.is_empty() {
            debug!("Connection {} closed after peer EOF", self.ctx.id());
            return Next::Close;
        }
        let interest = if output.is_empty() {
            Interest::READABLE
        } else {
            Interest::READABLE | Interest::WRITABLE
        };
        if interest != self.interest {
            self.interest = interest;
            if let Err(e) = registry.reregister(&mut self.stream, token,
                                                interest)
            {
                debug!("Error reregistering {}: {}", self.ctx.id(), e);
                return Next::Close;
            }
        }
        Next::Keep
    }
}
