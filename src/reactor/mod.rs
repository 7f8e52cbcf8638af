//! The selector loop
//!
//! A single thread owns the listening socket, every accepted connection
//! and their pipelines. Other threads talk to connections via `Remote`.
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Receiver;
use mio::{Events, Interest, Poll, Token};
use mio::net::TcpListener;
use netbuf::Buf;

use crate::context::{ConnectionContext, ConnectionId, Protocol};
use crate::websocket;
use crate::Config;

mod connection;
mod remote;

pub use self::remote::Remote;
pub(crate) use self::remote::{Command, channel};
use self::connection::{Connection, Next};

pub(crate) const LISTENER: Token = Token(0);
pub(crate) const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;


/// Sets up the pipeline of each accepted connection
///
/// Called on the reactor thread right after accept. Usually it subscribes
/// a decoder to `ctx.input()` and an encoder output to `ctx.output()`,
/// see `server::bind_service`.
pub trait Initializer: Send + Sync + 'static {
    fn init(&self, ctx: &mut ConnectionContext);
}

impl<F> Initializer for F
    where F: Fn(&mut ConnectionContext) + Send + Sync + 'static,
{
    fn init(&self, ctx: &mut ConnectionContext) {
        (self)(ctx)
    }
}

pub(crate) struct Reactor {
    poll: Poll,
    listener: TcpListener,
    config: Arc<Config>,
    initializer: Arc<dyn Initializer>,
    commands: Receiver<Command>,
    running: Arc<AtomicBool>,
    connections: HashMap<Token, Connection>,
    tokens: HashMap<ConnectionId, Token>,
    next_token: usize,
    read_buf: Buf,
    write_buf: Vec<u8>,
}

impl Reactor {
    pub fn new(poll: Poll, mut listener: TcpListener, config: &Arc<Config>,
        initializer: Arc<dyn Initializer>, commands: Receiver<Command>,
        running: Arc<AtomicBool>)
        -> io::Result<Reactor>
    {
        poll.registry().register(&mut listener, LISTENER,
                                 Interest::READABLE)?;
        Ok(Reactor {
            poll: poll,
            listener: listener,
            config: config.clone(),
            initializer: initializer,
            commands: commands,
            running: running,
            connections: HashMap::new(),
            tokens: HashMap::new(),
            next_token: FIRST_CONNECTION,
            read_buf: Buf::new(),
            write_buf: vec![0; config.write_buffer_size],
        })
    }

    pub fn run(mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(self.config.events_capacity);
        while self.running.load(Ordering::SeqCst) {
            match self.poll.poll(&mut events, None) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(e) => return Err(e),
            }
            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept(),
                    WAKER => {}
                    token => {
                        if event.is_readable() || event.is_read_closed() ||
                           event.is_error()
                        {
                            self.read(token);
                        }
                        self.process(token);
                    }
                }
            }
            if !self.commands() {
                break;
            }
            self.resume_paused();
        }
        info!("Reactor stopped, dropping {} connections",
            self.connections.len());
        for (_, mut conn) in self.connections.drain() {
            conn.deregister(self.poll.registry());
        }
        Ok(())
    }

    fn accept(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    let mut ctx = ConnectionContext::new(addr, &self.config);
                    debug!("Accepted {} from {}", ctx.id(), addr);
                    self.initializer.init(&mut ctx);
                    let id = ctx.id();
                    let mut conn = Connection::new(stream, ctx);
                    if let Err(e) = conn.register(self.poll.registry(), token)
                    {
                        warn!("Can't register connection from {}: {}",
                              addr, e);
                        continue;
                    }
                    self.tokens.insert(id, token);
                    self.connections.insert(token, conn);
                    // edge triggered: data may already be there
                    self.read(token);
                    self.process(token);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                    break;
                }
            }
        }
    }

    fn read(&mut self, token: Token) {
        if let Some(conn) = self.connections.get_mut(&token) {
            conn.read(&mut self.read_buf);
        }
    }

    fn process(&mut self, token: Token) {
        let next = match self.connections.get_mut(&token) {
            Some(conn) => conn.process(self.poll.registry(), token,
                                       &mut self.write_buf),
            None => return,
        };
        if next == Next::Close {
            self.close(token);
        }
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            debug!("Closing {}", conn.context().id());
            self.tokens.remove(&conn.context().id());
            conn.deregister(self.poll.registry());
        }
    }

    /// Executes commands from other threads, returns false on stop
    fn commands(&mut self) -> bool {
        while let Ok(cmd) = self.commands.try_recv() {
            let id = match cmd {
                Command::Stop => return false,
                Command::Write(id, _) | Command::Packet(id, _)
                | Command::Close(id) => id,
            };
            let token = match self.tokens.get(&id) {
                Some(token) => *token,
                None => {
                    trace!("Command for closed connection {}", id);
                    continue;
                }
            };
            if let Some(conn) = self.connections.get(&token) {
                let output = conn.context().output();
                match cmd {
                    Command::Write(_, data) => {
                        output.push(data);
                    }
                    Command::Packet(_, ref packet)
                        if conn.context().protocol().get()
                            == Protocol::WebSocket
                    => {
                        let mut data = Vec::new();
                        websocket::write_packet(&mut data, packet, None);
                        output.push(data);
                    }
                    Command::Packet(..) => {
                        warn!("Packet for {} dropped: not a websocket", id);
                    }
                    Command::Close(_) => output.close(),
                    Command::Stop => unreachable!(),
                }
            }
            self.process(token);
        }
        true
    }

    /// Reads connections which had no demand earlier but do have now
    fn resume_paused(&mut self) {
        let paused: Vec<Token> = self.connections.iter()
            .filter(|&(_, conn)| conn.is_paused())
            .map(|(token, _)| *token)
            .collect();
        for token in paused {
            let ready = match self.connections.get(&token) {
                Some(conn) => {
                    conn.context().output().resume();
                    conn.context().input().demand() > 0
                }
                None => false,
            };
            if ready {
                self.read(token);
                self.process(token);
            }
        }
    }
}
