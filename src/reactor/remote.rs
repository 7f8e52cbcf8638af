use std::sync::Arc;

use crossbeam_channel::{Sender, Receiver, unbounded};
use mio::Waker;

use crate::context::ConnectionId;
use crate::websocket::Packet;
use crate::Error;


/// Request delivered to the reactor thread
#[derive(Debug)]
pub(crate) enum Command {
    Write(ConnectionId, Vec<u8>),
    Packet(ConnectionId, Packet),
    Close(ConnectionId),
    Stop,
}

/// Handle to send data to connections from other threads
///
/// Connection contexts are bound to the reactor thread, so everything
/// coming from outside is queued and the selector is woken up. Commands for
/// connections which are already closed are silently dropped.
#[derive(Debug, Clone)]
pub struct Remote {
    sender: Sender<Command>,
    waker: Arc<Waker>,
}

pub(crate) fn channel(waker: Arc<Waker>) -> (Remote, Receiver<Command>) {
    let (tx, rx) = unbounded();
    (Remote { sender: tx, waker: waker }, rx)
}

impl Remote {
    /// Queues raw bytes to the connection's write queue
    pub fn write(&self, id: ConnectionId, data: Vec<u8>) -> Result<(), Error> {
        self.send(Command::Write(id, data))
    }
    /// Sends a websocket message, the connection must be upgraded
    pub fn send_packet(&self, id: ConnectionId, packet: Packet)
        -> Result<(), Error>
    {
        self.send(Command::Packet(id, packet))
    }
    /// Closes the connection after everything queued is written
    pub fn close(&self, id: ConnectionId) -> Result<(), Error> {
        self.send(Command::Close(id))
    }
    /// Stops the reactor, open connections are dropped
    pub fn stop(&self) -> Result<(), Error> {
        self.send(Command::Stop)
    }
    fn send(&self, command: Command) -> Result<(), Error> {
        self.sender.send(command).map_err(|_| Error::Closed)?;
        self.waker.wake()?;
        Ok(())
    }
}
