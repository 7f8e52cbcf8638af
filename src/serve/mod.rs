//! Server lifecycle: binding, the reactor thread and shutdown
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use mio::{Poll, Waker};
use mio::net::TcpListener;

use crate::reactor::{self, Initializer, Reactor, Remote};
use crate::Error;

mod config;

pub use self::config::Config;


/// A running server
///
/// The reactor runs on its own thread. Dropping the server stops it and
/// waits for the thread to exit.
pub struct Server {
    addr: SocketAddr,
    remote: Remote,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Server {
    /// Binds the listening socket and starts the reactor thread
    ///
    /// Errors binding the socket are returned here, the reactor thread
    /// only logs its errors.
    pub fn start<I: Initializer>(config: &Arc<Config>, initializer: I)
        -> Result<Server, Error>
    {
        let addr = (&config.host[..], config.port).to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput,
                format!("can't resolve {}", config.address())))?;
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let poll = Poll::new()?;
        let waker = Arc::new(Waker::new(poll.registry(), reactor::WAKER)?);
        let (remote, commands) = reactor::channel(waker);
        let running = Arc::new(AtomicBool::new(true));
        let config = config.clone();
        let initializer: Arc<dyn Initializer> = Arc::new(initializer);
        let flag = running.clone();
        let thread = thread::Builder::new()
            .name(format!("tk-reactor-{}", addr.port()))
            .spawn(move || {
                let result = Reactor::new(poll, listener, &config,
                                          initializer, commands, flag.clone())
                    .and_then(|reactor| reactor.run());
                if let Err(e) = result {
                    error!("Reactor failed: {}", e);
                }
                flag.store(false, Ordering::SeqCst);
            })?;
        info!("Listening on {}", addr);
        Ok(Server {
            addr: addr,
            remote: remote,
            running: running,
            thread: Some(thread),
        })
    }

    /// Address the server is bound to
    ///
    /// Useful when port zero is configured.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle to send data to connections from other threads
    pub fn remote(&self) -> Remote {
        self.remote.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the reactor, can be called multiple times
    ///
    /// Open connections are closed without flushing.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Stopping server on {}", self.addr);
            if let Err(e) = self.remote.stop() {
                debug!("Reactor is already gone: {}", e);
            }
        }
    }

    /// Waits until the reactor thread exits
    ///
    /// Something has to call `Remote::stop` for this to return.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Reactor thread panicked");
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Reactor thread panicked");
            }
        }
    }
}
