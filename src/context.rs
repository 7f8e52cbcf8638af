use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::Arc;

use uuid::Uuid;

use crate::buffer;
use crate::channel::{Publisher, Sink, Subscription};
use crate::{Config, Error};


/// Process-unique identifier of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

/// Per-connection key-value store
///
/// Used to stash parse state (like an in-flight request) between reactor
/// iterations. It's a cheap handle, clones refer to the same store.
#[derive(Clone)]
pub struct Attributes {
    map: Rc<RefCell<HashMap<String, Box<dyn Any>>>>,
}

/// Which protocol the connection speaks right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    WebSocket,
}

/// Shared flag that selects the decoder/encoder pair of a connection
#[derive(Debug, Clone)]
pub struct ProtocolSwitch(Rc<Cell<Protocol>>);

/// An entry of the write queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteEntry {
    /// Bytes to write
    Bytes(Vec<u8>),
    /// Close the socket when everything before this entry is written
    Close,
}

struct WriteQueue {
    entries: VecDeque<WriteEntry>,
    /// Number of bytes already written from the front entry
    offset: usize,
    buffered: usize,
    closing: bool,
    aborted: bool,
    starved: bool,
    high_watermark: usize,
    subscription: Option<Subscription>,
}

/// Output side of a connection: an ordered queue of byte regions
///
/// Once `close()` is called the close marker is the last entry forever,
/// anything pushed after it is dropped.
#[derive(Clone)]
pub struct OutputSink {
    queue: Rc<RefCell<WriteQueue>>,
}

/// The sink that feeds the write queue from the encoder's publisher
pub struct QueueSink {
    output: OutputSink,
}

/// State of a single accepted connection
///
/// Owned and mutated by the reactor thread only.
pub struct ConnectionContext {
    id: ConnectionId,
    peer_addr: SocketAddr,
    config: Arc<Config>,
    attributes: Attributes,
    input: Publisher<Vec<u8>>,
    output: OutputSink,
    protocol: ProtocolSwitch,
}

impl ConnectionId {
    /// Generates a new random id
    pub fn new() -> ConnectionId {
        ConnectionId(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Attributes {
    fn new() -> Attributes {
        Attributes { map: Rc::new(RefCell::new(HashMap::new())) }
    }
    /// Stores a value, replacing the previous one
    pub fn insert<T: Any>(&self, key: &str, value: T) {
        self.map.borrow_mut().insert(key.to_string(), Box::new(value));
    }
    /// True if there is a value for the key (of any type)
    pub fn contains(&self, key: &str) -> bool {
        self.map.borrow().contains_key(key)
    }
    /// Removes and returns the value if it has type `T`
    ///
    /// A value of another type is left in place.
    pub fn remove<T: Any>(&self, key: &str) -> Option<T> {
        let mut map = self.map.borrow_mut();
        if !map.get(key).map(|v| v.is::<T>()).unwrap_or(false) {
            return None;
        }
        map.remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }
    /// Runs `f` on the value if it exists and has type `T`
    ///
    /// The store is locked while `f` runs, so `f` must not access
    /// attributes itself.
    pub fn with<T: Any, R, F>(&self, key: &str, f: F) -> Option<R>
        where F: FnOnce(&mut T) -> R
    {
        let mut map = self.map.borrow_mut();
        map.get_mut(key)
            .and_then(|v| v.downcast_mut::<T>())
            .map(f)
    }
    /// Number of stored values
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }
}

impl ProtocolSwitch {
    fn new() -> ProtocolSwitch {
        ProtocolSwitch(Rc::new(Cell::new(Protocol::Http)))
    }
    /// Currently active protocol
    pub fn get(&self) -> Protocol {
        self.0.get()
    }
    /// Selects another protocol
    ///
    /// Decoder and encoder pick up the change on the next item they process.
    pub fn switch_to(&self, protocol: Protocol) {
        if self.0.get() != protocol {
            debug!("Switching protocol {:?} -> {:?}", self.0.get(), protocol);
        }
        self.0.set(protocol)
    }
}

impl OutputSink {
    fn new(high_watermark: usize) -> OutputSink {
        OutputSink {
            queue: Rc::new(RefCell::new(WriteQueue {
                entries: VecDeque::new(),
                offset: 0,
                buffered: 0,
                closing: false,
                aborted: false,
                starved: false,
                high_watermark: high_watermark,
                subscription: None,
            })),
        }
    }

    /// Appends bytes to the queue
    ///
    /// Returns false if the queue is already closing (data is dropped).
    pub fn push(&self, data: Vec<u8>) -> bool {
        let mut q = self.queue.borrow_mut();
        if q.closing || q.aborted {
            trace!("Dropping {} bytes written after close", data.len());
            return false;
        }
        if data.is_empty() {
            return true;
        }
        q.buffered += data.len();
        q.entries.push_back(WriteEntry::Bytes(data));
        true
    }

    /// Appends the close marker
    ///
    /// Socket is closed when everything queued before is written.
    pub fn close(&self) {
        let mut q = self.queue.borrow_mut();
        if !q.closing {
            q.closing = true;
            q.entries.push_back(WriteEntry::Close);
        }
    }

    /// Requests closing the socket right away, dropping queued data
    pub fn abort(&self) {
        let mut q = self.queue.borrow_mut();
        q.aborted = true;
    }

    /// True if there is nothing to write (close marker doesn't count)
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().buffered == 0
    }

    /// Number of bytes waiting in the queue
    pub fn buffered(&self) -> usize {
        self.queue.borrow().buffered
    }

    /// True if the close marker is queued
    pub fn is_closing(&self) -> bool {
        self.queue.borrow().closing
    }

    /// True if `abort()` was called
    pub fn is_aborted(&self) -> bool {
        self.queue.borrow().aborted
    }

    /// True if all bytes are written and the next entry is the close marker
    pub fn close_reached(&self) -> bool {
        matches!(self.queue.borrow().entries.front(), Some(&WriteEntry::Close))
    }

    /// Copies queued bytes into `dst` without consuming them
    pub fn fill(&self, dst: &mut [u8]) -> usize {
        let q = self.queue.borrow();
        let offset = q.offset;
        let regions = q.entries.iter().enumerate().filter_map(|(i, e)| {
            match *e {
                WriteEntry::Bytes(ref data) if i == 0 => Some(&data[offset..]),
                WriteEntry::Bytes(ref data) => Some(&data[..]),
                WriteEntry::Close => None,
            }
        });
        buffer::gather(regions, dst)
    }

    /// Removes `n` bytes that were written to the socket
    pub fn consume(&self, mut n: usize) {
        let mut q = self.queue.borrow_mut();
        q.buffered -= n;
        while n > 0 {
            let front_len = match q.entries.front() {
                Some(&WriteEntry::Bytes(ref data)) => data.len() - q.offset,
                _ => break,
            };
            if n >= front_len {
                n -= front_len;
                q.offset = 0;
                q.entries.pop_front();
            } else {
                q.offset += n;
                n = 0;
            }
        }
    }

    /// Takes every queued byte at once
    ///
    /// Useful to run a pipeline without a socket.
    pub fn take_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.buffered());
        let mut chunk = [0u8; 4096];
        loop {
            let n = self.fill(&mut chunk);
            if n == 0 {
                break;
            }
            result.extend_from_slice(&chunk[..n]);
            self.consume(n);
        }
        self.resume();
        result
    }

    /// Requests more data from the encoder if the sink was stopped by
    /// the high watermark and the queue has drained below it
    pub fn resume(&self) {
        let sub = {
            let mut q = self.queue.borrow_mut();
            if !q.starved || q.buffered >= q.high_watermark {
                return;
            }
            q.starved = false;
            q.subscription.clone()
        };
        if let Some(sub) = sub {
            sub.request(1);
        }
    }

    /// A sink to subscribe to the encoder's output
    pub fn sink(&self) -> QueueSink {
        QueueSink { output: self.clone() }
    }
}

impl Sink<Vec<u8>> for QueueSink {
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.output.queue.borrow_mut().subscription = Some(subscription.clone());
        subscription.request(1);
    }
    fn on_next(&mut self, data: Vec<u8>) {
        self.output.push(data);
        let sub = {
            let mut q = self.output.queue.borrow_mut();
            if q.buffered >= q.high_watermark {
                q.starved = true;
                None
            } else {
                q.subscription.clone()
            }
        };
        if let Some(sub) = sub {
            sub.request(1);
        }
    }
    fn on_error(&mut self, error: Error) {
        debug!("Output failed: {}", error);
        self.output.abort();
    }
    fn on_complete(&mut self) {
        self.output.close();
    }
}

impl ConnectionContext {
    /// Creates a context for a freshly accepted connection
    pub fn new(peer_addr: SocketAddr, config: &Arc<Config>)
        -> ConnectionContext
    {
        let output = OutputSink::new(config.output_high_watermark);
        let input = Publisher::new();
        let out = output.clone();
        input.on_cancel(move || {
            debug!("Input cancelled, closing connection");
            out.abort();
        });
        ConnectionContext {
            id: ConnectionId::new(),
            peer_addr: peer_addr,
            config: config.clone(),
            attributes: Attributes::new(),
            input: input,
            output: output,
            protocol: ProtocolSwitch::new(),
        }
    }
    /// Unique id of the connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }
    /// Address of the remote peer
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
    /// Server configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }
    /// Attribute store of the connection
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
    /// Bytes read from the socket
    ///
    /// Cancelling the subscription to this publisher closes the socket.
    pub fn input(&self) -> &Publisher<Vec<u8>> {
        &self.input
    }
    /// Write queue of the socket
    pub fn output(&self) -> &OutputSink {
        &self.output
    }
    /// The protocol switch shared by decoder and encoder
    pub fn protocol(&self) -> &ProtocolSwitch {
        &self.protocol
    }
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("protocol", &self.protocol.get())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::Config;
    use crate::channel::Publisher;
    use super::{ConnectionContext, ConnectionId};

    fn ctx() -> ConnectionContext {
        ConnectionContext::new("127.0.0.1:1234".parse().unwrap(),
                               &Arc::new(Config::new()))
    }

    #[test]
    fn unique_ids() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
        assert_ne!(ctx().id(), ctx().id());
    }

    #[test]
    fn attributes() {
        let ctx = ctx();
        let attrs = ctx.attributes();
        attrs.insert("counter", 1u32);
        assert!(attrs.contains("counter"));
        assert_eq!(attrs.with("counter", |x: &mut u32| { *x += 1; *x }),
                   Some(2));
        assert_eq!(attrs.remove::<String>("counter"), None);
        assert_eq!(attrs.remove::<u32>("counter"), Some(2));
        assert_eq!(attrs.len(), 0);
    }

    #[test]
    fn partial_writes() {
        let ctx = ctx();
        let out = ctx.output();
        out.push(b"hello ".to_vec());
        out.push(b"world".to_vec());
        out.close();
        let mut buf = [0u8; 8];
        assert_eq!(out.fill(&mut buf), 8);
        assert_eq!(&buf, b"hello wo");
        out.consume(3);
        assert_eq!(out.buffered(), 8);
        assert_eq!(out.fill(&mut buf), 8);
        assert_eq!(&buf, b"lo world");
        assert!(!out.close_reached());
        out.consume(8);
        assert!(out.is_empty());
        assert!(out.close_reached());
        // close marker stays the last entry
        assert!(!out.push(b"late".to_vec()));
        assert!(out.is_empty());
    }

    #[test]
    fn sink_stops_at_watermark() {
        let cfg = Config::new().output_high_watermark(10).done();
        let ctx = ConnectionContext::new("127.0.0.1:1".parse().unwrap(), &cfg);
        let source = Publisher::new();
        source.subscribe(ctx.output().sink());
        assert_eq!(source.demand(), 1);
        source.emit(b"0123456789abc".to_vec()).unwrap();
        assert_eq!(source.demand(), 0);
        assert_eq!(ctx.output().take_bytes(), b"0123456789abc");
        assert_eq!(source.demand(), 1);
        source.complete();
        assert!(ctx.output().close_reached());
    }

    #[test]
    fn cancel_aborts() {
        let ctx = ctx();
        let (sink, handle) = crate::channel::Collector::unbounded();
        ctx.input().subscribe(sink);
        handle.cancel();
        assert!(ctx.output().is_aborted());
    }
}
