use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::Error;
use super::{Sink, ChannelError};


/// Demand state passed to a publisher's listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demand {
    /// Demand that is granted but not used yet
    pub demand: u64,
    /// Items accepted by `offer` and waiting for demand
    pub backlog: usize,
    /// Terminal signal is emitted or subscription is cancelled
    pub finished: bool,
}

/// Source side of the channel
///
/// Items are delivered to the single subscribed sink, never more than
/// the sink has requested. The publisher is a cheap handle, clones refer
/// to the same channel.
///
/// Delivery is synchronous: `emit`, `offer` and `request` deliver items
/// before they return, unless they are called from within a delivery of
/// the same publisher, in which case the outer delivery loop picks them
/// up.
pub struct Publisher<T> {
    core: Rc<Core<T>>,
}

/// Handle passed to the sink in `on_subscribe`
///
/// Holds a weak reference, so it doesn't keep the publisher alive.
#[derive(Clone)]
pub struct Subscription {
    core: Weak<dyn Control>,
}

trait Control {
    fn request(&self, n: i64);
    fn cancel(&self);
}

enum Terminal {
    Complete,
    Error(Error),
}

enum Step<T> {
    Next(Box<dyn Sink<T>>, T),
    Terminal(Box<dyn Sink<T>>, Terminal),
}

struct State<T> {
    sink: Option<Box<dyn Sink<T>>>,
    subscribed: bool,
    demand: u64,
    backlog: VecDeque<T>,
    terminal: Option<Terminal>,
    finished: bool,
    terminated: bool,
    cancelled: bool,
    draining: bool,
    again: bool,
    listener: Option<Box<dyn FnMut(Demand)>>,
    on_cancel: Option<Box<dyn FnOnce()>>,
}

struct Core<T> {
    state: RefCell<State<T>>,
}

impl<T> State<T> {
    fn status(&self) -> Demand {
        Demand {
            demand: self.demand,
            backlog: self.backlog.len(),
            finished: self.finished || self.cancelled,
        }
    }
}

impl Demand {
    /// Downstream has demand that upstream is expected to satisfy
    pub fn wants_more(&self) -> bool {
        !self.finished && self.backlog == 0 && self.demand > 0
    }
}

impl<T: 'static> Core<T> {
    fn drain(&self) {
        {
            let mut s = self.state.borrow_mut();
            if s.draining {
                s.again = true;
                return;
            }
            s.draining = true;
        }
        loop {
            self.deliver();
            let (status, listener) = {
                let mut s = self.state.borrow_mut();
                s.again = false;
                (s.status(), s.listener.take())
            };
            if let Some(mut listener) = listener {
                listener(status);
                let mut s = self.state.borrow_mut();
                if s.listener.is_none() && !s.cancelled && !s.terminated {
                    s.listener = Some(listener);
                }
            }
            let mut s = self.state.borrow_mut();
            if !s.again {
                s.draining = false;
                break;
            }
        }
    }

    fn deliver(&self) {
        loop {
            let step = {
                let mut s = self.state.borrow_mut();
                if s.cancelled || s.terminated {
                    return;
                }
                let sink = match s.sink.take() {
                    Some(sink) => sink,
                    None => return,
                };
                let item = if s.demand > 0 { s.backlog.pop_front() } else { None };
                if let Some(item) = item {
                    if s.demand != u64::max_value() {
                        s.demand -= 1;
                    }
                    Step::Next(sink, item)
                } else if s.backlog.is_empty() && s.terminal.is_some() {
                    s.terminated = true;
                    s.listener = None;
                    s.on_cancel = None;
                    let terminal = s.terminal.take()
                        .unwrap_or(Terminal::Complete);
                    Step::Terminal(sink, terminal)
                } else {
                    s.sink = Some(sink);
                    return;
                }
            };
            match step {
                Step::Next(mut sink, item) => {
                    sink.on_next(item);
                    let mut s = self.state.borrow_mut();
                    if !s.cancelled {
                        s.sink = Some(sink);
                    } else {
                        drop(s);
                        drop(sink);
                    }
                }
                Step::Terminal(mut sink, Terminal::Complete) => {
                    sink.on_complete();
                }
                Step::Terminal(mut sink, Terminal::Error(e)) => {
                    sink.on_error(e);
                }
            }
        }
    }

    fn finish(&self, terminal: Terminal) -> bool {
        {
            let mut s = self.state.borrow_mut();
            if s.finished || s.cancelled {
                return false;
            }
            s.finished = true;
            s.terminal = Some(terminal);
        }
        self.drain();
        true
    }
}

impl<T: 'static> Control for Core<T> {
    fn request(&self, n: i64) {
        {
            let mut s = self.state.borrow_mut();
            if s.cancelled || s.terminated {
                return;
            }
            if n <= 0 {
                debug!("Invalid demand {} requested", n);
                if !s.finished {
                    s.finished = true;
                    s.backlog.clear();
                    s.terminal = Some(Terminal::Error(
                        ChannelError::InvalidDemand(n).into()));
                }
            } else {
                s.demand = s.demand.saturating_add(n as u64);
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        let (hook, sink, listener, backlog) = {
            let mut s = self.state.borrow_mut();
            if s.cancelled || s.terminated {
                return;
            }
            s.cancelled = true;
            s.terminal = None;
            let backlog = s.backlog.drain(..).collect::<Vec<_>>();
            (s.on_cancel.take(), s.sink.take(), s.listener.take(), backlog)
        };
        drop(backlog);
        drop(sink);
        drop(listener);
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl<T: 'static> Publisher<T> {
    /// Creates a publisher without a sink
    pub fn new() -> Publisher<T> {
        Publisher {
            core: Rc::new(Core {
                state: RefCell::new(State {
                    sink: None,
                    subscribed: false,
                    demand: 0,
                    backlog: VecDeque::new(),
                    terminal: None,
                    finished: false,
                    terminated: false,
                    cancelled: false,
                    draining: false,
                    again: false,
                    listener: None,
                    on_cancel: None,
                }),
            }),
        }
    }

    /// Attach the sink
    ///
    /// Only one sink is supported, the second one receives
    /// `ChannelError::AlreadySubscribed` right away.
    pub fn subscribe<S: Sink<T> + 'static>(&self, sink: S) {
        self.subscribe_boxed(Box::new(sink))
    }

    /// Same as `subscribe` for a boxed sink
    pub fn subscribe_boxed(&self, mut sink: Box<dyn Sink<T>>) {
        let already = {
            let mut s = self.core.state.borrow_mut();
            let already = s.subscribed;
            s.subscribed = true;
            already
        };
        if already {
            sink.on_error(ChannelError::AlreadySubscribed.into());
            return;
        }
        sink.on_subscribe(self.subscription());
        let rejected = {
            let mut s = self.core.state.borrow_mut();
            if s.cancelled {
                Some(sink)
            } else {
                s.sink = Some(sink);
                None
            }
        };
        drop(rejected);
        self.core.drain();
    }

    fn subscription(&self) -> Subscription {
        let core: Rc<dyn Control> = self.core.clone();
        Subscription { core: Rc::downgrade(&core) }
    }

    /// Deliver an item that the sink has asked for
    ///
    /// Emitting without outstanding demand is a bug in the caller: it
    /// panics in debug builds and returns `DemandExceeded` otherwise.
    pub fn emit(&self, item: T) -> Result<(), Error> {
        {
            let mut s = self.core.state.borrow_mut();
            if s.cancelled {
                return Err(ChannelError::Cancelled.into());
            }
            if s.finished {
                return Err(ChannelError::Finished.into());
            }
            if s.backlog.len() as u64 >= s.demand {
                debug_assert!(false, "item emitted without demand");
                return Err(ChannelError::DemandExceeded.into());
            }
            s.backlog.push_back(item);
        }
        self.core.drain();
        Ok(())
    }

    /// Queue an item that is delivered as soon as there is demand
    ///
    /// Items offered after cancellation or after a terminal signal are
    /// dropped.
    pub fn offer(&self, item: T) {
        self.offer_all(Some(item))
    }

    /// Queue a number of items and deliver as many as demand allows
    pub fn offer_all<I: IntoIterator<Item=T>>(&self, items: I) {
        {
            let mut s = self.core.state.borrow_mut();
            if s.cancelled || s.finished {
                return;
            }
            s.backlog.extend(items);
        }
        self.core.drain();
    }

    /// Signal completion after all queued items are delivered
    ///
    /// Returns false if the publisher is already finished or cancelled.
    pub fn complete(&self) -> bool {
        self.core.finish(Terminal::Complete)
    }

    /// Signal error after all queued items are delivered
    ///
    /// Returns false if the publisher is already finished or cancelled.
    pub fn error(&self, err: Error) -> bool {
        self.core.finish(Terminal::Error(err))
    }

    /// Current demand, backlog and termination state
    pub fn status(&self) -> Demand {
        self.core.state.borrow().status()
    }

    /// Demand that can be satisfied with `emit` right now
    pub fn demand(&self) -> u64 {
        let s = self.core.state.borrow();
        s.demand.saturating_sub(s.backlog.len() as u64)
    }

    /// True if the sink has cancelled the subscription
    pub fn is_cancelled(&self) -> bool {
        self.core.state.borrow().cancelled
    }

    /// True if a terminal signal was emitted or subscription cancelled
    pub fn is_finished(&self) -> bool {
        let s = self.core.state.borrow();
        s.finished || s.cancelled
    }

    /// Called each time the publisher finishes a delivery round, including
    /// the rounds triggered by `request`
    ///
    /// This is how a stage learns that downstream wants more items.
    pub fn set_listener<F: FnMut(Demand) + 'static>(&self, f: F) {
        self.core.state.borrow_mut().listener = Some(Box::new(f));
    }

    /// Called once when the sink cancels the subscription
    pub fn on_cancel<F: FnOnce() + 'static>(&self, f: F) {
        {
            let mut s = self.core.state.borrow_mut();
            if !s.cancelled {
                s.on_cancel = Some(Box::new(f));
                return;
            }
        }
        f();
    }
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Publisher<T> {
        Publisher { core: self.core.clone() }
    }
}

impl<T: 'static> Default for Publisher<T> {
    fn default() -> Publisher<T> {
        Publisher::new()
    }
}

impl Subscription {
    /// Ask for `n` more items, `n` must be positive
    pub fn request(&self, n: i64) {
        if let Some(core) = self.core.upgrade() {
            core.request(n);
        }
    }

    /// Stop delivery and release the publisher's resources
    pub fn cancel(&self) {
        if let Some(core) = self.core.upgrade() {
            core.cancel();
        }
    }
}

impl ::std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("Subscription")
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::Publisher;
    use super::super::Collector;

    #[test]
    fn offered_items_wait_for_demand() {
        let publisher = Publisher::new();
        let (sink, items) = Collector::manual();
        publisher.subscribe(sink);
        publisher.offer_all(vec![1, 2, 3]);
        assert!(items.take().is_empty());
        items.request(2);
        assert_eq!(items.take(), vec![1, 2]);
        publisher.complete();
        assert!(!items.is_complete());
        items.request(1);
        assert_eq!(items.take(), vec![3]);
        assert!(items.is_complete());
    }

    #[test]
    fn single_terminal_signal() {
        let publisher = Publisher::<u8>::new();
        let (sink, items) = Collector::unbounded();
        publisher.subscribe(sink);
        assert!(publisher.complete());
        assert!(!publisher.complete());
        assert!(!publisher.error(crate::Error::Closed));
        assert!(items.is_complete());
        assert!(!items.has_error());
    }

    #[test]
    fn second_subscriber_rejected() {
        let publisher = Publisher::<u8>::new();
        let (first, _) = Collector::unbounded();
        let (second, items) = Collector::unbounded();
        publisher.subscribe(first);
        publisher.subscribe(second);
        assert!(items.has_error());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected="item emitted without demand")]
    fn emit_without_demand() {
        let publisher = Publisher::new();
        let (sink, _items) = Collector::manual();
        publisher.subscribe(sink);
        publisher.emit(1u8).ok();
    }
}
