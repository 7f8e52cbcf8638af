//! Backpressure-aware publish/subscribe primitives
//!
//! This is a tiny single-threaded analogue of reactive streams. A
//! `Publisher` delivers items to exactly one `Sink`, and only as many
//! as the sink has asked for with `Subscription::request`. At most one
//! terminal signal (`on_complete` or `on_error`) is delivered, after all
//! previously accepted items.
//!
//! Channels connect the socket to the decoder, the decoder to the
//! application, the application to the encoder, and the encoder to the
//! socket's write queue. Everything lives on the reactor thread, so the
//! types here are neither `Send` nor `Sync`.
use std::cell::RefCell;
use std::rc::Rc;

use crate::Error;

mod error;
mod publisher;
mod processor;

pub use self::error::ChannelError;
pub use self::publisher::{Publisher, Subscription, Demand};
pub use self::processor::{Transform, Processor};


/// Consumer side of the channel
pub trait Sink<T> {
    /// Called once before any other method
    ///
    /// No items are delivered until `request()` is called on the
    /// subscription.
    fn on_subscribe(&mut self, subscription: Subscription);
    /// Next item, never called more times than requested
    fn on_next(&mut self, item: T);
    /// Terminal error signal
    fn on_error(&mut self, error: Error);
    /// Terminal completion signal
    fn on_complete(&mut self);
}

/// A sink that stores everything it receives
///
/// Mostly useful for tests and for gluing a pipeline to synchronous code.
pub struct Collector<T> {
    shared: Rc<RefCell<Collected<T>>>,
    prefetch: i64,
}

/// Items and signals received by a `Collector`
struct Collected<T> {
    items: Vec<T>,
    error: Option<Error>,
    completed: bool,
    subscription: Option<Subscription>,
}

/// Handle to the data received by a `Collector`
pub struct CollectorHandle<T> {
    shared: Rc<RefCell<Collected<T>>>,
}

impl<T> Collector<T> {
    /// Collector that requests everything upfront
    pub fn unbounded() -> (Collector<T>, CollectorHandle<T>) {
        Collector::with_prefetch(i64::max_value())
    }
    /// Collector that requests nothing by itself
    ///
    /// Use `CollectorHandle::request` to let items in.
    pub fn manual() -> (Collector<T>, CollectorHandle<T>) {
        Collector::with_prefetch(0)
    }
    fn with_prefetch(prefetch: i64) -> (Collector<T>, CollectorHandle<T>) {
        let shared = Rc::new(RefCell::new(Collected {
            items: Vec::new(),
            error: None,
            completed: false,
            subscription: None,
        }));
        let handle = CollectorHandle { shared: shared.clone() };
        (Collector { shared: shared, prefetch: prefetch }, handle)
    }
}

impl<T> Sink<T> for Collector<T> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.shared.borrow_mut().subscription = Some(subscription.clone());
        if self.prefetch > 0 {
            subscription.request(self.prefetch);
        }
    }
    fn on_next(&mut self, item: T) {
        self.shared.borrow_mut().items.push(item);
    }
    fn on_error(&mut self, error: Error) {
        self.shared.borrow_mut().error = Some(error);
    }
    fn on_complete(&mut self) {
        self.shared.borrow_mut().completed = true;
    }
}

impl<T> CollectorHandle<T> {
    /// Removes and returns items received so far
    pub fn take(&self) -> Vec<T> {
        self.shared.borrow_mut().items.drain(..).collect()
    }
    /// Number of items received and not taken yet
    pub fn len(&self) -> usize {
        self.shared.borrow().items.len()
    }
    /// Removes the error if one was received
    pub fn take_error(&self) -> Option<Error> {
        self.shared.borrow_mut().error.take()
    }
    /// True if an error was received (and not taken yet)
    pub fn has_error(&self) -> bool {
        self.shared.borrow().error.is_some()
    }
    /// True if completion was received
    pub fn is_complete(&self) -> bool {
        self.shared.borrow().completed
    }
    /// Request more items from the publisher
    pub fn request(&self, n: i64) {
        let sub = self.shared.borrow().subscription.clone();
        if let Some(sub) = sub {
            sub.request(n);
        }
    }
    /// Cancel the subscription
    pub fn cancel(&self) {
        let sub = self.shared.borrow().subscription.clone();
        if let Some(sub) = sub {
            sub.cancel();
        }
    }
}
