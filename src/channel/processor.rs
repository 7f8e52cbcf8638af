use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::Error;
use super::{Sink, Publisher, Subscription};


/// A synchronous step of a pipeline
///
/// Decoders, encoders and application handlers implement this trait and
/// are turned into pipeline stages with `Publisher::pipe`.
pub trait Transform {
    /// Items consumed
    type Input;
    /// Items produced
    type Output;

    /// Process a single input item
    ///
    /// Everything pushed into `output` is delivered downstream even if
    /// the method returns an error. The error is then delivered as the
    /// terminal signal.
    fn transform(&mut self, input: Self::Input, output: &mut Vec<Self::Output>)
        -> Result<(), Error>;

    /// Upstream is complete
    ///
    /// Output is completed after the items pushed here.
    fn finish(&mut self, _output: &mut Vec<Self::Output>)
        -> Result<(), Error>
    {
        Ok(())
    }

    /// Upstream failed
    ///
    /// By default the error is passed through. Returning `Ok` turns the
    /// failure into normal completion (for example after writing an error
    /// response into `output`).
    fn fail(&mut self, error: Error, _output: &mut Vec<Self::Output>)
        -> Result<(), Error>
    {
        Err(error)
    }

    /// Returns true when the stage doesn't want any more input
    ///
    /// Checked after each `transform()`, output is completed when it
    /// becomes true.
    fn is_done(&self) -> bool {
        false
    }
}

struct Upstream {
    subscription: RefCell<Option<Subscription>>,
    outstanding: Cell<bool>,
    stopped: Cell<bool>,
}

/// Pipeline stage wrapping a `Transform`
///
/// It's a sink for `T::Input` and has a publisher of `T::Output`. A single
/// item is requested from upstream at a time, and only when everything
/// produced so far is delivered and downstream asks for more. So the
/// amount of data buffered in a stage is bounded by what a single input
/// item expands to.
pub struct Processor<T: Transform> {
    transform: T,
    output: Publisher<T::Output>,
    upstream: Rc<Upstream>,
    scratch: Vec<T::Output>,
    done: bool,
}

impl Upstream {
    fn pull(&self) {
        if self.stopped.get() || self.outstanding.get() {
            return;
        }
        let sub = self.subscription.borrow().clone();
        if let Some(sub) = sub {
            self.outstanding.set(true);
            sub.request(1);
        }
    }
    fn stop(&self) {
        self.stopped.set(true);
    }
    fn cancel(&self) {
        self.stopped.set(true);
        let sub = self.subscription.borrow_mut().take();
        if let Some(sub) = sub {
            sub.cancel();
        }
    }
}

impl<T> Processor<T>
    where T: Transform,
          T::Output: 'static,
{
    /// Wraps a transform, subscribe the processor to the input publisher
    /// and use `output()` to get the results
    pub fn new(transform: T) -> Processor<T> {
        let upstream = Rc::new(Upstream {
            subscription: RefCell::new(None),
            outstanding: Cell::new(false),
            stopped: Cell::new(false),
        });
        let output = Publisher::new();
        let up = upstream.clone();
        output.set_listener(move |demand| {
            if demand.wants_more() {
                up.pull();
            }
        });
        let up = upstream.clone();
        output.on_cancel(move || up.cancel());
        Processor {
            transform: transform,
            output: output,
            upstream: upstream,
            scratch: Vec::new(),
            done: false,
        }
    }

    /// Publisher of the transformed items
    pub fn output(&self) -> Publisher<T::Output> {
        self.output.clone()
    }

    fn flush(&mut self) {
        if !self.scratch.is_empty() {
            self.output.offer_all(self.scratch.drain(..));
        }
    }

    fn terminate(&mut self, result: Result<(), Error>) {
        self.done = true;
        self.upstream.stop();
        self.flush();
        match result {
            Ok(()) => { self.output.complete(); }
            Err(e) => {
                trace!("Pipeline stage failed: {}", e);
                self.output.error(e);
            }
        }
    }
}

impl<T> Sink<T::Input> for Processor<T>
    where T: Transform,
          T::Output: 'static,
{
    fn on_subscribe(&mut self, subscription: Subscription) {
        *self.upstream.subscription.borrow_mut() = Some(subscription);
        if self.output.status().wants_more() {
            self.upstream.pull();
        }
    }
    fn on_next(&mut self, item: T::Input) {
        self.upstream.outstanding.set(false);
        if self.done {
            return;
        }
        match self.transform.transform(item, &mut self.scratch) {
            Ok(()) if self.transform.is_done() => self.terminate(Ok(())),
            Ok(()) => {
                self.flush();
                if self.output.status().wants_more() {
                    self.upstream.pull();
                }
            }
            Err(e) => self.terminate(Err(e)),
        }
    }
    fn on_error(&mut self, error: Error) {
        if self.done {
            return;
        }
        let result = self.transform.fail(error, &mut self.scratch);
        self.terminate(result);
    }
    fn on_complete(&mut self) {
        if self.done {
            return;
        }
        let result = self.transform.finish(&mut self.scratch);
        self.terminate(result);
    }
}

impl<I: 'static> Publisher<I> {
    /// Subscribes a new stage to this publisher and returns its output
    pub fn pipe<T>(&self, transform: T) -> Publisher<T::Output>
        where T: Transform<Input=I> + 'static,
              T::Output: 'static,
    {
        let processor = Processor::new(transform);
        let output = processor.output();
        self.subscribe(processor);
        output
    }
}
