//! Promise Implementation
//!
//! This module provides a Promise/A+ compliant promise that schedules its
//! reactions on the event loop. Reactions registered on one promise run in
//! registration order, each in its own microtask.

use super::value::{Object, ObjectKind, Value};
use crate::error::{Error, Result};
use crate::event_loop::EventLoop;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// ID counter for promise tracking
static PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// Promise state
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    /// Promise is pending - not yet settled
    Pending,
    /// Promise is fulfilled with a value
    Fulfilled(Value),
    /// Promise is rejected with a reason
    Rejected(Error),
}

/// A reaction receives the settlement of the promise it was attached to
type Reaction = Box<dyn FnOnce(Result<Value>)>;

struct PromiseInner {
    id: u64,
    state: PromiseState,
    reactions: Vec<Reaction>,
    /// Whether a reaction was ever attached (unhandled rejection tracking)
    handled: bool,
    /// Set by the first resolve/reject; later calls are ignored
    already_resolved: bool,
    event_loop: EventLoop,
}

/// A shared handle to a promise
#[derive(Clone)]
pub struct Promise {
    inner: Rc<RefCell<PromiseInner>>,
}

impl Promise {
    /// Create a new pending promise
    pub fn new(event_loop: &EventLoop) -> Self {
        event_loop.record_promise_created();
        Self {
            inner: Rc::new(RefCell::new(PromiseInner {
                id: PROMISE_ID.fetch_add(1, Ordering::SeqCst),
                state: PromiseState::Pending,
                reactions: Vec::new(),
                handled: false,
                already_resolved: false,
                event_loop: event_loop.clone(),
            })),
        }
    }

    /// Create a promise resolved with `value` (adopting it if it is thenable)
    pub fn resolved(event_loop: &EventLoop, value: Value) -> Self {
        let promise = Self::new(event_loop);
        promise.resolve(value);
        promise
    }

    /// Create a rejected promise
    pub fn rejected(event_loop: &EventLoop, reason: Error) -> Self {
        let promise = Self::new(event_loop);
        promise.reject(reason);
        promise
    }

    /// `Promise.resolve(value)`: promises pass through unchanged
    pub fn promise_resolve(event_loop: &EventLoop, value: Value) -> Self {
        match value.as_promise() {
            Some(promise) => promise,
            None => Self::resolved(event_loop, value),
        }
    }

    /// Unique promise id
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state.clone()
    }

    /// Check if the promise is still pending
    pub fn is_pending(&self) -> bool {
        matches!(self.inner.borrow().state, PromiseState::Pending)
    }

    /// The event loop this promise schedules reactions on
    pub fn event_loop(&self) -> EventLoop {
        self.inner.borrow().event_loop.clone()
    }

    /// Check whether two handles refer to the same promise
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Wrap this promise in a JavaScript object value
    pub fn to_value(&self) -> Value {
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::Promise(self.clone())))))
    }

    /// Returns true the first time it is called
    fn take_resolution(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        !std::mem::replace(&mut inner.already_resolved, true)
    }

    /// Resolve the promise. Promises and thenables are adopted through a
    /// resolve-thenable job; anything else fulfills immediately.
    pub fn resolve(&self, value: Value) {
        if self.take_resolution() {
            self.resolve_unchecked(value);
        }
    }

    /// Reject the promise
    pub fn reject(&self, reason: Error) {
        if self.take_resolution() {
            self.settle(Err(reason));
        }
    }

    /// Settle with a `Result`: `Ok` resolves, `Err` rejects
    pub fn settle_with(&self, result: Result<Value>) {
        match result {
            Ok(value) => self.resolve(value),
            Err(reason) => self.reject(reason),
        }
    }

    fn resolve_unchecked(&self, value: Value) {
        if let Some(other) = value.as_promise() {
            if other.ptr_eq(self) {
                self.settle(Err(Error::type_error("Chaining cycle detected for promise")));
                return;
            }
            let this = self.clone();
            self.event_loop().enqueue_microtask("resolve-thenable", move || {
                other.subscribe(move |result| this.settle(result));
            });
            return;
        }

        if !value.is_object() {
            self.settle(Ok(value));
            return;
        }

        let then = value.get_property("then");
        if !then.is_callable() {
            self.settle(Ok(value));
            return;
        }

        let this = self.clone();
        self.event_loop().enqueue_microtask("resolve-thenable", move || {
            let called = Rc::new(Cell::new(false));
            let on_fulfilled = {
                let this = this.clone();
                let called = called.clone();
                Value::native_function("resolve", move |args| {
                    if !called.replace(true) {
                        this.resolve_unchecked(args.first().cloned().unwrap_or(Value::Undefined));
                    }
                    Ok(Value::Undefined)
                })
            };
            let on_rejected = {
                let this = this.clone();
                let called = called.clone();
                Value::native_function("reject", move |args| {
                    if !called.replace(true) {
                        this.settle(Err(Error::Thrown(args.first().cloned().unwrap_or(Value::Undefined))));
                    }
                    Ok(Value::Undefined)
                })
            };
            if let Err(err) = then.call(&[on_fulfilled, on_rejected]) {
                if !called.replace(true) {
                    this.settle(Err(err));
                }
            }
        });
    }

    fn settle(&self, result: Result<Value>) {
        let (reactions, event_loop, id, unhandled) = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.state, PromiseState::Pending) {
                return;
            }
            inner.state = match &result {
                Ok(value) => PromiseState::Fulfilled(value.clone()),
                Err(reason) => PromiseState::Rejected(reason.clone()),
            };
            let reactions = std::mem::take(&mut inner.reactions);
            let unhandled = result.is_err() && !inner.handled;
            (reactions, inner.event_loop.clone(), inner.id, unhandled)
        };

        trace!(promise = id, fulfilled = result.is_ok(), "promise settled");
        event_loop.record_promise_settled();
        if let (true, Err(reason)) = (unhandled, &result) {
            event_loop.track_unhandled_rejection(id, reason.clone());
        }
        for reaction in reactions {
            let result = result.clone();
            event_loop.enqueue_microtask("promise-reaction", move || reaction(result));
        }
    }

    /// Attach a reaction without creating a derived promise.
    ///
    /// If the promise is already settled the reaction is queued right away.
    pub fn subscribe(&self, reaction: impl FnOnce(Result<Value>) + 'static) {
        let (result, was_handled) = {
            let mut inner = self.inner.borrow_mut();
            let was_handled = std::mem::replace(&mut inner.handled, true);
            let result = match &inner.state {
                PromiseState::Pending => None,
                PromiseState::Fulfilled(value) => Some(Ok(value.clone())),
                PromiseState::Rejected(reason) => Some(Err(reason.clone())),
            };
            match result {
                Some(result) => (result, was_handled),
                None => {
                    inner.reactions.push(Box::new(reaction));
                    return;
                }
            }
        };

        let event_loop = self.event_loop();
        if result.is_err() && !was_handled {
            event_loop.mark_rejection_handled(self.id());
        }
        event_loop.enqueue_microtask("promise-reaction", move || reaction(result));
    }

    /// `promise.then(onFulfilled, onRejected)` returning the derived promise
    pub fn then(
        &self,
        on_fulfilled: impl FnOnce(Value) -> Result<Value> + 'static,
        on_rejected: impl FnOnce(Error) -> Result<Value> + 'static,
    ) -> Promise {
        let derived = Promise::new(&self.event_loop());
        let target = derived.clone();
        self.subscribe(move |result| {
            let outcome = match result {
                Ok(value) => on_fulfilled(value),
                Err(reason) => on_rejected(reason),
            };
            target.settle_with(outcome);
        });
        derived
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Promise#{} {{ {:?} }}", self.id(), self.state())
    }
}
