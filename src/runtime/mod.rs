//! Runtime environment for asynciter
//!
//! This module provides the execution environment the helpers run in: the
//! value model, promises, the iterator protocol and the event loop handle.

pub mod async_iterator;
pub mod iterator;
mod promise;
pub mod value;

pub use async_iterator::{AsyncIterator, AsyncIteratorHelper};
pub use iterator::IteratorRecord;
pub use promise::{Promise, PromiseState};
pub use value::{NativeFn, Object, ObjectKind, Value};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::event_loop::{EventLoop, EventLoopStats, RunResult};
use std::rc::Rc;

/// The asynciter runtime
///
/// Cloning is cheap; clones share the event loop and configuration.
#[derive(Clone)]
pub struct Runtime {
    event_loop: EventLoop,
    config: Rc<EngineConfig>,
}

impl Runtime {
    /// Create a new runtime with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new runtime with the given configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            event_loop: EventLoop::with_budget(config.max_microtasks_per_tick),
            config: Rc::new(config),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The event loop promises schedule their reactions on
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Create a pending promise
    pub fn new_promise(&self) -> Promise {
        Promise::new(&self.event_loop)
    }

    /// `Promise.resolve(value)`
    pub fn promise_resolve(&self, value: Value) -> Promise {
        Promise::promise_resolve(&self.event_loop, value)
    }

    /// Create a rejected promise
    pub fn rejected(&self, reason: Error) -> Promise {
        Promise::rejected(&self.event_loop, reason)
    }

    /// Run microtasks until the queue is empty
    pub fn run_until_idle(&self) -> RunResult {
        self.event_loop.run_until_idle()
    }

    /// Drain the event loop and return the settlement of `promise`
    pub fn block_on(&self, promise: &Promise) -> Result<Value> {
        self.run_until_idle();
        match promise.state() {
            PromiseState::Fulfilled(value) => Ok(value),
            PromiseState::Rejected(reason) => Err(reason),
            PromiseState::Pending => Err(Error::InternalError(
                "promise still pending after the microtask queue drained".to_string(),
            )),
        }
    }

    /// Bind an async iterator object to this runtime
    pub fn async_iterator(&self, value: Value) -> AsyncIterator {
        AsyncIterator::new(self, value)
    }

    /// `AsyncIterator.from(value)`
    pub fn from(&self, value: &Value) -> Result<AsyncIterator> {
        AsyncIterator::from(self, value)
    }

    /// Event loop statistics
    pub fn stats(&self) -> EventLoopStats {
        self.event_loop.stats()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
