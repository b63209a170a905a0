//! Await bridge
//!
//! The only way an operator body suspends: resolve a value to a promise and
//! attach the continuation as its reaction.

use super::completion::Completion;
use crate::error::{Error, Result};
use crate::runtime::{Promise, Runtime, Value};

/// `Await(value)`: run `resume` with the settlement in a later microtask
pub fn await_value(runtime: &Runtime, value: Value, resume: impl FnOnce(Completion) + 'static) {
    let promise = Promise::promise_resolve(runtime.event_loop(), value);
    promise.subscribe(move |result| resume(Completion::from_result(result)));
}

/// `PromiseResolve(value).then(on_fulfilled, on_rejected)`, returning the
/// derived promise
pub fn await_bridge(
    runtime: &Runtime,
    value: Value,
    on_fulfilled: impl FnOnce(Value) -> Result<Value> + 'static,
    on_rejected: impl FnOnce(Error) -> Result<Value> + 'static,
) -> Promise {
    Promise::promise_resolve(runtime.event_loop(), value).then(on_fulfilled, on_rejected)
}
