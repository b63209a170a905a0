//! Wrappers that adapt other iterators to the async iterator protocol
//!
//! - `AsyncIterator.from(value)`
//! - the async-from-sync iterator used for arrays and `@@iterator` objects

use super::bridge::await_bridge;
use crate::error::{messages, Error, Result};
use crate::runtime::iterator::{
    async_iterator_close, check_iter_result, create_array_iterator, create_iter_result,
    get_iterator_direct, get_iterator_flattenable, iterator_complete, iterator_next, iterator_value,
    IteratorRecord,
};
use crate::runtime::value::SYMBOL_ASYNC_ITERATOR;
use crate::runtime::{Promise, Runtime, Value};
use std::rc::Rc;
use tracing::{debug, warn};

/// `AsyncIterator.from(value)`
///
/// Helper objects are returned unchanged. Strings iterate their characters.
/// Everything else goes through GetIteratorFlattenable and is wrapped in an
/// object whose `next` forwards to the underlying iterator.
pub fn from(runtime: &Runtime, value: &Value) -> Result<Value> {
    if value.as_async_iterator_helper().is_some() {
        return Ok(value.clone());
    }
    let record = match value {
        Value::String(s) => {
            let chars = s.chars().map(|c| Value::String(c.to_string())).collect();
            let sync_record = get_iterator_direct(&create_array_iterator(chars))?;
            get_iterator_direct(&create_async_from_sync_iterator(runtime, sync_record))?
        }
        _ => get_iterator_flattenable(runtime, value)?,
    };
    if record.iterator.as_async_iterator_helper().is_some() {
        return Ok(record.iterator);
    }
    debug!("wrapping iterator for AsyncIterator.from");
    Ok(create_wrapped_iterator(runtime, record))
}

/// Build the wrapper object returned by `AsyncIterator.from`
fn create_wrapped_iterator(runtime: &Runtime, record: IteratorRecord) -> Value {
    let record = Rc::new(record);
    let wrapper = Value::new_object();

    let rt = runtime.clone();
    let next_record = record.clone();
    wrapper.set_property(
        "next",
        Value::native_function("next", move |_args| {
            let promise = match iterator_next(&next_record, None) {
                Ok(result) => Promise::resolved(rt.event_loop(), result),
                Err(err) => Promise::rejected(rt.event_loop(), err),
            };
            Ok(promise.to_value())
        }),
    );

    let rt = runtime.clone();
    wrapper.set_property(
        "return",
        Value::native_function("return", move |_args| {
            let promise = match async_iterator_close(&record) {
                Ok(None) => Promise::resolved(rt.event_loop(), create_iter_result(Value::Undefined, true)),
                Ok(Some(result)) => await_bridge(&rt, result, check_iter_result, Err),
                Err(err) => Promise::rejected(rt.event_loop(), err),
            };
            Ok(promise.to_value())
        }),
    );

    set_self_iterator(&wrapper);
    wrapper
}

/// CreateAsyncFromSyncIterator
///
/// `next` and `return` forward to the sync iterator and await the value of
/// each result before resolving `{ value, done }`.
pub fn create_async_from_sync_iterator(runtime: &Runtime, sync: IteratorRecord) -> Value {
    let sync = Rc::new(sync);
    let wrapper = Value::new_object();

    let rt = runtime.clone();
    let next_sync = sync.clone();
    wrapper.set_property(
        "next",
        Value::native_function("next", move |args| {
            let result = iterator_next(&next_sync, args.first().cloned());
            Ok(continue_sync_result(&rt, &next_sync, result, true).to_value())
        }),
    );

    let rt = runtime.clone();
    wrapper.set_property(
        "return",
        Value::native_function("return", move |args| {
            let value = args.first().cloned().unwrap_or(Value::Undefined);
            let method = sync.iterator.get_property("return");
            if method.is_nullish() {
                return Ok(Promise::resolved(rt.event_loop(), create_iter_result(value, true)).to_value());
            }
            if !method.is_callable() {
                return Ok(Promise::rejected(
                    rt.event_loop(),
                    Error::type_error(messages::not_a_function("return")),
                )
                .to_value());
            }
            let result = method.call(&[value]);
            Ok(continue_sync_result(&rt, &sync, result, false).to_value())
        }),
    );

    set_self_iterator(&wrapper);
    wrapper
}

/// AsyncFromSyncIteratorContinuation
fn continue_sync_result(
    runtime: &Runtime,
    sync: &Rc<IteratorRecord>,
    result: Result<Value>,
    close_on_rejection: bool,
) -> Promise {
    let result = match result.and_then(check_iter_result) {
        Ok(result) => result,
        Err(err) => return Promise::rejected(runtime.event_loop(), err),
    };
    let done = iterator_complete(&result);
    let value = iterator_value(&result);
    let sync = sync.clone();
    await_bridge(
        runtime,
        value,
        move |value| Ok(create_iter_result(value, done)),
        move |err| {
            // A rejected value ends the iteration: close the sync iterator
            if close_on_rejection && !done {
                if let Err(close_err) = async_iterator_close(&sync) {
                    warn!(
                        original = %err,
                        suppressed = %close_err,
                        "close failed while propagating an error; keeping the original"
                    );
                }
            }
            Err(err)
        },
    )
}

/// `obj[@@asyncIterator]()` returns `obj`
fn set_self_iterator(object: &Value) {
    if let Value::Object(rc) = object {
        let this = Rc::downgrade(rc);
        object.set_property(
            SYMBOL_ASYNC_ITERATOR,
            Value::native_function("[Symbol.asyncIterator]", move |_| {
                Ok(this.upgrade().map(Value::Object).unwrap_or(Value::Undefined))
            }),
        );
    }
}
