//! Iterator Protocol Implementation
//!
//! Implements the pieces of the ES iterator protocols the helpers consume:
//! - IteratorRecord { iterator, next, done }
//! - IteratorResult { value, done }
//! - GetIteratorDirect / GetIteratorFlattenable
//! - AsyncIteratorClose (the synchronous half: calling `return`)
//! - array iterators for `@@iterator` on arrays

use super::value::{Value, SYMBOL_ASYNC_ITERATOR, SYMBOL_ITERATOR};
use crate::error::{messages, Error, Result};
use crate::runtime::async_iterator::wrap::create_async_from_sync_iterator;
use crate::runtime::Runtime;
use rustc_hash::FxHashMap;
use std::cell::Cell;
use std::rc::Rc;

/// An iterator handle together with its cached `next` method
#[derive(Debug, Clone)]
pub struct IteratorRecord {
    /// The iterator object
    pub iterator: Value,
    /// `iterator.next`, read once when the record is created
    pub next_method: Value,
    /// Set on exhaustion and after close
    pub done: Cell<bool>,
}

impl IteratorRecord {
    /// Create a record from an iterator and its next method
    pub fn new(iterator: Value, next_method: Value) -> Self {
        Self {
            iterator,
            next_method,
            done: Cell::new(false),
        }
    }

    /// Check if the iterator is finished (exhausted or closed)
    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    /// Mark the iterator finished
    pub fn mark_done(&self) {
        self.done.set(true);
    }
}

/// Create an IteratorResult object { value, done }
pub fn create_iter_result(value: Value, done: bool) -> Value {
    let mut props = FxHashMap::default();
    props.insert("value".to_string(), value);
    props.insert("done".to_string(), Value::Boolean(done));
    Value::new_object_with_properties(props)
}

/// GetIteratorDirect: wrap an object that is itself an iterator
pub fn get_iterator_direct(value: &Value) -> Result<IteratorRecord> {
    if !value.is_object() {
        return Err(Error::type_error(messages::not_an_object(&value.to_js_string())));
    }
    Ok(IteratorRecord::new(value.clone(), value.get_property("next")))
}

/// GetIteratorFlattenable (async): accept async iterables, sync iterables and
/// plain iterator objects. Primitives, strings included, are rejected.
pub fn get_iterator_flattenable(runtime: &Runtime, value: &Value) -> Result<IteratorRecord> {
    if !value.is_object() {
        return Err(Error::type_error(messages::not_iterable(&value.to_js_string())));
    }

    let async_method = value.get_property(SYMBOL_ASYNC_ITERATOR);
    if !async_method.is_nullish() {
        let iterator = call_iterator_method(&async_method, SYMBOL_ASYNC_ITERATOR)?;
        return get_iterator_direct(&iterator);
    }

    if let Some(sync_iterator) = get_sync_iterator(value)? {
        let sync_record = get_iterator_direct(&sync_iterator)?;
        let wrapped = create_async_from_sync_iterator(runtime, sync_record);
        return get_iterator_direct(&wrapped);
    }

    get_iterator_direct(value)
}

/// Obtain a synchronous iterator from `@@iterator` or an array, if any
pub fn get_sync_iterator(value: &Value) -> Result<Option<Value>> {
    let method = value.get_property(SYMBOL_ITERATOR);
    if !method.is_nullish() {
        return call_iterator_method(&method, SYMBOL_ITERATOR).map(Some);
    }
    Ok(value.array_elements().map(create_array_iterator))
}

fn call_iterator_method(method: &Value, name: &str) -> Result<Value> {
    if !method.is_callable() {
        return Err(Error::type_error(messages::not_a_function(name)));
    }
    let iterator = method.call(&[])?;
    if !iterator.is_object() {
        return Err(Error::type_error(messages::not_an_object(&iterator.to_js_string())));
    }
    Ok(iterator)
}

/// Call `next` on the record, passing `value` when given
pub fn iterator_next(record: &IteratorRecord, value: Option<Value>) -> Result<Value> {
    if !record.next_method.is_callable() {
        return Err(Error::type_error(messages::not_a_function("next")));
    }
    match value {
        Some(value) => record.next_method.call(&[value]),
        None => record.next_method.call(&[]),
    }
}

/// Ensure a settled `next` result is an object
pub fn check_iter_result(result: Value) -> Result<Value> {
    if result.is_object() {
        Ok(result)
    } else {
        Err(Error::type_error(messages::iter_result_not_an_object(
            &result.to_js_string(),
        )))
    }
}

/// IteratorComplete: `ToBoolean(result.done)`
pub fn iterator_complete(result: &Value) -> bool {
    result.get_property("done").to_boolean()
}

/// IteratorValue: `result.value`
pub fn iterator_value(result: &Value) -> Value {
    result.get_property("value")
}

/// Look up and call the iterator's `return` method.
///
/// `Ok(None)` means the iterator has no `return` and there is nothing to
/// await; otherwise the raw call result is returned for the caller to await.
pub fn async_iterator_close(record: &IteratorRecord) -> Result<Option<Value>> {
    let method = record.iterator.get_property("return");
    if method.is_nullish() {
        return Ok(None);
    }
    if !method.is_callable() {
        return Err(Error::type_error(messages::not_a_function("return")));
    }
    method.call(&[]).map(Some)
}

/// Create a synchronous iterator over a snapshot of array elements
pub fn create_array_iterator(elements: Vec<Value>) -> Value {
    let index = Rc::new(Cell::new(0usize));
    let iterator = Value::new_object();
    iterator.set_property(
        "next",
        Value::native_function("next", move |_args| {
            let i = index.get();
            match elements.get(i) {
                Some(value) => {
                    index.set(i + 1);
                    Ok(create_iter_result(value.clone(), false))
                }
                None => {
                    index.set(elements.len());
                    Ok(create_iter_result(Value::Undefined, true))
                }
            }
        }),
    );
    iterator
}
