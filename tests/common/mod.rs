//! Shared test helpers for integration tests
#![allow(dead_code)]

use asynciter::prelude::*;
use asynciter::runtime::iterator::{iterator_complete, iterator_value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// How the scripted source answers `return()`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ReturnBehavior {
    /// Resolves `{ value: undefined, done: true }`
    #[default]
    Ok,
    /// No `return` method at all
    Missing,
    /// `return()` throws
    Throws,
    /// `return()` resolves a non-object
    NonObject,
}

/// A scripted async source that counts protocol calls
pub struct CountingSource {
    pub value: Value,
    pub next_calls: Rc<Cell<usize>>,
    pub return_calls: Rc<Cell<usize>>,
}

impl CountingSource {
    pub fn next_calls(&self) -> usize {
        self.next_calls.get()
    }

    pub fn return_calls(&self) -> usize {
        self.return_calls.get()
    }
}

/// Builder for [`CountingSource`]
pub struct SourceBuilder {
    runtime: Runtime,
    values: Vec<Value>,
    sync_results: bool,
    fail_next_at: Option<usize>,
    return_behavior: ReturnBehavior,
}

pub fn source(runtime: &Runtime, values: Vec<Value>) -> SourceBuilder {
    SourceBuilder {
        runtime: runtime.clone(),
        values,
        sync_results: false,
        fail_next_at: None,
        return_behavior: ReturnBehavior::Ok,
    }
}

impl SourceBuilder {
    /// Return plain result objects from `next()` instead of promises
    pub fn sync_results(mut self) -> Self {
        self.sync_results = true;
        self
    }

    /// The `n`th call to `next()` (zero-based) throws `Error: source failed`
    pub fn fail_next_at(mut self, n: usize) -> Self {
        self.fail_next_at = Some(n);
        self
    }

    pub fn on_return(mut self, behavior: ReturnBehavior) -> Self {
        self.return_behavior = behavior;
        self
    }

    pub fn build(self) -> CountingSource {
        let next_calls = Rc::new(Cell::new(0));
        let return_calls = Rc::new(Cell::new(0));
        let object = Value::new_object();

        let runtime = self.runtime.clone();
        let values = self.values;
        let calls = next_calls.clone();
        let fail_at = self.fail_next_at;
        let sync_results = self.sync_results;
        object.set_property(
            "next",
            Value::native_function("next", move |_| {
                let n = calls.get();
                calls.set(n + 1);
                if fail_at == Some(n) {
                    return Err(Error::generic("source failed"));
                }
                let result = match values.get(n) {
                    Some(value) => create_iter_result(value.clone(), false),
                    None => create_iter_result(Value::Undefined, true),
                };
                if sync_results {
                    Ok(result)
                } else {
                    Ok(runtime.promise_resolve(result).to_value())
                }
            }),
        );

        let runtime = self.runtime.clone();
        let calls = return_calls.clone();
        let behavior = self.return_behavior;
        if behavior != ReturnBehavior::Missing {
            object.set_property(
                "return",
                Value::native_function("return", move |_| {
                    calls.set(calls.get() + 1);
                    match behavior {
                        ReturnBehavior::Throws => Err(Error::generic("return failed")),
                        ReturnBehavior::NonObject => Ok(runtime.promise_resolve(Value::from(42)).to_value()),
                        _ => Ok(runtime
                            .promise_resolve(create_iter_result(Value::Undefined, true))
                            .to_value()),
                    }
                }),
            );
        }

        CountingSource {
            value: object,
            next_calls,
            return_calls,
        }
    }
}

/// Numbers as values
pub fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().map(|&n| Value::Number(n)).collect()
}

/// First argument, or undefined
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

/// A native function from a closure over the first argument
pub fn func(name: &str, f: impl Fn(Value) -> asynciter::Result<Value> + 'static) -> Value {
    Value::native_function(name, move |args| f(arg(args, 0)))
}

/// A native function that records every argument list it was called with
pub fn recording(name: &str, result: Value) -> (Value, Rc<RefCell<Vec<Vec<Value>>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let log = calls.clone();
    let value = Value::native_function(name, move |args| {
        log.borrow_mut().push(args.to_vec());
        Ok(result.clone())
    });
    (value, calls)
}

/// Resolve a helper result promise into `(value, done)`
pub fn settled_result(runtime: &Runtime, promise: &Promise) -> (Value, bool) {
    let result = runtime.block_on(promise).expect("promise rejected");
    (iterator_value(&result), iterator_complete(&result))
}

/// Drain a helper through `toArray`
pub fn collect(runtime: &Runtime, iterator: &AsyncIterator) -> asynciter::Result<Vec<Value>> {
    let promise = iterator.to_array()?;
    let array = runtime.block_on(&promise)?;
    Ok(array.array_elements().unwrap_or_default())
}
