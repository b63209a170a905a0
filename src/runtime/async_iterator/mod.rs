//! Async iterator helpers
//!
//! Entry points for `map`, `filter`, `take`, `drop`, `flatMap`, `indexed`,
//! `reduce`, `toArray`, `forEach`, `some`, `every`, `find` and
//! `AsyncIterator.from`. Arguments are validated synchronously; all source
//! access happens later on the event loop.

pub mod args;
pub mod bridge;
pub mod close;
pub mod completion;
pub mod generator;
pub mod helpers;
pub mod reducers;
pub mod wrap;

pub use args::{CombinatorArgs, OperatorArgs};
pub use completion::{Completion, Resume, StepOutcome};
pub use generator::{AsyncGeneratorRequest, AsyncIteratorHelper, GeneratorState};
pub use reducers::ReducerTask;
pub use wrap::from;

use crate::error::{messages, Error, Result};
use crate::runtime::iterator::get_iterator_direct;
use crate::runtime::{Promise, Runtime, Value};

// ---------------------------------------------------------------------------
// Argument validation
// ---------------------------------------------------------------------------

fn require_callable(value: &Value) -> Result<Value> {
    if value.is_callable() {
        Ok(value.clone())
    } else {
        Err(Error::type_error(messages::not_a_function(&value.to_js_string())))
    }
}

/// Validate a take/drop limit: ToNumber, reject NaN, then
/// ToIntegerOrInfinity and reject negatives
fn validate_limit(limit: &Value) -> Result<f64> {
    if limit.to_number().is_nan() {
        return Err(Error::range_error(messages::NAN_NOT_ALLOWED));
    }
    let integer = limit.to_integer_or_infinity();
    if integer < 0.0 {
        return Err(Error::range_error(messages::NEGATIVE_INDEX));
    }
    Ok(integer)
}

fn receiver(this: &Value) -> Result<()> {
    if this.is_object() {
        Ok(())
    } else {
        Err(Error::type_error(messages::not_an_object(&this.to_js_string())))
    }
}

fn helper(runtime: &Runtime, this: &Value, operator: OperatorArgs) -> Result<Value> {
    let iterated = get_iterator_direct(this)?;
    let helper = AsyncIteratorHelper::new(runtime, CombinatorArgs::new(iterated, operator));
    Ok(helper.to_value())
}

fn terminal(runtime: &Runtime, this: &Value, operator: OperatorArgs) -> Result<Promise> {
    let iterated = get_iterator_direct(this)?;
    Ok(ReducerTask::start(runtime, CombinatorArgs::new(iterated, operator)))
}

// ---------------------------------------------------------------------------
// Generator-based helpers
// ---------------------------------------------------------------------------

/// `AsyncIterator.prototype.map(mapper)`
pub fn map(runtime: &Runtime, this: &Value, mapper: &Value) -> Result<Value> {
    receiver(this)?;
    let mapper = require_callable(mapper)?;
    helper(runtime, this, OperatorArgs::Map { mapper })
}

/// `AsyncIterator.prototype.filter(filterer)`
pub fn filter(runtime: &Runtime, this: &Value, filterer: &Value) -> Result<Value> {
    receiver(this)?;
    let filterer = require_callable(filterer)?;
    helper(
        runtime,
        this,
        OperatorArgs::Filter {
            filterer,
            pending_value: None,
        },
    )
}

/// `AsyncIterator.prototype.take(limit)`
pub fn take(runtime: &Runtime, this: &Value, limit: &Value) -> Result<Value> {
    receiver(this)?;
    let remaining = validate_limit(limit)?;
    helper(runtime, this, OperatorArgs::Take { remaining })
}

/// `AsyncIterator.prototype.drop(limit)`
pub fn drop(runtime: &Runtime, this: &Value, limit: &Value) -> Result<Value> {
    receiver(this)?;
    let remaining = validate_limit(limit)?;
    helper(runtime, this, OperatorArgs::Drop { remaining })
}

/// `AsyncIterator.prototype.indexed()`
pub fn indexed(runtime: &Runtime, this: &Value) -> Result<Value> {
    receiver(this)?;
    helper(runtime, this, OperatorArgs::Indexed)
}

/// `AsyncIterator.prototype.flatMap(mapper)`
pub fn flat_map(runtime: &Runtime, this: &Value, mapper: &Value) -> Result<Value> {
    receiver(this)?;
    let mapper = require_callable(mapper)?;
    helper(runtime, this, OperatorArgs::FlatMap { mapper, inner: None })
}

// ---------------------------------------------------------------------------
// Terminal combinators
// ---------------------------------------------------------------------------

/// `AsyncIterator.prototype.reduce(reducer, initialValue?)`
pub fn reduce(runtime: &Runtime, this: &Value, reducer: &Value, initial: Option<Value>) -> Result<Promise> {
    receiver(this)?;
    let reducer = require_callable(reducer)?;
    terminal(
        runtime,
        this,
        OperatorArgs::Reduce {
            reducer,
            accumulator: initial,
        },
    )
}

/// `AsyncIterator.prototype.toArray()`
pub fn to_array(runtime: &Runtime, this: &Value) -> Result<Promise> {
    receiver(this)?;
    terminal(runtime, this, OperatorArgs::ToArray { results: Vec::new() })
}

/// `AsyncIterator.prototype.forEach(fn)`
pub fn for_each(runtime: &Runtime, this: &Value, callback: &Value) -> Result<Promise> {
    receiver(this)?;
    let callback = require_callable(callback)?;
    terminal(runtime, this, OperatorArgs::ForEach { callback, pending_value: None })
}

/// `AsyncIterator.prototype.some(predicate)`
pub fn some(runtime: &Runtime, this: &Value, predicate: &Value) -> Result<Promise> {
    receiver(this)?;
    let predicate = require_callable(predicate)?;
    terminal(runtime, this, OperatorArgs::Some { predicate, pending_value: None })
}

/// `AsyncIterator.prototype.every(predicate)`
pub fn every(runtime: &Runtime, this: &Value, predicate: &Value) -> Result<Promise> {
    receiver(this)?;
    let predicate = require_callable(predicate)?;
    terminal(runtime, this, OperatorArgs::Every { predicate, pending_value: None })
}

/// `AsyncIterator.prototype.find(predicate)`
pub fn find(runtime: &Runtime, this: &Value, predicate: &Value) -> Result<Promise> {
    receiver(this)?;
    let predicate = require_callable(predicate)?;
    terminal(
        runtime,
        this,
        OperatorArgs::Find {
            predicate,
            pending_value: None,
        },
    )
}

// ---------------------------------------------------------------------------
// Chaining wrapper
// ---------------------------------------------------------------------------

/// An async iterator value bound to a runtime, with the helpers as methods
///
/// ```ignore
/// let rt = Runtime::new();
/// let doubled = rt.from(&values)?.map(&double)?.take(&Value::from(2))?;
/// let array = rt.block_on(&doubled.to_array()?)?;
/// ```
#[derive(Clone)]
pub struct AsyncIterator {
    runtime: Runtime,
    value: Value,
}

impl std::fmt::Debug for AsyncIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncIterator")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl AsyncIterator {
    /// Bind an existing async iterator object
    pub fn new(runtime: &Runtime, value: Value) -> Self {
        Self {
            runtime: runtime.clone(),
            value,
        }
    }

    /// `AsyncIterator.from(value)`
    pub fn from(runtime: &Runtime, value: &Value) -> Result<Self> {
        Ok(Self::new(runtime, from(runtime, value)?))
    }

    /// The underlying iterator object
    pub fn value(&self) -> &Value {
        &self.value
    }

    fn chain(&self, value: Result<Value>) -> Result<Self> {
        value.map(|value| Self::new(&self.runtime, value))
    }

    pub fn map(&self, mapper: &Value) -> Result<Self> {
        self.chain(map(&self.runtime, &self.value, mapper))
    }

    pub fn filter(&self, filterer: &Value) -> Result<Self> {
        self.chain(filter(&self.runtime, &self.value, filterer))
    }

    pub fn take(&self, limit: &Value) -> Result<Self> {
        self.chain(take(&self.runtime, &self.value, limit))
    }

    pub fn drop(&self, limit: &Value) -> Result<Self> {
        self.chain(drop(&self.runtime, &self.value, limit))
    }

    pub fn indexed(&self) -> Result<Self> {
        self.chain(indexed(&self.runtime, &self.value))
    }

    pub fn flat_map(&self, mapper: &Value) -> Result<Self> {
        self.chain(flat_map(&self.runtime, &self.value, mapper))
    }

    pub fn reduce(&self, reducer: &Value, initial: Option<Value>) -> Result<Promise> {
        reduce(&self.runtime, &self.value, reducer, initial)
    }

    pub fn to_array(&self) -> Result<Promise> {
        to_array(&self.runtime, &self.value)
    }

    pub fn for_each(&self, callback: &Value) -> Result<Promise> {
        for_each(&self.runtime, &self.value, callback)
    }

    pub fn some(&self, predicate: &Value) -> Result<Promise> {
        some(&self.runtime, &self.value, predicate)
    }

    pub fn every(&self, predicate: &Value) -> Result<Promise> {
        every(&self.runtime, &self.value, predicate)
    }

    pub fn find(&self, predicate: &Value) -> Result<Promise> {
        find(&self.runtime, &self.value, predicate)
    }

    /// Call the iterator's `next()` and return its result as a promise
    pub fn next(&self) -> Result<Promise> {
        self.call_method("next", &[])
    }

    /// Call the iterator's `return(value)`
    pub fn return_(&self, value: Value) -> Result<Promise> {
        self.call_method("return", &[value])
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Promise> {
        let method = self.value.get_property(name);
        if !method.is_callable() {
            return Err(Error::type_error(messages::not_a_function(name)));
        }
        let result = method.call(args)?;
        Ok(Promise::promise_resolve(self.runtime.event_loop(), result))
    }
}
