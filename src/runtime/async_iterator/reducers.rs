//! Terminal combinators: reduce, toArray, forEach, some, every, find
//!
//! These bodies never yield. A [`ReducerTask`] drives the continuations and
//! settles one result promise when the body completes.

use super::args::CombinatorArgs;
use super::bridge::await_value;
use super::close::begin_close;
use super::completion::{Completion, Resume, StepOutcome};
use super::helpers::{call_callback, mismatch, pull, source_value};
use crate::error::{messages, Error};
use crate::runtime::{Promise, Runtime, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Drives one terminal combinator to completion
#[derive(Clone)]
pub struct ReducerTask {
    inner: Rc<ReducerInner>,
}

struct ReducerInner {
    runtime: Runtime,
    args: RefCell<CombinatorArgs>,
    capability: Promise,
}

impl ReducerTask {
    /// Start the body and return the promise for its result
    pub fn start(runtime: &Runtime, args: CombinatorArgs) -> Promise {
        let capability = Promise::new(runtime.event_loop());
        let start = args.operator.start();
        debug!(operator = args.operator.name(), "starting terminal combinator");
        let task = ReducerTask {
            inner: Rc::new(ReducerInner {
                runtime: runtime.clone(),
                args: RefCell::new(args),
                capability: capability.clone(),
            }),
        };
        task.resume(start, Completion::Normal(Value::Undefined));
        capability
    }

    fn resume(&self, resume: Resume, completion: Completion) {
        trace!(?resume, completion = completion.kind_name(), "terminal combinator resumed");
        let outcome = {
            let mut args = self.inner.args.borrow_mut();
            (resume.continuation())(&self.inner.runtime, &mut args, completion)
        };
        self.drive(outcome);
    }

    fn drive(&self, mut outcome: StepOutcome) {
        loop {
            match outcome {
                StepOutcome::Await { value, resume } => {
                    let task = self.clone();
                    await_value(&self.inner.runtime, value, move |completion| {
                        task.resume(resume, completion)
                    });
                    return;
                }
                StepOutcome::Close(completion) => {
                    let mut args = self.inner.args.borrow_mut();
                    outcome = begin_close(&self.inner.runtime, &mut args, completion);
                }
                StepOutcome::Complete(completion) => {
                    debug!(
                        operator = self.inner.args.borrow().operator.name(),
                        completion = completion.kind_name(),
                        "terminal combinator completed"
                    );
                    self.inner.capability.settle_with(completion.into_result());
                    return;
                }
                StepOutcome::Yield(_) => {
                    self.inner.capability.reject(Error::InternalError(
                        "terminal combinator attempted to yield".to_string(),
                    ));
                    return;
                }
            }
        }
    }
}

fn done(value: Value) -> StepOutcome {
    StepOutcome::Complete(Completion::Normal(value))
}

fn index_value(index: u64) -> Value {
    Value::Number(index as f64)
}

// ---------------------------------------------------------------------------
// reduce
// ---------------------------------------------------------------------------

pub fn reduce_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    let has_initial = match args.accumulator_mut() {
        Some(slot) => slot.is_some(),
        None => return mismatch(args, Resume::ReduceStart),
    };
    if has_initial {
        pull(runtime, args, Resume::ReduceWithResult)
    } else {
        pull(runtime, args, Resume::ReduceInitial)
    }
}

/// First source value becomes the accumulator when no initial value was given
pub fn reduce_initial(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match source_value(runtime, args, completion) {
        Ok(Some(value)) => value,
        // The source is exhausted, so there is nothing to close
        Ok(None) => {
            return StepOutcome::Complete(Completion::Throw(Error::type_error(messages::REDUCE_EMPTY)))
        }
        Err(outcome) => return outcome,
    };
    match args.accumulator_mut() {
        Some(slot) => *slot = Some(value),
        None => return mismatch(args, Resume::ReduceInitial),
    }
    args.counter = 1;
    pull(runtime, args, Resume::ReduceWithResult)
}

pub fn reduce_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match source_value(runtime, args, completion) {
        Ok(Some(value)) => value,
        Ok(None) => {
            return match args.accumulator_mut() {
                Some(slot) => done(slot.take().unwrap_or(Value::Undefined)),
                None => mismatch(args, Resume::ReduceWithResult),
            }
        }
        Err(outcome) => return outcome,
    };
    let accumulator = match args.accumulator_mut() {
        Some(slot) => slot.clone().unwrap_or(Value::Undefined),
        None => return mismatch(args, Resume::ReduceWithResult),
    };
    let index = args.next_index();
    call_callback(args, &[accumulator, value, index_value(index)], Resume::ReduceWithValue)
}

pub fn reduce_with_value(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let result = match completion.into_result() {
        Ok(result) => result,
        Err(err) => return StepOutcome::Close(Completion::Throw(err)),
    };
    match args.accumulator_mut() {
        Some(slot) => *slot = Some(result),
        None => return mismatch(args, Resume::ReduceWithValue),
    }
    pull(runtime, args, Resume::ReduceWithResult)
}

// ---------------------------------------------------------------------------
// toArray
// ---------------------------------------------------------------------------

pub fn to_array_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::ToArrayWithResult)
}

pub fn to_array_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = source_value(runtime, args, completion);
    let results = match args.results_mut() {
        Some(results) => results,
        None => return mismatch(args, Resume::ToArrayWithResult),
    };
    match value {
        Ok(Some(value)) => {
            results.push(value);
            pull(runtime, args, Resume::ToArrayWithResult)
        }
        Ok(None) => done(Value::new_array(std::mem::take(results))),
        Err(outcome) => outcome,
    }
}

// ---------------------------------------------------------------------------
// forEach / some / every / find
// ---------------------------------------------------------------------------

/// Hold `value` in the pending slot, then call the callback with it
fn call_holding(args: &mut CombinatorArgs, value: Value, at: Resume, resume: Resume) -> StepOutcome {
    match args.pending_value_mut() {
        Some(slot) => *slot = Some(value.clone()),
        None => return mismatch(args, at),
    }
    let index = args.next_index();
    call_callback(args, &[value, index_value(index)], resume)
}

/// Release the value held while the callback result was awaited
fn release_pending(args: &mut CombinatorArgs, at: Resume) -> Result<Value, StepOutcome> {
    match args.pending_value_mut() {
        Some(slot) => Ok(slot.take().unwrap_or(Value::Undefined)),
        None => Err(mismatch(args, at)),
    }
}

pub fn for_each_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::ForEachWithResult)
}

pub fn for_each_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(value)) => call_holding(args, value, Resume::ForEachWithResult, Resume::ForEachWithValue),
        Ok(None) => done(Value::Undefined),
        Err(outcome) => outcome,
    }
}

pub fn for_each_with_value(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    if let Err(outcome) = release_pending(args, Resume::ForEachWithValue) {
        return outcome;
    }
    match completion.into_result() {
        Ok(_) => pull(runtime, args, Resume::ForEachWithResult),
        Err(err) => StepOutcome::Close(Completion::Throw(err)),
    }
}

pub fn some_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::SomeWithResult)
}

pub fn some_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(value)) => call_holding(args, value, Resume::SomeWithResult, Resume::SomeWithValue),
        Ok(None) => done(Value::Boolean(false)),
        Err(outcome) => outcome,
    }
}

pub fn some_with_value(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match release_pending(args, Resume::SomeWithValue) {
        Ok(value) => value,
        Err(outcome) => return outcome,
    };
    match completion.into_result() {
        Ok(verdict) if verdict.to_boolean() => {
            trace!(value = %value.to_js_string(), "some: predicate matched");
            StepOutcome::Close(Completion::Normal(Value::Boolean(true)))
        }
        Ok(_) => pull(runtime, args, Resume::SomeWithResult),
        Err(err) => StepOutcome::Close(Completion::Throw(err)),
    }
}

pub fn every_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::EveryWithResult)
}

pub fn every_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(value)) => call_holding(args, value, Resume::EveryWithResult, Resume::EveryWithValue),
        Ok(None) => done(Value::Boolean(true)),
        Err(outcome) => outcome,
    }
}

pub fn every_with_value(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match release_pending(args, Resume::EveryWithValue) {
        Ok(value) => value,
        Err(outcome) => return outcome,
    };
    match completion.into_result() {
        Ok(verdict) if !verdict.to_boolean() => {
            trace!(value = %value.to_js_string(), "every: predicate failed");
            StepOutcome::Close(Completion::Normal(Value::Boolean(false)))
        }
        Ok(_) => pull(runtime, args, Resume::EveryWithResult),
        Err(err) => StepOutcome::Close(Completion::Throw(err)),
    }
}

pub fn find_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::FindWithResult)
}

pub fn find_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(value)) => call_holding(args, value, Resume::FindWithResult, Resume::FindWithValue),
        Ok(None) => done(Value::Undefined),
        Err(outcome) => outcome,
    }
}

pub fn find_with_value(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match release_pending(args, Resume::FindWithValue) {
        Ok(value) => value,
        Err(outcome) => return outcome,
    };
    match completion.into_result() {
        Ok(verdict) if verdict.to_boolean() => StepOutcome::Close(Completion::Normal(value)),
        Ok(_) => pull(runtime, args, Resume::FindWithResult),
        Err(err) => StepOutcome::Close(Completion::Throw(err)),
    }
}
