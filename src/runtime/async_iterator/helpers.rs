//! Generator-based helpers: map, filter, take, drop, indexed, flatMap
//!
//! Each operator body is written as a set of continuations. `*_start` is
//! the top of the body's loop and the point a `next()` request resumes at;
//! `*_with_result` receives the settled `next()` result of the source;
//! `*_with_value` receives the settled callback result.

use super::args::CombinatorArgs;
use super::completion::{Completion, Resume, StepOutcome};
use crate::error::{Error, Result};
use crate::runtime::iterator::{
    check_iter_result, get_iterator_flattenable, iterator_complete, iterator_next, iterator_value,
};
use crate::runtime::{Runtime, Value};

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

/// Call the source's `next()` and await the result at `resume`
pub(super) fn pull(runtime: &Runtime, args: &mut CombinatorArgs, resume: Resume) -> StepOutcome {
    match iterator_next(&args.iterated, None) {
        Ok(result) => StepOutcome::Await { value: result, resume },
        Err(err) => source_abrupt(runtime, args, err),
    }
}

/// Unpack a settled `next()` result of the source.
///
/// `Ok(None)` means the source is exhausted (and is now marked done); `Err`
/// carries the outcome to return for a failed source.
pub(super) fn source_value(
    runtime: &Runtime,
    args: &mut CombinatorArgs,
    completion: Completion,
) -> std::result::Result<Option<Value>, StepOutcome> {
    let result = completion
        .into_result()
        .and_then(check_iter_result)
        .map_err(|err| source_abrupt(runtime, args, err))?;
    if iterator_complete(&result) {
        args.iterated.mark_done();
        return Ok(None);
    }
    Ok(Some(iterator_value(&result)))
}

/// The source itself failed: close it first unless configured otherwise
pub(super) fn source_abrupt(runtime: &Runtime, args: &mut CombinatorArgs, err: Error) -> StepOutcome {
    if runtime.config().close_on_source_error {
        StepOutcome::Close(Completion::Throw(err))
    } else {
        args.iterated.mark_done();
        StepOutcome::Complete(Completion::Throw(err))
    }
}

/// Call the operator's callback; the callback's own failure closes the source
pub(super) fn call_callback(args: &mut CombinatorArgs, call_args: &[Value], resume: Resume) -> StepOutcome {
    let result: Result<Value> = match args.operator.callback() {
        Some(callback) => callback.call(call_args),
        None => return mismatch(args, resume),
    };
    match result {
        Ok(value) => StepOutcome::Await { value, resume },
        Err(err) => StepOutcome::Close(Completion::Throw(err)),
    }
}

/// A continuation was dispatched against the wrong operator's args
pub(super) fn mismatch(args: &CombinatorArgs, resume: Resume) -> StepOutcome {
    StepOutcome::Complete(Completion::Throw(Error::InternalError(format!(
        "{} cannot resume at {:?}",
        args.operator.name(),
        resume
    ))))
}

fn index_value(index: u64) -> Value {
    Value::Number(index as f64)
}

// ---------------------------------------------------------------------------
// map
// ---------------------------------------------------------------------------

pub fn map_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::MapWithResult)
}

pub fn map_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match source_value(runtime, args, completion) {
        Ok(Some(value)) => value,
        Ok(None) => return StepOutcome::Complete(Completion::Normal(Value::Undefined)),
        Err(outcome) => return outcome,
    };
    let index = args.next_index();
    call_callback(args, &[value, index_value(index)], Resume::MapWithValue)
}

pub fn map_with_value(_runtime: &Runtime, _args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match completion.into_result() {
        Ok(mapped) => StepOutcome::Yield(mapped),
        Err(err) => StepOutcome::Close(Completion::Throw(err)),
    }
}

// ---------------------------------------------------------------------------
// filter
// ---------------------------------------------------------------------------

pub fn filter_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::FilterWithResult)
}

pub fn filter_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match source_value(runtime, args, completion) {
        Ok(Some(value)) => value,
        Ok(None) => return StepOutcome::Complete(Completion::Normal(Value::Undefined)),
        Err(outcome) => return outcome,
    };
    match args.pending_value_mut() {
        Some(slot) => *slot = Some(value.clone()),
        None => return mismatch(args, Resume::FilterWithResult),
    }
    let index = args.next_index();
    call_callback(args, &[value, index_value(index)], Resume::FilterWithValue)
}

pub fn filter_with_value(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let selected = match completion.into_result() {
        Ok(verdict) => verdict.to_boolean(),
        Err(err) => return StepOutcome::Close(Completion::Throw(err)),
    };
    let value = match args.pending_value_mut() {
        Some(slot) => slot.take().unwrap_or(Value::Undefined),
        None => return mismatch(args, Resume::FilterWithValue),
    };
    if selected {
        StepOutcome::Yield(value)
    } else {
        filter_start(runtime, args, Completion::Normal(Value::Undefined))
    }
}

// ---------------------------------------------------------------------------
// take
// ---------------------------------------------------------------------------

pub fn take_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    let remaining = match args.remaining_mut() {
        Some(remaining) => remaining,
        None => return mismatch(args, Resume::TakeStart),
    };
    if *remaining == 0.0 {
        return StepOutcome::Close(Completion::Return(Value::Undefined));
    }
    if *remaining != f64::INFINITY {
        *remaining -= 1.0;
    }
    pull(runtime, args, Resume::TakeWithResult)
}

pub fn take_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(value)) => StepOutcome::Yield(value),
        Ok(None) => StepOutcome::Complete(Completion::Normal(Value::Undefined)),
        Err(outcome) => outcome,
    }
}

// ---------------------------------------------------------------------------
// drop
// ---------------------------------------------------------------------------

pub fn drop_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    let remaining = match args.remaining_mut() {
        Some(remaining) => remaining,
        None => return mismatch(args, Resume::DropStart),
    };
    if *remaining > 0.0 {
        if *remaining != f64::INFINITY {
            *remaining -= 1.0;
        }
        return pull(runtime, args, Resume::DropSkipped);
    }
    pull(runtime, args, Resume::DropWithResult)
}

pub fn drop_skipped(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(_)) => drop_start(runtime, args, Completion::Normal(Value::Undefined)),
        Ok(None) => StepOutcome::Complete(Completion::Normal(Value::Undefined)),
        Err(outcome) => outcome,
    }
}

pub fn drop_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(value)) => StepOutcome::Yield(value),
        Ok(None) => StepOutcome::Complete(Completion::Normal(Value::Undefined)),
        Err(outcome) => outcome,
    }
}

// ---------------------------------------------------------------------------
// indexed
// ---------------------------------------------------------------------------

pub fn indexed_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    pull(runtime, args, Resume::IndexedWithResult)
}

pub fn indexed_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    match source_value(runtime, args, completion) {
        Ok(Some(value)) => {
            let index = args.next_index();
            StepOutcome::Yield(Value::new_array(vec![index_value(index), value]))
        }
        Ok(None) => StepOutcome::Complete(Completion::Normal(Value::Undefined)),
        Err(outcome) => outcome,
    }
}

// ---------------------------------------------------------------------------
// flatMap
// ---------------------------------------------------------------------------

pub fn flat_map_start(runtime: &Runtime, args: &mut CombinatorArgs, _completion: Completion) -> StepOutcome {
    let next = match args.inner_mut() {
        Some(slot) => slot.as_ref().map(|inner| iterator_next(inner, None)),
        None => return mismatch(args, Resume::FlatMapStart),
    };
    match next {
        Some(Ok(result)) => StepOutcome::Await {
            value: result,
            resume: Resume::FlatMapInnerWithResult,
        },
        Some(Err(err)) => inner_abrupt(args, err),
        None => pull(runtime, args, Resume::FlatMapWithResult),
    }
}

pub fn flat_map_with_result(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let value = match source_value(runtime, args, completion) {
        Ok(Some(value)) => value,
        Ok(None) => return StepOutcome::Complete(Completion::Normal(Value::Undefined)),
        Err(outcome) => return outcome,
    };
    let index = args.next_index();
    call_callback(args, &[value, index_value(index)], Resume::FlatMapWithValue)
}

pub fn flat_map_with_value(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    let inner = match completion
        .into_result()
        .and_then(|mapped| get_iterator_flattenable(runtime, &mapped))
    {
        Ok(inner) => inner,
        Err(err) => return StepOutcome::Close(Completion::Throw(err)),
    };
    match args.inner_mut() {
        Some(slot) => *slot = Some(inner),
        None => return mismatch(args, Resume::FlatMapWithValue),
    }
    flat_map_start(runtime, args, Completion::Normal(Value::Undefined))
}

pub fn flat_map_inner_with_result(
    runtime: &Runtime,
    args: &mut CombinatorArgs,
    completion: Completion,
) -> StepOutcome {
    let result = match completion.into_result().and_then(check_iter_result) {
        Ok(result) => result,
        Err(err) => return inner_abrupt(args, err),
    };
    if iterator_complete(&result) {
        if let Some(inner) = args.take_inner() {
            inner.mark_done();
        }
        return flat_map_start(runtime, args, Completion::Normal(Value::Undefined));
    }
    StepOutcome::Yield(iterator_value(&result))
}

/// The inner iterator failed: drop it without closing and close the source
fn inner_abrupt(args: &mut CombinatorArgs, err: Error) -> StepOutcome {
    if let Some(inner) = args.take_inner() {
        inner.mark_done();
    }
    StepOutcome::Close(Completion::Throw(err))
}
