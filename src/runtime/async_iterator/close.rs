//! Closing protocol
//!
//! On an abrupt completion (and on early exits such as `take(0)` or a
//! short-circuiting `some`), the flatMap inner iterator is closed first and
//! then the source. Each close is awaited. A close failure replaces a
//! non-throw completion but never a pending throw.

use super::args::CombinatorArgs;
use super::completion::{Completion, Resume, StepOutcome};
use crate::error::{messages, Error, Result};
use crate::runtime::iterator::{async_iterator_close, IteratorRecord};
use crate::runtime::{Runtime, Value};
use tracing::{debug, warn};

/// Enter the closing protocol with the completion to propagate afterwards
pub fn begin_close(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    debug!(
        operator = args.operator.name(),
        completion = completion.kind_name(),
        "closing iterators"
    );
    args.closing = Some(completion);
    close_inner(runtime, args)
}

fn close_inner(runtime: &Runtime, args: &mut CombinatorArgs) -> StepOutcome {
    if let Some(inner) = args.take_inner() {
        match call_return(&inner) {
            Ok(Some(result)) => {
                return StepOutcome::Await {
                    value: result,
                    resume: Resume::InnerClosed,
                }
            }
            Ok(None) => {}
            Err(err) => record_close_error(args, err),
        }
    }
    close_outer(runtime, args)
}

fn close_outer(_runtime: &Runtime, args: &mut CombinatorArgs) -> StepOutcome {
    match call_return(&args.iterated) {
        Ok(Some(result)) => StepOutcome::Await {
            value: result,
            resume: Resume::OuterClosed,
        },
        Ok(None) => finish(args),
        Err(err) => {
            record_close_error(args, err);
            finish(args)
        }
    }
}

/// Call `return` once per record; done records are skipped
fn call_return(record: &IteratorRecord) -> Result<Option<Value>> {
    if record.is_done() {
        return Ok(None);
    }
    record.mark_done();
    async_iterator_close(record)
}

/// Continuation after the inner iterator's close result settled
pub fn inner_closed(runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    check_close_result(args, completion);
    close_outer(runtime, args)
}

/// Continuation after the source's close result settled
pub fn outer_closed(_runtime: &Runtime, args: &mut CombinatorArgs, completion: Completion) -> StepOutcome {
    check_close_result(args, completion);
    finish(args)
}

fn check_close_result(args: &mut CombinatorArgs, completion: Completion) {
    match completion.into_result() {
        Ok(result) if result.is_object() => {}
        Ok(result) => record_close_error(
            args,
            Error::type_error(messages::iter_result_not_an_object(&result.to_js_string())),
        ),
        Err(err) => record_close_error(args, err),
    }
}

fn record_close_error(args: &mut CombinatorArgs, err: Error) {
    match &args.closing {
        Some(Completion::Throw(original)) => {
            warn!(
                operator = args.operator.name(),
                original = %original,
                suppressed = %err,
                "close failed while propagating an error; keeping the original"
            );
        }
        _ => args.closing = Some(Completion::Throw(err)),
    }
}

fn finish(args: &mut CombinatorArgs) -> StepOutcome {
    let completion = args
        .closing
        .take()
        .unwrap_or(Completion::Normal(Value::Undefined));
    debug!(
        operator = args.operator.name(),
        completion = completion.kind_name(),
        "iterators closed"
    );
    StepOutcome::Complete(completion)
}
