//! Completions, step outcomes and resume points
//!
//! Every operator body is split at its suspension points into plain `fn`
//! continuations. A suspended body is nothing more than a [`Resume`] tag;
//! the tag is mapped back to its continuation through [`Resume::continuation`].

use super::args::CombinatorArgs;
use super::{close, helpers, reducers};
use crate::error::{Error, Result};
use crate::runtime::{Runtime, Value};

/// A completion record threaded through every continuation
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Normal completion carrying a value
    Normal(Value),
    /// A return request (or a body returning early)
    Return(Value),
    /// An abrupt throw
    Throw(Error),
}

impl Completion {
    /// Convert the settlement of an awaited promise
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Completion::Normal(value),
            Err(err) => Completion::Throw(err),
        }
    }

    /// `Normal` and `Return` carry values; `Throw` carries the error
    pub fn into_result(self) -> Result<Value> {
        match self {
            Completion::Normal(value) | Completion::Return(value) => Ok(value),
            Completion::Throw(err) => Err(err),
        }
    }

    /// Check if this is a throw completion
    pub fn is_throw(&self) -> bool {
        matches!(self, Completion::Throw(_))
    }

    /// Short name used in trace output
    pub fn kind_name(&self) -> &'static str {
        match self {
            Completion::Normal(_) => "normal",
            Completion::Return(_) => "return",
            Completion::Throw(_) => "throw",
        }
    }
}

/// What a continuation asks the driver to do next
#[derive(Debug)]
pub enum StepOutcome {
    /// Await `value`, then resume at `resume` with its settlement
    Await { value: Value, resume: Resume },
    /// Yield a value to the consumer (generator helpers only)
    Yield(Value),
    /// The body finished with this completion
    Complete(Completion),
    /// Run the closing protocol, then complete with this completion
    Close(Completion),
}

/// Signature shared by every continuation
pub type Continuation = fn(&Runtime, &mut CombinatorArgs, Completion) -> StepOutcome;

/// Suspension points of every operator body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    MapStart,
    MapWithResult,
    MapWithValue,
    FilterStart,
    FilterWithResult,
    FilterWithValue,
    TakeStart,
    TakeWithResult,
    DropStart,
    DropSkipped,
    DropWithResult,
    IndexedStart,
    IndexedWithResult,
    FlatMapStart,
    FlatMapWithResult,
    FlatMapWithValue,
    FlatMapInnerWithResult,
    ReduceStart,
    ReduceInitial,
    ReduceWithResult,
    ReduceWithValue,
    ToArrayStart,
    ToArrayWithResult,
    ForEachStart,
    ForEachWithResult,
    ForEachWithValue,
    SomeStart,
    SomeWithResult,
    SomeWithValue,
    EveryStart,
    EveryWithResult,
    EveryWithValue,
    FindStart,
    FindWithResult,
    FindWithValue,
    InnerClosed,
    OuterClosed,
}

impl Resume {
    /// Dispatch table from resume point to continuation
    pub fn continuation(self) -> Continuation {
        match self {
            Resume::MapStart => helpers::map_start,
            Resume::MapWithResult => helpers::map_with_result,
            Resume::MapWithValue => helpers::map_with_value,
            Resume::FilterStart => helpers::filter_start,
            Resume::FilterWithResult => helpers::filter_with_result,
            Resume::FilterWithValue => helpers::filter_with_value,
            Resume::TakeStart => helpers::take_start,
            Resume::TakeWithResult => helpers::take_with_result,
            Resume::DropStart => helpers::drop_start,
            Resume::DropSkipped => helpers::drop_skipped,
            Resume::DropWithResult => helpers::drop_with_result,
            Resume::IndexedStart => helpers::indexed_start,
            Resume::IndexedWithResult => helpers::indexed_with_result,
            Resume::FlatMapStart => helpers::flat_map_start,
            Resume::FlatMapWithResult => helpers::flat_map_with_result,
            Resume::FlatMapWithValue => helpers::flat_map_with_value,
            Resume::FlatMapInnerWithResult => helpers::flat_map_inner_with_result,
            Resume::ReduceStart => reducers::reduce_start,
            Resume::ReduceInitial => reducers::reduce_initial,
            Resume::ReduceWithResult => reducers::reduce_with_result,
            Resume::ReduceWithValue => reducers::reduce_with_value,
            Resume::ToArrayStart => reducers::to_array_start,
            Resume::ToArrayWithResult => reducers::to_array_with_result,
            Resume::ForEachStart => reducers::for_each_start,
            Resume::ForEachWithResult => reducers::for_each_with_result,
            Resume::ForEachWithValue => reducers::for_each_with_value,
            Resume::SomeStart => reducers::some_start,
            Resume::SomeWithResult => reducers::some_with_result,
            Resume::SomeWithValue => reducers::some_with_value,
            Resume::EveryStart => reducers::every_start,
            Resume::EveryWithResult => reducers::every_with_result,
            Resume::EveryWithValue => reducers::every_with_value,
            Resume::FindStart => reducers::find_start,
            Resume::FindWithResult => reducers::find_with_result,
            Resume::FindWithValue => reducers::find_with_value,
            Resume::InnerClosed => close::inner_closed,
            Resume::OuterClosed => close::outer_closed,
        }
    }
}
