//! Combinator argument records
//!
//! Everything an operator body needs across a suspension point lives here.

use super::completion::{Completion, Resume};
use crate::runtime::iterator::IteratorRecord;
use crate::runtime::Value;

/// Per-operator state
#[derive(Debug)]
pub enum OperatorArgs {
    Map {
        mapper: Value,
    },
    Filter {
        filterer: Value,
        pending_value: Option<Value>,
    },
    Take {
        remaining: f64,
    },
    Drop {
        remaining: f64,
    },
    Indexed,
    FlatMap {
        mapper: Value,
        /// `Some` while a flattened sub-iterator is draining
        inner: Option<IteratorRecord>,
    },
    Reduce {
        reducer: Value,
        accumulator: Option<Value>,
    },
    ToArray {
        results: Vec<Value>,
    },
    ForEach {
        callback: Value,
        pending_value: Option<Value>,
    },
    Some {
        predicate: Value,
        pending_value: Option<Value>,
    },
    Every {
        predicate: Value,
        pending_value: Option<Value>,
    },
    Find {
        predicate: Value,
        pending_value: Option<Value>,
    },
}

impl OperatorArgs {
    /// Operator name as exposed to JavaScript
    pub fn name(&self) -> &'static str {
        match self {
            OperatorArgs::Map { .. } => "map",
            OperatorArgs::Filter { .. } => "filter",
            OperatorArgs::Take { .. } => "take",
            OperatorArgs::Drop { .. } => "drop",
            OperatorArgs::Indexed => "indexed",
            OperatorArgs::FlatMap { .. } => "flatMap",
            OperatorArgs::Reduce { .. } => "reduce",
            OperatorArgs::ToArray { .. } => "toArray",
            OperatorArgs::ForEach { .. } => "forEach",
            OperatorArgs::Some { .. } => "some",
            OperatorArgs::Every { .. } => "every",
            OperatorArgs::Find { .. } => "find",
        }
    }

    /// Entry continuation of the operator body
    pub fn start(&self) -> Resume {
        match self {
            OperatorArgs::Map { .. } => Resume::MapStart,
            OperatorArgs::Filter { .. } => Resume::FilterStart,
            OperatorArgs::Take { .. } => Resume::TakeStart,
            OperatorArgs::Drop { .. } => Resume::DropStart,
            OperatorArgs::Indexed => Resume::IndexedStart,
            OperatorArgs::FlatMap { .. } => Resume::FlatMapStart,
            OperatorArgs::Reduce { .. } => Resume::ReduceStart,
            OperatorArgs::ToArray { .. } => Resume::ToArrayStart,
            OperatorArgs::ForEach { .. } => Resume::ForEachStart,
            OperatorArgs::Some { .. } => Resume::SomeStart,
            OperatorArgs::Every { .. } => Resume::EveryStart,
            OperatorArgs::Find { .. } => Resume::FindStart,
        }
    }

    /// The user callback, for operators that take one
    pub fn callback(&self) -> Option<&Value> {
        match self {
            OperatorArgs::Map { mapper } | OperatorArgs::FlatMap { mapper, .. } => Some(mapper),
            OperatorArgs::Filter { filterer, .. } => Some(filterer),
            OperatorArgs::Reduce { reducer, .. } => Some(reducer),
            OperatorArgs::ForEach { callback, .. } => Some(callback),
            OperatorArgs::Some { predicate, .. }
            | OperatorArgs::Every { predicate, .. }
            | OperatorArgs::Find { predicate, .. } => Some(predicate),
            _ => None,
        }
    }
}

/// State of one combinator invocation
#[derive(Debug)]
pub struct CombinatorArgs {
    /// The source iterator
    pub iterated: IteratorRecord,
    /// Number of source values handed to the callback so far
    pub counter: u64,
    /// Operator-specific state
    pub operator: OperatorArgs,
    /// Completion to propagate once the closing protocol finishes
    pub closing: Option<Completion>,
}

impl CombinatorArgs {
    /// Create the args record for a fresh invocation
    pub fn new(iterated: IteratorRecord, operator: OperatorArgs) -> Self {
        Self {
            iterated,
            counter: 0,
            operator,
            closing: None,
        }
    }

    /// Return the current counter and advance it
    pub fn next_index(&mut self) -> u64 {
        let index = self.counter;
        self.counter += 1;
        index
    }

    /// Remaining count of take/drop
    pub fn remaining_mut(&mut self) -> Option<&mut f64> {
        match &mut self.operator {
            OperatorArgs::Take { remaining } | OperatorArgs::Drop { remaining } => Some(remaining),
            _ => None,
        }
    }

    /// Value held between a predicate call and its awaited result
    pub fn pending_value_mut(&mut self) -> Option<&mut Option<Value>> {
        match &mut self.operator {
            OperatorArgs::Filter { pending_value, .. }
            | OperatorArgs::ForEach { pending_value, .. }
            | OperatorArgs::Some { pending_value, .. }
            | OperatorArgs::Every { pending_value, .. }
            | OperatorArgs::Find { pending_value, .. } => Some(pending_value),
            _ => None,
        }
    }

    /// The flatMap inner iterator slot
    pub fn inner_mut(&mut self) -> Option<&mut Option<IteratorRecord>> {
        match &mut self.operator {
            OperatorArgs::FlatMap { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Detach the flatMap inner iterator, if one is draining
    pub fn take_inner(&mut self) -> Option<IteratorRecord> {
        self.inner_mut().and_then(Option::take)
    }

    /// The reduce accumulator slot
    pub fn accumulator_mut(&mut self) -> Option<&mut Option<Value>> {
        match &mut self.operator {
            OperatorArgs::Reduce { accumulator, .. } => Some(accumulator),
            _ => None,
        }
    }

    /// Values collected by toArray
    pub fn results_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.operator {
            OperatorArgs::ToArray { results } => Some(results),
            _ => None,
        }
    }
}
