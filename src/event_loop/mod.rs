//! Event Loop Implementation
//!
//! This module provides the single-threaded microtask queue that promise
//! reactions and resolve-thenable jobs run on. Jobs run strictly in FIFO
//! order; a job enqueued while another is running lands at the back of the
//! queue.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;
use tracing::trace;

/// A job closure run once by the event loop
pub type Job = Box<dyn FnOnce()>;

/// A microtask to be executed (promise reactions, resolve-thenable jobs)
pub struct Microtask {
    /// Short label used in trace output
    pub label: &'static str,
    /// The job to run
    job: Job,
}

/// Result of running the event loop until the queue is empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    /// Total number of microtasks that were dequeued and processed
    pub microtasks_processed: usize,
    /// Number of budget-limited ticks it took to drain the queue
    pub iterations: usize,
}

/// Runtime statistics for the event loop
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLoopStats {
    /// Total microtasks processed across all ticks
    pub total_microtasks: u64,
    /// Total number of event loop ticks
    pub total_ticks: u64,
    /// Maximum microtasks drained in a single tick
    pub max_microtasks_per_tick: u64,
    /// Longest tick duration in milliseconds (wall-clock)
    pub longest_tick_ms: u64,
    /// Total promises created
    pub total_promises_created: u64,
    /// Total promises settled (fulfilled or rejected)
    pub total_promises_settled: u64,
    /// Rejections that had no handler when they happened
    pub total_unhandled_rejections: u64,
}

struct EventLoopInner {
    /// Microtask queue
    microtask_queue: VecDeque<Microtask>,
    /// Rejected promises with no reaction attached, keyed by promise id
    unhandled_rejections: Vec<(u64, Error)>,
    /// Maximum microtasks to drain per tick (starvation protection)
    max_microtasks_per_tick: usize,
    /// Runtime statistics
    stats: EventLoopStats,
}

/// The event loop manages the microtask queue
///
/// `EventLoop` is a cheap handle: clones share the same queue, so promises
/// can carry the loop they schedule their reactions on.
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<RefCell<EventLoopInner>>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    /// Create a new event loop
    pub fn new() -> Self {
        Self::with_budget(10_000)
    }

    /// Create a new event loop with the given per-tick microtask budget
    pub fn with_budget(max_microtasks_per_tick: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EventLoopInner {
                microtask_queue: VecDeque::new(),
                unhandled_rejections: Vec::new(),
                max_microtasks_per_tick: max_microtasks_per_tick.max(1),
                stats: EventLoopStats::default(),
            })),
        }
    }

    /// Enqueue a microtask
    pub fn enqueue_microtask(&self, label: &'static str, job: impl FnOnce() + 'static) {
        self.inner.borrow_mut().microtask_queue.push_back(Microtask {
            label,
            job: Box::new(job),
        });
    }

    /// Check if there are pending microtasks
    pub fn has_pending_microtasks(&self) -> bool {
        !self.inner.borrow().microtask_queue.is_empty()
    }

    /// Number of queued microtasks
    pub fn pending_microtask_count(&self) -> usize {
        self.inner.borrow().microtask_queue.len()
    }

    fn dequeue_microtask(&self) -> Option<Microtask> {
        self.inner.borrow_mut().microtask_queue.pop_front()
    }

    /// Run one tick: drain microtasks up to the budget limit.
    ///
    /// Returns the number of microtasks processed. Jobs are popped one at a
    /// time and no borrow of the loop is held while a job runs, so jobs may
    /// enqueue further jobs.
    pub fn run_microtasks(&self) -> usize {
        let tick_start = Instant::now();
        let budget = self.microtask_budget();
        let mut count: usize = 0;

        while count < budget {
            let Some(task) = self.dequeue_microtask() else {
                break;
            };
            trace!(label = task.label, "running microtask");
            (task.job)();
            count += 1;
        }

        let tick_elapsed = tick_start.elapsed().as_millis() as u64;
        let mut inner = self.inner.borrow_mut();
        let stats = &mut inner.stats;
        stats.total_ticks += 1;
        stats.total_microtasks += count as u64;
        if (count as u64) > stats.max_microtasks_per_tick {
            stats.max_microtasks_per_tick = count as u64;
        }
        if tick_elapsed > stats.longest_tick_ms {
            stats.longest_tick_ms = tick_elapsed;
        }
        count
    }

    /// Run ticks until the microtask queue is empty
    pub fn run_until_idle(&self) -> RunResult {
        let mut result = RunResult::default();
        while self.has_pending_microtasks() {
            result.microtasks_processed += self.run_microtasks();
            result.iterations += 1;
        }
        result
    }

    /// Get the current microtask budget limit.
    pub fn microtask_budget(&self) -> usize {
        self.inner.borrow().max_microtasks_per_tick
    }

    /// Get a snapshot of the current event loop statistics.
    pub fn stats(&self) -> EventLoopStats {
        self.inner.borrow().stats.clone()
    }

    /// Reset all event loop statistics to zero.
    pub fn reset_stats(&self) {
        self.inner.borrow_mut().stats = EventLoopStats::default();
    }

    pub(crate) fn record_promise_created(&self) {
        self.inner.borrow_mut().stats.total_promises_created += 1;
    }

    pub(crate) fn record_promise_settled(&self) {
        self.inner.borrow_mut().stats.total_promises_settled += 1;
    }

    /// Remember a rejection that happened with no handler attached
    pub fn track_unhandled_rejection(&self, promise_id: u64, reason: Error) {
        let mut inner = self.inner.borrow_mut();
        inner.stats.total_unhandled_rejections += 1;
        inner.unhandled_rejections.push((promise_id, reason));
    }

    /// Forget a tracked rejection once a handler is attached
    pub fn mark_rejection_handled(&self, promise_id: u64) {
        self.inner
            .borrow_mut()
            .unhandled_rejections
            .retain(|(id, _)| *id != promise_id);
    }

    /// Rejections that are still unhandled
    pub fn unhandled_rejections(&self) -> Vec<Error> {
        self.inner
            .borrow()
            .unhandled_rejections
            .iter()
            .map(|(_, reason)| reason.clone())
            .collect()
    }

    /// Take all unhandled rejections, clearing the list
    pub fn drain_unhandled_rejections(&self) -> Vec<Error> {
        std::mem::take(&mut self.inner.borrow_mut().unhandled_rejections)
            .into_iter()
            .map(|(_, reason)| reason)
            .collect()
    }
}
