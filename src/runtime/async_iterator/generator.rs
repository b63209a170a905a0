//! Async generator state machine for helper objects
//!
//! Implements the async generator request protocol for the generator-based
//! helpers:
//! - AsyncGenerator.prototype.next(value)
//! - AsyncGenerator.prototype.return(value)
//! - AsyncGenerator.prototype.throw(exception)
//!
//! Requests are queued FIFO. At most one request is in flight; the next one
//! starts once the previous one has settled its promise.

use super::args::CombinatorArgs;
use super::bridge::await_value;
use super::close::begin_close;
use super::completion::{Completion, Resume, StepOutcome};
use crate::error::Error;
use crate::runtime::iterator::create_iter_result;
use crate::runtime::value::{Object, ObjectKind, SYMBOL_ASYNC_ITERATOR};
use crate::runtime::{Promise, Runtime, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

/// Async generator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Created but not started
    SuspendedStart,
    /// Suspended at a yield point
    SuspendedYield,
    /// Currently executing (including while awaiting)
    Executing,
    /// Completed, awaiting the argument of a queued `return()`
    AwaitingReturn,
    /// Completed
    Completed,
}

/// A queued consumer call
#[derive(Debug)]
pub struct AsyncGeneratorRequest {
    /// Next (`Normal`), `Return` or `Throw`
    pub completion: Completion,
    /// Promise handed back to the caller
    pub capability: Promise,
}

/// Where a suspended helper resumes once an awaited value settles
#[derive(Debug, Clone, Copy)]
enum Suspension {
    /// Inside the operator body
    Body(Resume),
    /// Awaiting the operand of a `yield`
    Yield,
    /// Awaiting the argument of `return()` received at a yield point
    ReturnAtYield,
    /// Awaiting the argument of `return()` on a finished helper
    ReturnAfterCompletion,
}

struct Machine {
    state: GeneratorState,
    queue: VecDeque<AsyncGeneratorRequest>,
}

struct HelperInner {
    runtime: Runtime,
    name: &'static str,
    /// Operator state; only touched while the helper is executing
    args: RefCell<CombinatorArgs>,
    /// Request queue and state; touched by consumer calls at any time
    machine: RefCell<Machine>,
}

/// Shared handle to a helper's generator machinery
#[derive(Clone)]
pub struct AsyncIteratorHelper {
    inner: Rc<HelperInner>,
}

impl AsyncIteratorHelper {
    /// Create a helper in the `SuspendedStart` state. The source is not touched.
    pub fn new(runtime: &Runtime, args: CombinatorArgs) -> Self {
        let name = args.operator.name();
        debug!(operator = name, "created async iterator helper");
        Self {
            inner: Rc::new(HelperInner {
                runtime: runtime.clone(),
                name,
                args: RefCell::new(args),
                machine: RefCell::new(Machine {
                    state: GeneratorState::SuspendedStart,
                    queue: VecDeque::new(),
                }),
            }),
        }
    }

    /// Operator name ("map", "filter", ...)
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Current generator state
    pub fn state(&self) -> GeneratorState {
        self.inner.machine.borrow().state
    }

    /// Number of requests not yet settled
    pub fn queued_requests(&self) -> usize {
        self.inner.machine.borrow().queue.len()
    }

    /// `next(value)`
    pub fn next(&self, value: Value) -> Promise {
        self.enqueue(Completion::Normal(value))
    }

    /// `return()`
    ///
    /// Helpers always return `undefined`; an argument passed by the caller
    /// is ignored.
    pub fn gen_return(&self) -> Promise {
        self.enqueue(Completion::Return(Value::Undefined))
    }

    /// `throw(error)`
    pub fn gen_throw(&self, error: Error) -> Promise {
        self.enqueue(Completion::Throw(error))
    }

    /// Wrap the helper in an object exposing `next`, `return`, `throw` and
    /// `@@asyncIterator`, so it can serve as the source of another helper
    pub fn to_value(&self) -> Value {
        let object = Rc::new(RefCell::new(Object::new(ObjectKind::AsyncIteratorHelper(self.clone()))));
        let value = Value::Object(object.clone());

        let helper = self.clone();
        value.set_property(
            "next",
            Value::native_function("next", move |args| {
                Ok(helper.next(first_arg(args)).to_value())
            }),
        );
        let helper = self.clone();
        value.set_property(
            "return",
            Value::native_function("return", move |_args| {
                Ok(helper.gen_return().to_value())
            }),
        );
        let helper = self.clone();
        value.set_property(
            "throw",
            Value::native_function("throw", move |args| {
                Ok(helper.gen_throw(Error::Thrown(first_arg(args))).to_value())
            }),
        );
        let this = Rc::downgrade(&object);
        value.set_property(
            SYMBOL_ASYNC_ITERATOR,
            Value::native_function("[Symbol.asyncIterator]", move |_| {
                Ok(this.upgrade().map(Value::Object).unwrap_or(Value::Undefined))
            }),
        );
        value
    }

    // -----------------------------------------------------------------------
    // Request queue
    // -----------------------------------------------------------------------

    fn enqueue(&self, completion: Completion) -> Promise {
        let capability = Promise::new(self.inner.runtime.event_loop());
        let state = {
            let mut machine = self.inner.machine.borrow_mut();
            machine.queue.push_back(AsyncGeneratorRequest {
                completion,
                capability: capability.clone(),
            });
            machine.state
        };
        trace!(operator = self.inner.name, ?state, "request enqueued");
        if !matches!(state, GeneratorState::Executing | GeneratorState::AwaitingReturn) {
            self.resume_next();
        }
        capability
    }

    fn set_state(&self, state: GeneratorState) {
        trace!(operator = self.inner.name, ?state, "state transition");
        self.inner.machine.borrow_mut().state = state;
    }

    fn pop_request(&self) -> Option<AsyncGeneratorRequest> {
        self.inner.machine.borrow_mut().queue.pop_front()
    }

    /// Start processing the head request if the helper is idle
    fn resume_next(&self) {
        loop {
            let (state, head) = {
                let machine = self.inner.machine.borrow();
                let head = machine.queue.front().map(|request| request.completion.clone());
                (machine.state, head)
            };
            let Some(completion) = head else {
                return;
            };

            match state {
                GeneratorState::Executing | GeneratorState::AwaitingReturn => return,
                GeneratorState::Completed => match completion {
                    Completion::Normal(_) => {
                        if let Some(request) = self.pop_request() {
                            request
                                .capability
                                .resolve(create_iter_result(Value::Undefined, true));
                        }
                    }
                    Completion::Throw(err) => {
                        if let Some(request) = self.pop_request() {
                            request.capability.reject(err);
                        }
                    }
                    Completion::Return(value) => {
                        self.set_state(GeneratorState::AwaitingReturn);
                        self.suspend(value, Suspension::ReturnAfterCompletion);
                        return;
                    }
                },
                GeneratorState::SuspendedStart => match completion {
                    Completion::Normal(_) => {
                        self.set_state(GeneratorState::Executing);
                        self.run(Suspension::Body(self.start_point()), completion);
                        return;
                    }
                    // A helper that never started completes without
                    // touching its source
                    Completion::Return(_) | Completion::Throw(_) => {
                        self.set_state(GeneratorState::Completed);
                    }
                },
                GeneratorState::SuspendedYield => {
                    self.set_state(GeneratorState::Executing);
                    match completion {
                        Completion::Normal(_) => {
                            self.run(Suspension::Body(self.start_point()), completion);
                        }
                        Completion::Return(value) => self.suspend(value, Suspension::ReturnAtYield),
                        Completion::Throw(err) => self.drive(StepOutcome::Close(Completion::Throw(err))),
                    }
                    return;
                }
            }
        }
    }

    fn start_point(&self) -> Resume {
        self.inner.args.borrow().operator.start()
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Await `value` and resume at `suspension` once it settles
    fn suspend(&self, value: Value, suspension: Suspension) {
        let helper = self.clone();
        await_value(&self.inner.runtime, value, move |completion| {
            helper.run(suspension, completion)
        });
    }

    /// Resume after a suspension
    fn run(&self, suspension: Suspension, completion: Completion) {
        trace!(
            operator = self.inner.name,
            ?suspension,
            completion = completion.kind_name(),
            "resuming"
        );
        let outcome = match suspension {
            Suspension::Body(resume) => {
                let mut args = self.inner.args.borrow_mut();
                (resume.continuation())(&self.inner.runtime, &mut args, completion)
            }
            Suspension::Yield => match completion {
                Completion::Normal(value) => {
                    self.complete_step_yield(value);
                    return;
                }
                other => StepOutcome::Close(other),
            },
            Suspension::ReturnAtYield => match completion {
                Completion::Normal(value) | Completion::Return(value) => {
                    StepOutcome::Close(Completion::Return(value))
                }
                Completion::Throw(err) => StepOutcome::Close(Completion::Throw(err)),
            },
            Suspension::ReturnAfterCompletion => {
                if let Some(request) = self.pop_request() {
                    match completion.into_result() {
                        Ok(value) => request.capability.resolve(create_iter_result(value, true)),
                        Err(err) => request.capability.reject(err),
                    }
                }
                self.set_state(GeneratorState::Completed);
                self.resume_next();
                return;
            }
        };
        self.drive(outcome);
    }

    fn drive(&self, mut outcome: StepOutcome) {
        loop {
            match outcome {
                StepOutcome::Await { value, resume } => {
                    self.suspend(value, Suspension::Body(resume));
                    return;
                }
                StepOutcome::Yield(value) => {
                    // `yield` awaits its operand
                    self.suspend(value, Suspension::Yield);
                    return;
                }
                StepOutcome::Close(completion) => {
                    let mut args = self.inner.args.borrow_mut();
                    outcome = begin_close(&self.inner.runtime, &mut args, completion);
                }
                StepOutcome::Complete(completion) => {
                    self.complete(completion);
                    return;
                }
            }
        }
    }

    /// Settle the head request with a yielded value and move on
    fn complete_step_yield(&self, value: Value) {
        self.set_state(GeneratorState::SuspendedYield);
        if let Some(request) = self.pop_request() {
            request.capability.resolve(create_iter_result(value, false));
        }
        self.resume_next();
    }

    /// The body finished: settle the head request and drain the rest
    fn complete(&self, completion: Completion) {
        debug!(
            operator = self.inner.name,
            completion = completion.kind_name(),
            "async iterator helper completed"
        );
        self.set_state(GeneratorState::Completed);
        if let Some(request) = self.pop_request() {
            match completion.into_result() {
                Ok(value) => request.capability.resolve(create_iter_result(value, true)),
                Err(err) => request.capability.reject(err),
            }
        }
        self.resume_next();
    }
}

fn first_arg(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or(Value::Undefined)
}
