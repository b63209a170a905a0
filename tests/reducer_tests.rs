//! Integration tests for the terminal combinators
//!
//! reduce, toArray, forEach, some, every and find.

mod common;

use asynciter::error::messages;
use asynciter::prelude::*;
use common::*;

fn greater_than(limit: f64) -> Value {
    func("greaterThan", move |v| Ok(Value::from(v.to_number() > limit)))
}

fn sum() -> Value {
    Value::native_function("sum", |args| {
        Ok(Value::Number(arg(args, 0).to_number() + arg(args, 1).to_number()))
    })
}

mod reduce {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reduce_with_initial_value() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let promise = runtime
            .async_iterator(src.value.clone())
            .reduce(&sum(), Some(Value::from(10)))
            .unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::from(16));
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_reduce_without_initial_value_starts_at_index_one() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let (reducer, calls) = recording("reducer", Value::from(0));
        let promise = runtime.async_iterator(src.value.clone()).reduce(&reducer, None).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::from(0));
        assert_eq!(
            *calls.borrow(),
            vec![
                vec![Value::from(1), Value::from(2), Value::from(1)],
                vec![Value::from(0), Value::from(3), Value::from(2)],
            ]
        );
    }

    #[test]
    fn test_reduce_single_value_without_initial() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[42.0])).build();
        let (reducer, calls) = recording("reducer", Value::Null);
        let promise = runtime.async_iterator(src.value.clone()).reduce(&reducer, None).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::from(42));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_reduce_empty_without_initial_rejects() {
        let runtime = Runtime::new();
        let src = source(&runtime, Vec::new()).build();
        let promise = runtime.async_iterator(src.value.clone()).reduce(&sum(), None).unwrap();
        assert_eq!(
            runtime.block_on(&promise),
            Err(Error::type_error(messages::REDUCE_EMPTY))
        );
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_reduce_empty_with_initial_resolves_initial() {
        let runtime = Runtime::new();
        let src = source(&runtime, Vec::new()).build();
        let promise = runtime
            .async_iterator(src.value.clone())
            .reduce(&sum(), Some(Value::from("seed")))
            .unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::from("seed"));
    }

    #[test]
    fn test_reduce_awaits_reducer_promises() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).build();
        let rt = runtime.clone();
        let async_sum = Value::native_function("asyncSum", move |args| {
            let total = arg(args, 0).to_number() + arg(args, 1).to_number();
            Ok(rt.promise_resolve(Value::Number(total)).to_value())
        });
        let promise = runtime
            .async_iterator(src.value.clone())
            .reduce(&async_sum, Some(Value::from(0)))
            .unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::from(3));
    }
}

mod to_array {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_array_collects_in_order() {
        let runtime = Runtime::new();
        let src = source(&runtime, vec![Value::from("x"), Value::Null, Value::from(true)]).build();
        let promise = runtime.async_iterator(src.value.clone()).to_array().unwrap();
        let array = runtime.block_on(&promise).unwrap();
        assert!(array.is_array());
        assert_eq!(
            array.array_elements(),
            Some(vec![Value::from("x"), Value::Null, Value::from(true)])
        );
    }

    #[test]
    fn test_to_array_empty_source() {
        let runtime = Runtime::new();
        let src = source(&runtime, Vec::new()).build();
        let promise = runtime.async_iterator(src.value.clone()).to_array().unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap().array_elements(), Some(Vec::new()));
    }

    #[test]
    fn test_to_array_source_failure_closes() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).fail_next_at(1).build();
        let promise = runtime.async_iterator(src.value.clone()).to_array().unwrap();
        assert_eq!(runtime.block_on(&promise), Err(Error::generic("source failed")));
        assert_eq!(src.return_calls(), 1);
    }
}

mod for_each {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_for_each_visits_every_value() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[4.0, 5.0])).build();
        let (callback, calls) = recording("callback", Value::from("ignored"));
        let promise = runtime.async_iterator(src.value.clone()).for_each(&callback).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Undefined);
        assert_eq!(
            *calls.borrow(),
            vec![
                vec![Value::from(4), Value::from(0)],
                vec![Value::from(5), Value::from(1)],
            ]
        );
    }

    #[test]
    fn test_for_each_rejected_callback_promise_closes() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).build();
        let rt = runtime.clone();
        let callback = func("rejecting", move |_| {
            Ok(rt.rejected(Error::generic("async failure")).to_value())
        });
        let promise = runtime.async_iterator(src.value.clone()).for_each(&callback).unwrap();
        assert_eq!(runtime.block_on(&promise), Err(Error::generic("async failure")));
        assert_eq!(src.next_calls(), 1);
        assert_eq!(src.return_calls(), 1);
    }
}

mod some_every {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_some_short_circuits_and_closes() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 5.0, 9.0])).build();
        let promise = runtime.async_iterator(src.value.clone()).some(&greater_than(3.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Boolean(true));
        assert_eq!(src.next_calls(), 2);
        assert_eq!(src.return_calls(), 1);
    }

    #[test]
    fn test_some_false_on_exhaustion() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).build();
        let promise = runtime.async_iterator(src.value.clone()).some(&greater_than(3.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Boolean(false));
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_every_short_circuits_on_falsy() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[5.0, 1.0, 9.0])).build();
        let promise = runtime.async_iterator(src.value.clone()).every(&greater_than(3.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Boolean(false));
        assert_eq!(src.next_calls(), 2);
        assert_eq!(src.return_calls(), 1);
    }

    #[test]
    fn test_every_true_on_exhaustion() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[5.0, 9.0])).build();
        let promise = runtime.async_iterator(src.value.clone()).every(&greater_than(3.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Boolean(true));
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_every_on_empty_source() {
        let runtime = Runtime::new();
        let src = source(&runtime, Vec::new()).build();
        let promise = runtime.async_iterator(src.value.clone()).every(&greater_than(3.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Boolean(true));
    }
}

mod find {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_stops_at_first_match() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let promise = runtime.async_iterator(src.value.clone()).find(&greater_than(1.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::from(2));
        assert_eq!(src.next_calls(), 2);
        assert_eq!(src.return_calls(), 1);
    }

    #[test]
    fn test_find_without_match_is_undefined() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0])).build();
        let promise = runtime.async_iterator(src.value.clone()).find(&greater_than(1.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Undefined);
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_predicate_error_closes_once_and_rejects_with_it() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let predicate = func("explosive", |v| {
            if v.to_number() == 2.0 {
                Err(Error::thrown("second"))
            } else {
                Ok(Value::Boolean(false))
            }
        });
        let promise = runtime.async_iterator(src.value.clone()).find(&predicate).unwrap();
        assert_eq!(runtime.block_on(&promise), Err(Error::thrown("second")));
        assert_eq!(src.return_calls(), 1);
        assert_eq!(src.next_calls(), 2);
    }
}

mod closing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_close_error_does_not_mask_callback_error() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0]))
            .on_return(ReturnBehavior::Throws)
            .build();
        let predicate = func("explosive", |_| Err(Error::thrown("predicate")));
        let promise = runtime.async_iterator(src.value.clone()).some(&predicate).unwrap();
        assert_eq!(runtime.block_on(&promise), Err(Error::thrown("predicate")));
        assert_eq!(src.return_calls(), 1);
    }

    #[test]
    fn test_close_error_on_short_circuit_propagates() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[5.0]))
            .on_return(ReturnBehavior::Throws)
            .build();
        let promise = runtime.async_iterator(src.value.clone()).find(&greater_than(1.0)).unwrap();
        assert_eq!(runtime.block_on(&promise), Err(Error::generic("return failed")));
    }

    #[test]
    fn test_non_object_close_result_is_type_error() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[5.0]))
            .on_return(ReturnBehavior::NonObject)
            .build();
        let promise = runtime.async_iterator(src.value.clone()).some(&greater_than(1.0)).unwrap();
        let err = runtime.block_on(&promise).unwrap_err();
        assert_eq!(
            err,
            Error::type_error(messages::iter_result_not_an_object("42"))
        );
    }

    #[test]
    fn test_missing_return_method_is_fine() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[5.0]))
            .on_return(ReturnBehavior::Missing)
            .build();
        let promise = runtime.async_iterator(src.value.clone()).some(&greater_than(1.0)).unwrap();
        assert_eq!(runtime.block_on(&promise).unwrap(), Value::Boolean(true));
    }
}
