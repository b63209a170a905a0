//! Integration tests for the generator-based helpers
//!
//! map, filter, take, drop, indexed and flatMap, driven through the public
//! `AsyncIterator` surface.

mod common;

use asynciter::prelude::*;
use common::*;

fn identity() -> Value {
    func("identity", Ok)
}

mod map {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_doubles_values() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let doubled = runtime
            .async_iterator(src.value.clone())
            .map(&func("double", |v| Ok(Value::Number(v.to_number() * 2.0))))
            .unwrap();
        assert_eq!(collect(&runtime, &doubled).unwrap(), numbers(&[2.0, 4.0, 6.0]));
        assert_eq!(src.next_calls(), 4);
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_map_passes_value_and_index() {
        let runtime = Runtime::new();
        let src = source(&runtime, vec![Value::from("a"), Value::from("b")]).build();
        let (mapper, calls) = recording("mapper", Value::Null);
        let mapped = runtime.async_iterator(src.value.clone()).map(&mapper).unwrap();
        collect(&runtime, &mapped).unwrap();
        assert_eq!(
            *calls.borrow(),
            vec![
                vec![Value::from("a"), Value::from(0)],
                vec![Value::from("b"), Value::from(1)],
            ]
        );
    }

    #[test]
    fn test_map_preserves_order_with_uneven_latency() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[3.0, 1.0, 2.0])).build();
        let rt = runtime.clone();
        let slow = func("slow", move |v| {
            let mut promise = rt.promise_resolve(Value::Number(v.to_number() * 10.0));
            for _ in 0..(v.to_number() as usize * 3) {
                promise = promise.then(Ok, Err);
            }
            Ok(promise.to_value())
        });
        let mapped = runtime.async_iterator(src.value.clone()).map(&slow).unwrap();

        // Issue every request up front; they still settle in source order
        let requests: Vec<Promise> = (0..4).map(|_| mapped.next().unwrap()).collect();
        runtime.run_until_idle();
        let results: Vec<(Value, bool)> = requests
            .iter()
            .map(|p| settled_result(&runtime, p))
            .collect();
        assert_eq!(
            results,
            vec![
                (Value::from(30), false),
                (Value::from(10), false),
                (Value::from(20), false),
                (Value::Undefined, true),
            ]
        );
    }

    #[test]
    fn test_map_yield_awaits_mapped_promise() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0])).build();
        let rt = runtime.clone();
        let to_promise = func("toPromise", move |v| Ok(rt.promise_resolve(v).to_value()));
        let mapped = runtime.async_iterator(src.value.clone()).map(&to_promise).unwrap();
        let (value, done) = settled_result(&runtime, &mapped.next().unwrap());
        assert_eq!(value, Value::from(1));
        assert!(!done);
    }

    #[test]
    fn test_mapper_error_closes_source_and_rejects() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let failing = func("failing", |v| {
            if v.to_number() == 2.0 {
                Err(Error::thrown("boom"))
            } else {
                Ok(v)
            }
        });
        let mapped = runtime.async_iterator(src.value.clone()).map(&failing).unwrap();
        let first = mapped.next().unwrap();
        let second = mapped.next().unwrap();
        let third = mapped.next().unwrap();
        runtime.run_until_idle();

        assert_eq!(settled_result(&runtime, &first), (Value::from(1), false));
        assert_eq!(runtime.block_on(&second), Err(Error::thrown("boom")));
        assert_eq!(settled_result(&runtime, &third), (Value::Undefined, true));
        assert_eq!(src.return_calls(), 1);
        assert_eq!(src.next_calls(), 2);
    }
}

mod filter {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_keeps_original_values() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0, 4.0])).build();
        let even = func("even", |v| Ok(Value::from(v.to_number() % 2.0 == 0.0)));
        let filtered = runtime.async_iterator(src.value.clone()).filter(&even).unwrap();
        assert_eq!(collect(&runtime, &filtered).unwrap(), numbers(&[2.0, 4.0]));
    }

    #[test]
    fn test_filter_uses_truthiness() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[0.0, 1.0, 2.0])).build();
        let filtered = runtime.async_iterator(src.value.clone()).filter(&identity()).unwrap();
        assert_eq!(collect(&runtime, &filtered).unwrap(), numbers(&[1.0, 2.0]));
    }

    #[test]
    fn test_filter_counts_every_source_value() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[5.0, 6.0, 7.0])).build();
        let (filterer, calls) = recording("never", Value::Boolean(false));
        let filtered = runtime.async_iterator(src.value.clone()).filter(&filterer).unwrap();
        assert_eq!(collect(&runtime, &filtered).unwrap(), Vec::<Value>::new());
        let indexes: Vec<Value> = calls.borrow().iter().map(|args| args[1].clone()).collect();
        assert_eq!(indexes, numbers(&[0.0, 1.0, 2.0]));
    }

    #[test]
    fn test_filter_skips_long_runs_of_rejected_values() {
        let runtime = Runtime::new();
        let values: Vec<Value> = (0..5000).map(|n| Value::Number(n as f64)).collect();
        let src = source(&runtime, values).sync_results().build();
        let last = func("last", |v| Ok(Value::from(v.to_number() == 4999.0)));
        let filtered = runtime.async_iterator(src.value.clone()).filter(&last).unwrap();
        assert_eq!(collect(&runtime, &filtered).unwrap(), numbers(&[4999.0]));
    }
}

mod take {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_take_zero_never_pulls() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).build();
        let taken = runtime.async_iterator(src.value.clone()).take(&Value::from(0)).unwrap();
        assert_eq!(settled_result(&runtime, &taken.next().unwrap()), (Value::Undefined, true));
        assert_eq!(src.next_calls(), 0);
        assert_eq!(src.return_calls(), 1);
    }

    #[test]
    fn test_take_stops_after_limit() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0, 4.0])).build();
        let taken = runtime.async_iterator(src.value.clone()).take(&Value::from(2)).unwrap();
        assert_eq!(collect(&runtime, &taken).unwrap(), numbers(&[1.0, 2.0]));
        assert_eq!(src.next_calls(), 2);
        assert_eq!(src.return_calls(), 1);
    }

    #[test]
    fn test_take_more_than_available() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0])).build();
        let taken = runtime.async_iterator(src.value.clone()).take(&Value::from(5)).unwrap();
        assert_eq!(collect(&runtime, &taken).unwrap(), numbers(&[1.0]));
        // Exhaustion does not close
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_take_infinity_forwards_everything() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let taken = runtime
            .async_iterator(src.value.clone())
            .take(&Value::from(f64::INFINITY))
            .unwrap();
        assert_eq!(collect(&runtime, &taken).unwrap(), numbers(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_take_truncates_fractional_limit() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let taken = runtime.async_iterator(src.value.clone()).take(&Value::from(1.9)).unwrap();
        assert_eq!(collect(&runtime, &taken).unwrap(), numbers(&[1.0]));
    }
}

mod drop {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drop_skips_prefix() {
        let runtime = Runtime::new();
        let source_values = Value::new_array(numbers(&[1.0, 2.0, 3.0, 4.0]));
        let dropped = runtime.from(&source_values).unwrap().drop(&Value::from(2)).unwrap();
        assert_eq!(collect(&runtime, &dropped).unwrap(), numbers(&[3.0, 4.0]));
    }

    #[test]
    fn test_drop_infinity_yields_nothing() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let dropped = runtime
            .async_iterator(src.value.clone())
            .drop(&Value::from(f64::INFINITY))
            .unwrap();
        assert_eq!(collect(&runtime, &dropped).unwrap(), Vec::<Value>::new());
        assert_eq!(src.next_calls(), 4);
        assert_eq!(src.return_calls(), 0);
    }

    #[test]
    fn test_drop_zero_forwards_everything() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[7.0, 8.0])).build();
        let dropped = runtime.async_iterator(src.value.clone()).drop(&Value::from(0)).unwrap();
        assert_eq!(collect(&runtime, &dropped).unwrap(), numbers(&[7.0, 8.0]));
    }
}

mod indexed {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_indexed_pairs() {
        let runtime = Runtime::new();
        let src = source(&runtime, vec![Value::from("a"), Value::from("b")]).build();
        let pairs = runtime.async_iterator(src.value.clone()).indexed().unwrap();
        let pairs: Vec<Option<Vec<Value>>> = collect(&runtime, &pairs)
            .unwrap()
            .iter()
            .map(Value::array_elements)
            .collect();
        assert_eq!(
            pairs,
            vec![
                Some(vec![Value::from(0), Value::from("a")]),
                Some(vec![Value::from(1), Value::from("b")]),
            ]
        );
    }
}

mod flat_map {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_tenfold() -> Value {
        func("withTenfold", |v| {
            let n = v.to_number();
            Ok(Value::new_array(vec![Value::Number(n), Value::Number(n * 10.0)]))
        })
    }

    #[test]
    fn test_flat_map_flattens_arrays() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).build();
        let flat = runtime.async_iterator(src.value.clone()).flat_map(&with_tenfold()).unwrap();
        assert_eq!(collect(&runtime, &flat).unwrap(), numbers(&[1.0, 10.0, 2.0, 20.0]));
    }

    #[test]
    fn test_flat_map_skips_empty_inners() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let odd_only = func("oddOnly", |v| {
            if v.to_number() % 2.0 == 1.0 {
                Ok(Value::new_array(vec![v]))
            } else {
                Ok(Value::new_array(Vec::new()))
            }
        });
        let flat = runtime.async_iterator(src.value.clone()).flat_map(&odd_only).unwrap();
        assert_eq!(collect(&runtime, &flat).unwrap(), numbers(&[1.0, 3.0]));
    }

    #[test]
    fn test_flat_map_accepts_async_iterators() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).build();
        let rt = runtime.clone();
        let nested = func("nested", move |v| {
            let inner = source(&rt, vec![v.clone(), v]).build();
            Ok(inner.value)
        });
        let flat = runtime.async_iterator(src.value.clone()).flat_map(&nested).unwrap();
        assert_eq!(collect(&runtime, &flat).unwrap(), numbers(&[1.0, 1.0, 2.0, 2.0]));
    }

    #[test]
    fn test_flat_map_rejects_strings() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0])).build();
        let to_string = func("toString", |v| Ok(Value::from(v.to_js_string())));
        let flat = runtime.async_iterator(src.value.clone()).flat_map(&to_string).unwrap();
        let err = collect(&runtime, &flat).unwrap_err();
        assert!(err.is_type_error());
        assert_eq!(src.return_calls(), 1);
    }

    #[test]
    fn test_flat_map_closes_inner_then_outer() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0])).build();
        let inners = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let rt = runtime.clone();
        let created = inners.clone();
        let nested = func("nested", move |v| {
            let inner = source(&rt, vec![v.clone(), v]).build();
            let value = inner.value.clone();
            created.borrow_mut().push(inner);
            Ok(value)
        });
        let flat = runtime.async_iterator(src.value.clone()).flat_map(&nested).unwrap();

        assert_eq!(settled_result(&runtime, &flat.next().unwrap()), (Value::from(1), false));
        assert_eq!(settled_result(&runtime, &flat.return_(Value::from("a")).unwrap()), (Value::Undefined, true));
        assert_eq!(inners.borrow()[0].return_calls(), 1);
        assert_eq!(src.return_calls(), 1);

        // A second return finds the helper completed and closes nothing
        assert_eq!(settled_result(&runtime, &flat.return_(Value::from("b")).unwrap()), (Value::Undefined, true));
        assert_eq!(inners.borrow()[0].return_calls(), 1);
        assert_eq!(src.return_calls(), 1);
    }
}

mod chaining {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_helpers_compose() {
        let runtime = Runtime::new();
        let values = Value::new_array(numbers(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        let result = runtime
            .from(&values)
            .and_then(|it| it.filter(&func("odd", |v| Ok(Value::from(v.to_number() % 2.0 == 1.0)))))
            .and_then(|it| it.map(&func("square", |v| Ok(Value::Number(v.to_number() * v.to_number())))))
            .and_then(|it| it.drop(&Value::from(1)))
            .and_then(|it| it.take(&Value::from(1)))
            .unwrap();
        assert_eq!(collect(&runtime, &result).unwrap(), numbers(&[9.0]));
    }

    #[test]
    fn test_from_promise_values_are_awaited() {
        let runtime = Runtime::new();
        let values = Value::new_array(vec![
            runtime.promise_resolve(Value::from(1)).to_value(),
            Value::from(2),
        ]);
        let it = runtime.from(&values).unwrap();
        assert_eq!(collect(&runtime, &it).unwrap(), numbers(&[1.0, 2.0]));
    }

    #[test]
    fn test_take_closes_through_chain() {
        let runtime = Runtime::new();
        let src = source(&runtime, numbers(&[1.0, 2.0, 3.0])).build();
        let chain = runtime
            .async_iterator(src.value.clone())
            .map(&identity())
            .and_then(|it| it.take(&Value::from(1)))
            .unwrap();
        assert_eq!(collect(&runtime, &chain).unwrap(), numbers(&[1.0]));
        assert_eq!(src.return_calls(), 1);
    }
}
