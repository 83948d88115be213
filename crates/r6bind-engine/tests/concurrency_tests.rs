//! Concurrency Tests
//!
//! Validates the binding's thread-safety guarantees:
//! - Racing first uses of one identity produce a single class
//! - No two foreign calls ever overlap
//!
//! # Running Tests
//! ```bash
//! cargo test --test concurrency_tests
//! ```

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use r6bind_engine::{CallArgs, ClassRef, ForeignRuntime, ForeignValue, ProxyClass, R6Binding};
use r6bind_test_helpers::{fixtures, MockRuntime};

const THREADS: usize = 8;

#[test]
fn test_tracker_detects_unserialized_calls() {
    let runtime = MockRuntime::new();
    runtime.set_call_delay(Duration::from_millis(50));
    let generator = runtime.define_generator(fixtures::stack_generator());
    let barrier = Barrier::new(4);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                barrier.wait();
                runtime.is_class_generator(generator)
            });
        }
    });

    assert!(runtime.max_in_flight() > 1);
}

#[test]
fn test_racing_first_use_yields_one_class() {
    let runtime = MockRuntime::new();
    runtime.set_call_delay(Duration::from_millis(1));
    let generator = runtime.define_generator(fixtures::stack_generator());
    let aliases: Vec<_> = (0..THREADS).map(|_| runtime.alias(generator)).collect();
    let binding = R6Binding::new(runtime.clone()).unwrap();
    let barrier = Barrier::new(THREADS);

    let classes: Vec<ClassRef> = thread::scope(|s| {
        let workers: Vec<_> = aliases
            .iter()
            .map(|&handle| {
                let binding = &binding;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    binding
                        .wrap_class_generator(handle)
                        .unwrap()
                        .user_class()
                        .clone()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    for class in &classes[1..] {
        assert!(ProxyClass::same(&classes[0], class));
    }
    assert_eq!(binding.classmap().len(), 1);
    assert_eq!(runtime.max_in_flight(), 1);
}

#[test]
fn test_proxy_calls_never_overlap() {
    let runtime = MockRuntime::new();
    runtime.set_call_delay(Duration::from_millis(1));
    let generator = runtime.define_generator(fixtures::counter_generator());
    let binding = Arc::new(R6Binding::new(runtime.clone()).unwrap());
    let counter = binding.wrap_class_generator(generator).unwrap();

    let objects: Vec<_> = (0..THREADS)
        .map(|_| counter.new(&CallArgs::none()).unwrap())
        .collect();

    thread::scope(|s| {
        for object in &objects {
            s.spawn(move || {
                for _ in 0..5 {
                    object.call("add", &CallArgs::none()).unwrap();
                    object.get("count").unwrap();
                }
            });
        }
    });

    for object in &objects {
        assert_eq!(object.get("count").unwrap(), ForeignValue::Integer(5));
    }
    assert_eq!(runtime.invocation_count("add"), THREADS * 5);
    assert_eq!(runtime.max_in_flight(), 1);
}

#[test]
fn test_shared_instance_across_threads() {
    let runtime = MockRuntime::new();
    let generator = runtime.define_generator(fixtures::counter_generator());
    let binding = R6Binding::new(runtime.clone()).unwrap();
    let counter = binding
        .wrap_class_generator(generator)
        .unwrap()
        .new(&CallArgs::none())
        .unwrap();

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| counter.call("add", &CallArgs::none()).unwrap());
        }
    });

    // Each add is a single foreign call, so increments are not lost.
    assert_eq!(counter.get("count").unwrap(), ForeignValue::Integer(THREADS as i64));
}
