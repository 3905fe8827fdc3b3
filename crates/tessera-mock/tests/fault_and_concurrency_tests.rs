//! Fault propagation and concurrent recording

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tessera_mock::{any, completed, eq, Fault, MockBuilder, MockError, ProxyFactory};
use tessera_test_utils::{Calculator, MathFault};

#[test]
fn fault_reaches_result_returning_member_as_err() {
    let mut calculator = MockBuilder::<dyn Calculator>::new();
    calculator
        .given("divide", [eq(1), eq(0)])
        .unwrap()
        .then_throws(MathFault::DivideByZero)
        .unwrap();
    let mock = calculator.build();

    assert_eq!(mock.proxy.divide(1, 0), Err(MathFault::DivideByZero));
    mock.verifier.should_have_been_called("divide").unwrap();
    mock.verifier
        .should_have_been_called_times("divide", 1)
        .unwrap();
}

#[test]
fn prebuilt_fault_reaches_result_returning_member_as_err() {
    let mut calculator = MockBuilder::<dyn Calculator>::new();
    calculator
        .given("divide", [any::<i32>(), eq(0)])
        .unwrap()
        .then_throws(Fault::new(MathFault::DivideByZero))
        .unwrap();
    let mock = calculator.build();

    assert_eq!(mock.proxy.divide(1, 0), Err(MathFault::DivideByZero));
}

#[test]
fn fault_on_infallible_member_is_raised_unchanged() {
    let mut calculator = MockBuilder::<dyn Calculator>::new();
    calculator
        .given("add", [any::<i32>(), eq(0)])
        .unwrap()
        .then_throws(MathFault::Overflow)
        .unwrap();
    let mock = calculator.build();

    let proxy = Arc::clone(&mock.proxy);
    let payload = catch_unwind(AssertUnwindSafe(move || proxy.add(5, 0))).unwrap_err();

    assert_eq!(payload.downcast_ref::<MathFault>(), Some(&MathFault::Overflow));
    assert_eq!(mock.verifier.call_count("add"), 1);
}

#[test]
fn fault_of_foreign_type_is_raised_for_result_members() {
    let mut calculator = MockBuilder::<dyn Calculator>::new();
    calculator
        .given("divide", [any::<i32>(), any::<i32>()])
        .unwrap()
        .then_throws(String::from("disk on fire"))
        .unwrap();
    let mock = calculator.build();

    let proxy = Arc::clone(&mock.proxy);
    let payload = catch_unwind(AssertUnwindSafe(move || proxy.divide(1, 1))).unwrap_err();
    assert_eq!(
        payload.downcast_ref::<String>().map(String::as_str),
        Some("disk on fire")
    );
}

#[test]
fn configuration_errors_surface_at_call_time() {
    let mut calculator = MockBuilder::<dyn Calculator>::new();

    assert!(matches!(
        calculator.then_throws(MathFault::Overflow),
        Err(MockError::OrderingViolation {
            operation: "then_throws"
        })
    ));
    assert!(matches!(
        calculator.given("add", [any::<i64>(), any::<i64>()]),
        Err(MockError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        calculator.given("subtract", [any::<i32>(), any::<i32>()]),
        Err(MockError::UnknownMember { .. })
    ));
}

#[test]
fn shape_is_shared_across_mocks() {
    let first = MockBuilder::<dyn Calculator>::new().build();
    let second = MockBuilder::<dyn Calculator>::new().build();
    first.proxy.reset();

    assert!(Arc::ptr_eq(
        &ProxyFactory::shape::<dyn Calculator>(),
        &ProxyFactory::shape::<dyn Calculator>()
    ));
    assert_eq!(first.verifier.call_count("reset"), 1);
    assert_eq!(second.verifier.call_count("reset"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fifty_concurrent_deferred_calls_are_all_recorded() {
    let mut calculator = MockBuilder::<dyn Calculator>::new();
    calculator
        .given("multiply_async", [any::<i32>(), any::<i32>()])
        .unwrap()
        .then_returns(completed(99))
        .unwrap();
    let mock = calculator.build();

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let proxy = Arc::clone(&mock.proxy);
            tokio::spawn(async move { proxy.multiply_async(i, 2).await })
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await.unwrap());
    }

    assert_eq!(results.len(), 50);
    assert!(results.iter().all(|value| *value == 99));
    mock.verifier
        .should_have_been_called_times("multiply_async", 50)
        .unwrap();

    let mut firsts: Vec<i32> = mock
        .verifier
        .invocations_of("multiply_async")
        .iter()
        .filter_map(|record| record.args().get::<i32>(0).copied())
        .collect();
    firsts.sort_unstable();
    assert_eq!(firsts, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn unmatched_deferred_call_completes_with_neutral_value() {
    let mock = MockBuilder::<dyn Calculator>::new().build();
    assert_eq!(mock.proxy.multiply_async(3, 3).await, 0);
}

#[test]
fn concurrent_first_use_caches_one_shape() {
    let shapes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(ProxyFactory::shape::<dyn tessera_test_utils::Greeter>))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert!(shapes.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}
