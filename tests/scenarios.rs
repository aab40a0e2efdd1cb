//! Integration tests covering the six concrete scenarios from the sinc
//! specification (spec §8 "Testable properties").

use sinc::{run_on_pool, Sinc};
use std::sync::Arc;

fn add_i64(acc: &mut i64, v: &i64) {
    *acc += v;
}

fn max_i32(acc: &mut i32, v: &i32) {
    if *v > *acc {
        *acc = *v;
    }
}

/// Scenario 1: sum of 1..=100, V=8, initial=0, op=+=, expect=100. Expected
/// result 5050.
#[test]
fn sum_of_1_to_100() {
    let sinc = Arc::new(Sinc::reduce(0i64, add_i64, 100));
    let tasks: Vec<_> = (1..=100i64)
        .map(|i| {
            let sinc = Arc::clone(&sinc);
            move || sinc.submit(Some(&i))
        })
        .collect();
    run_on_pool(tasks);

    assert_eq!(sinc.wait(), Some(5050));
}

/// Scenario 2: max over negatives. V=4 signed, initial=i32::MIN,
/// op=max, values {-7,-3,-11,-3,-2}, expect=5. Expected result -2.
#[test]
fn max_over_negatives() {
    let sinc = Arc::new(Sinc::reduce(i32::MIN, max_i32, 5));
    let values = [-7i32, -3, -11, -3, -2];
    let tasks: Vec<_> = values
        .into_iter()
        .map(|v| {
            let sinc = Arc::clone(&sinc);
            move || sinc.submit(Some(&v))
        })
        .collect();
    run_on_pool(tasks);

    assert_eq!(sinc.wait(), Some(-2));
}

/// Scenario 3: pure barrier. V=0, expect=1000; 1000 participants call
/// submit(nil). wait returns; no result copy.
#[test]
fn pure_barrier() {
    let sinc = Arc::new(Sinc::<()>::barrier(1000));
    let tasks: Vec<_> = (0..1000)
        .map(|_| {
            let sinc = Arc::clone(&sinc);
            move || sinc.submit(None)
        })
        .collect();
    run_on_pool(tasks);

    assert_eq!(sinc.wait(), None);
}

/// Scenario 4: fan-out fan-in with willspawn. init(expect=0); thread A
/// calls willspawn(10), spawns 10 tasks each submit(1) (int32 sum,
/// initial=0); wait returns 10.
#[test]
fn fan_out_fan_in_with_willspawn() {
    let sinc = Arc::new(Sinc::reduce(0i32, |acc: &mut i32, v: &i32| *acc += v, 0));

    sinc.willspawn(10);
    let one = 1i32;
    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let sinc = Arc::clone(&sinc);
            move || sinc.submit(Some(&one))
        })
        .collect();
    run_on_pool(tasks);

    assert_eq!(sinc.wait(), Some(10));
}

/// Scenario 5: reset and reuse. After scenario 1 completes, call
/// reset(expect=50), submit values 1..=50, wait. Expected result 1275.
#[test]
fn reset_and_reuse() {
    let sinc = Arc::new(Sinc::reduce(0i64, add_i64, 100));
    let first: Vec<_> = (1..=100i64)
        .map(|i| {
            let sinc = Arc::clone(&sinc);
            move || sinc.submit(Some(&i))
        })
        .collect();
    run_on_pool(first);
    assert_eq!(sinc.wait(), Some(5050));

    sinc.reset(50);
    let second: Vec<_> = (1..=50i64)
        .map(|i| {
            let sinc = Arc::clone(&sinc);
            move || sinc.submit(Some(&i))
        })
        .collect();
    run_on_pool(second);
    assert_eq!(sinc.wait(), Some(1275));
}

/// Scenario 6: multi-waiter. Scenario 1, but 8 threads call wait before the
/// last submit; after completion all 8 observe result=5050.
#[test]
fn multi_waiter_observes_consistent_result() {
    let sinc = Arc::new(Sinc::reduce(0i64, add_i64, 100));

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let sinc = Arc::clone(&sinc);
            std::thread::spawn(move || sinc.wait())
        })
        .collect();

    // Give the waiters a head start blocking on the latch before the
    // submissions land.
    std::thread::sleep(std::time::Duration::from_millis(10));

    let submitters: Vec<_> = (1..=100i64)
        .map(|i| {
            let sinc = Arc::clone(&sinc);
            move || sinc.submit(Some(&i))
        })
        .collect();
    run_on_pool(submitters);

    for handle in waiters {
        assert_eq!(handle.join().unwrap(), Some(5050));
    }
    assert_eq!(sinc.wait(), Some(5050));
}

/// Boundary: expect == 0 at creation completes immediately and yields the
/// initial value unchanged.
#[test]
fn zero_expect_completes_immediately_with_initial_value() {
    let sinc = Sinc::reduce(42i64, add_i64, 0);
    assert_eq!(sinc.wait(), Some(42));
}

/// P2 (counter conservation): outstanding() reflects init_expect plus
/// willspawn totals minus submits at every quiescent point.
#[test]
fn counter_conservation_across_willspawn_and_submit() {
    let sinc = Sinc::<()>::barrier(0);
    assert_eq!(sinc.outstanding(), 0);
    sinc.willspawn(3);
    assert_eq!(sinc.outstanding(), 3);
    sinc.submit(None);
    assert_eq!(sinc.outstanding(), 2);
    sinc.willspawn(5);
    assert_eq!(sinc.outstanding(), 7);
    for _ in 0..7 {
        sinc.submit(None);
    }
    assert_eq!(sinc.outstanding(), 0);
    assert_eq!(sinc.wait(), None);
}
