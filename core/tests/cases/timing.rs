use crate::common::*;
use gridsync_core::*;

#[test]
fn test_tick_then_done_at_same_time() {
    let mut h = TestHarness::new(10.0);
    h.add("a", vec![request_after("tick", 5.0)]);
    h.add("b", vec![wait_for("tick"), request("done")]);

    let report = h.run().unwrap();

    assert_eq!(
        h.committed(),
        vec![("tick".to_string(), 5.0), ("done".to_string(), 5.0)]
    );
    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.elapsed, 5.0);
    assert!(h.program.active_threads().is_empty());
}

#[test]
fn test_request_beyond_horizon_never_commits() {
    let mut h = TestHarness::new(5.0);
    h.add("a", vec![request_after("x", 10.0)]);

    let report = h.run().unwrap();

    assert!(h.committed().is_empty());
    assert_eq!(report.termination, Termination::HorizonReached);
    assert_eq!(report.elapsed, 0.0);
    assert!(h.program.diagnostics().is_empty());
}

#[test]
fn test_permanent_block_deadlocks() {
    let mut h = TestHarness::new(100.0);
    h.add("a", vec![Statement::new().block(EventSet::name("fail"))]);
    h.add("b", vec![request("fail")]);

    let err = h.run().unwrap_err();

    match err {
        GridError::DeadlockNoProgress { elapsed, count, pending } => {
            assert_eq!(elapsed, 0.0);
            assert_eq!(count, 1);
            assert_eq!(pending, vec!["fail".to_string()]);
        }
        other => panic!("expected deadlock, got {other:?}"),
    }
    assert!(h.committed().is_empty());
    // The error is sticky.
    assert!(h.program.next_event().is_err());
}

#[test]
fn test_deadlock_after_alternatives_run_out() {
    let mut h = TestHarness::new(100.0);
    h.add("a", vec![Statement::new().block(EventSet::name("fail"))]);
    h.add("b", vec![request("fail")]);
    h.add("c", vec![request_after("other", 3.0)]);

    assert!(matches!(h.run(), Err(GridError::DeadlockNoProgress { .. })));
    assert_eq!(h.committed(), vec![("other".to_string(), 3.0)]);
}

#[test]
fn test_interleaved_delays_commit_in_time_order() {
    let mut h = TestHarness::new(100.0);
    h.add("slow", vec![request_after("s1", 7.0), request_after("s2", 7.0)]);
    h.add("fast", vec![request_after("f1", 2.0), request_after("f2", 2.0), request_after("f3", 2.0)]);

    h.run().unwrap();

    assert_eq!(
        h.committed(),
        vec![
            ("f1".to_string(), 2.0),
            ("f2".to_string(), 4.0),
            ("f3".to_string(), 6.0),
            ("s1".to_string(), 7.0),
            ("s2".to_string(), 14.0),
        ]
    );
}

#[test]
fn test_same_event_different_delays_satisfy_separately() {
    let mut h = TestHarness::new(100.0);
    h.add("early", vec![request_after("tick", 5.0), request("early_done")]);
    h.add("late", vec![request_after("tick", 7.0), request("late_done")]);

    h.run().unwrap();

    assert_eq!(
        h.committed(),
        vec![
            ("tick".to_string(), 5.0),
            ("early_done".to_string(), 5.0),
            ("tick".to_string(), 7.0),
            ("late_done".to_string(), 7.0),
        ]
    );
}

#[test]
fn test_shared_request_satisfies_both_requesters() {
    let mut h = TestHarness::new(100.0);
    h.add("a", vec![request_after("sync", 4.0), request("a_next")]);
    h.add("b", vec![request_after("sync", 4.0), request_after("b_next", 1.0)]);

    h.run().unwrap();

    assert_eq!(
        h.committed(),
        vec![
            ("sync".to_string(), 4.0),
            ("a_next".to_string(), 4.0),
            ("b_next".to_string(), 5.0),
        ]
    );
}

#[test]
fn test_horizon_reached_keeps_last_clock() {
    let mut h = TestHarness::new(10.0);
    h.add("a", vec![request_after("x", 4.0), request_after("y", 4.0), request_after("z", 4.0)]);

    let report = h.run().unwrap();

    assert_eq!(h.names(), vec!["x", "y"]);
    assert_eq!(report.termination, Termination::HorizonReached);
    assert_eq!(report.elapsed, 8.0);
    // Further steps keep reporting the same completion.
    assert_eq!(h.program.next_event().unwrap(), Step::Finished(Termination::HorizonReached));
}

#[test]
fn test_event_due_at_horizon_after_fractional_delays() {
    let mut h = TestHarness::new(0.3);
    h.add("a", vec![request_after("x", 0.1), request_after("y", 0.1), request_after("z", 0.1)]);

    let report = h.run().unwrap();

    assert_eq!(h.names(), vec!["x", "y", "z"]);
    assert_eq!(report.termination, Termination::Exhausted);
    assert!((report.elapsed - 0.3).abs() <= DEFAULT_EPSILON);
}

#[test]
fn test_event_past_horizon_by_more_than_epsilon_is_dropped() {
    let mut h = TestHarness::new(1.0);
    h.add("a", vec![request_after("x", 1.0 + 2.0 * DEFAULT_EPSILON)]);

    let report = h.run().unwrap();

    assert!(h.committed().is_empty());
    assert_eq!(report.termination, Termination::HorizonReached);
}
