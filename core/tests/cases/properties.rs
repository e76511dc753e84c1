use crate::common::*;
use gridsync_core::*;

#[test]
fn test_commit_times_never_decrease() {
    for seed in [1, 7, 42, 1234] {
        let (program, report) = run_grid(2000.0, seed);
        let history = program.history();
        assert!(!history.is_empty());
        for (i, pair) in history.windows(2).enumerate() {
            assert!(
                pair[0].time <= pair[1].time,
                "seed {seed}: entry {i} at {} is after entry {} at {}",
                pair[0].time,
                i + 1,
                pair[1].time
            );
        }
        for (i, entry) in history.iter().enumerate() {
            assert_eq!(entry.seq, i as u64);
            assert!(entry.time <= 2000.0 + DEFAULT_EPSILON);
        }
        assert!(report.elapsed <= 2000.0 + DEFAULT_EPSILON);
    }
}

#[test]
fn test_context_is_the_fold_of_history() {
    for seed in [3, 99] {
        let (program, report) = run_grid(5000.0, seed);

        let mut replayed = ScenarioConfig::default().context();
        let mut reducer = GridReducer;
        for entry in program.history() {
            reducer.reduce(&mut replayed, &entry.event).unwrap();
        }

        assert_eq!(&replayed, program.context());
        assert_eq!(replayed, report.context);
    }
}

#[test]
fn test_same_seed_same_trace() {
    let (a, ra) = run_grid(3000.0, 2024);
    let (b, rb) = run_grid(3000.0, 2024);
    assert_eq!(a.history(), b.history());
    assert_eq!(ra.context, rb.context);
    assert_eq!(ra.termination, rb.termination);
}

#[test]
fn test_different_seeds_diverge() {
    let (a, _) = run_grid(5000.0, 1);
    let (b, _) = run_grid(5000.0, 2);
    assert_ne!(a.history(), b.history());
}

#[test]
fn test_committed_event_carries_no_delay() {
    let mut h = TestHarness::new(20.0);
    h.add("a", vec![request_after("tick", 5.0)]);
    // Waiting for the exact plain event only works if the commit is delay-free.
    h.add(
        "b",
        vec![Statement::new().wait_for(EventSet::events([Event::new("tick")])), request("seen")],
    );

    h.run().unwrap();

    assert_eq!(h.names(), vec!["tick", "seen"]);
}

#[test]
fn test_blocked_request_keeps_aging() {
    let mut h = TestHarness::new(100.0);
    h.add("a", vec![request_after("fail", 1.0)]);
    h.add("b", vec![request_after("ok", 3.0)]);
    // Blocks `fail` until `ok` has happened.
    h.add(
        "c",
        vec![Statement::new().block(EventSet::name("fail")).wait_for(EventSet::name("ok"))],
    );

    h.run().unwrap();

    // `fail` became due at t=1 but could only commit once the block lifted.
    assert_eq!(
        h.committed(),
        vec![("ok".to_string(), 3.0), ("fail".to_string(), 3.0)]
    );
}

#[test]
fn test_priority_orders_simultaneous_requests() {
    let mut h = TestHarness::new(100.0);
    h.add("low", vec![Statement::new().request(Event::new("low")).priority(1)]);
    h.add("high", vec![Statement::new().request(Event::new("high")).priority(5)]);

    h.run().unwrap();

    assert_eq!(h.names(), vec!["high", "low"]);
}

#[test]
fn test_priority_does_not_beat_the_clock() {
    let mut h = TestHarness::new(100.0);
    h.add("urgent", vec![Statement::new().request(Event::new("urgent").after(2.0)).priority(100)]);
    h.add("plain", vec![request_after("plain", 1.0)]);

    h.run().unwrap();

    assert_eq!(
        h.committed(),
        vec![("plain".to_string(), 1.0), ("urgent".to_string(), 2.0)]
    );
}

#[test]
fn test_seed_decides_ties() {
    let order = |seed| {
        let mut h = TestHarness::new_with_seed(100.0, seed);
        for name in ["a", "b", "c", "d", "e"] {
            h.add(name, vec![request_after(name, 1.0)]);
        }
        h.run().unwrap();
        h.names()
    };

    assert_eq!(order(5), order(5));
    let mut sorted = order(5);
    sorted.sort();
    assert_eq!(sorted, vec!["a", "b", "c", "d", "e"]);
    // Every tied event still commits at the same instant.
    let mut h = TestHarness::new_with_seed(100.0, 5);
    for name in ["a", "b", "c"] {
        h.add(name, vec![request_after(name, 1.0)]);
    }
    h.run().unwrap();
    assert!(h.committed().iter().all(|(_, t)| *t == 1.0));
}

#[test]
fn test_clock_stays_within_horizon_over_many_small_steps() {
    let mut h = TestHarness::new(1.0);
    let steps: Vec<Statement> = (0..50).map(|i| request_after(&format!("s{i}"), 0.1)).collect();
    h.add("ticker", steps);

    let report = h.run().unwrap();

    let committed = h.committed();
    assert_eq!(committed.len(), 10);
    for pair in committed.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }
    assert!(committed.iter().all(|(_, t)| *t <= 1.0 + DEFAULT_EPSILON));
    assert_eq!(report.termination, Termination::HorizonReached);
    assert!((report.elapsed - 1.0).abs() <= DEFAULT_EPSILON);
}
