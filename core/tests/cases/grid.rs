use gridsync_core::components::line::LineStatus;
use gridsync_core::grid::{component_event, line_event, names};
use gridsync_core::*;

fn program_with(threads: Vec<Box<dyn BThread<GridContext>>>, horizon: f64) -> GridProgram {
    let strategy = TimeAwareSelection::from_config(&SelectionConfig { horizon, ..Default::default() }).unwrap();
    ContextualProgram::new(
        GridContext::new(["grid", "cb_up_1"], ["l1"]),
        GridReducer,
        threads,
        strategy,
    )
}

fn request_component(c: &str, name: &str) -> Statement {
    Statement::new().request(component_event(c, name))
}

#[test]
fn test_line_goes_operational_after_repair() {
    let driver = Script::new(
        "driver",
        vec![
            request_component("grid", names::ON),
            request_component("cb_up_1", names::ON),
            request_component("grid", names::O_FAIL),
            request_component("grid", names::REPAIRED),
        ],
    );
    let status = LineStatus::new(LineSpec::new("l1", ["grid", "cb_up_1"]));
    let mut program = program_with(vec![Box::new(status), Box::new(driver)], 100.0);

    let report = program.run().unwrap();

    let names: Vec<&str> = program.history().iter().map(|e| e.event.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            names::ON,
            names::ON,
            names::LINE_ON,
            names::O_FAIL,
            names::LINE_FAIL,
            names::REPAIRED,
            names::LINE_OPERATIONAL,
        ]
    );
    assert_eq!(program.history()[6].event, line_event("l1", names::LINE_OPERATIONAL));
    // Operational means repaired but not running.
    assert_eq!(report.context.line("l1"), Some(Status::Off));
    assert_eq!(report.context.component("grid"), Some(Status::Off));
    assert_eq!(report.context.component("cb_up_1"), Some(Status::On));
    assert_eq!(report.termination, Termination::Exhausted);
}

#[test]
fn test_unknown_component_is_a_reducer_fault() {
    let driver = Script::new(
        "driver",
        vec![request_component("grid", names::ON), request_component("ghost", names::ON)],
    );
    let mut program = program_with(vec![Box::new(driver)], 100.0);

    let err = program.run().unwrap_err();

    assert!(matches!(err, GridError::ReducerFault { ref event, .. } if event.contains("ghost")));
    assert_eq!(program.context().component("grid"), Some(Status::On));
    assert_eq!(program.history().len(), 1);
}

#[test]
fn test_requests_are_committed_without_changing_context() {
    let driver = Script::new("driver", vec![request_component("grid", names::REQ_ON)]);
    let mut program = program_with(vec![Box::new(driver)], 100.0);

    let report = program.run().unwrap();

    assert_eq!(report.committed, 1);
    assert_eq!(report.context, GridContext::new(["grid", "cb_up_1"], ["l1"]));
}

#[test]
fn test_default_scenario_starts_first_line() {
    let mut cfg = ScenarioConfig::default();
    cfg.rates.on_demand_failure_prob = 0.0;
    cfg.rates.in_operation_failure_rate = 1e-9;
    cfg.selection.horizon = 100.0;
    let mut program = cfg.build().unwrap();

    let report = program.run().unwrap();

    assert_eq!(report.termination, Termination::HorizonReached);
    assert_eq!(report.elapsed, 0.0);
    assert!(program.history().iter().all(|e| e.time == 0.0));
    let ctx = &report.context;
    assert_eq!(ctx.component("grid"), Some(Status::On));
    assert_eq!(ctx.component("cb_up_1"), Some(Status::On));
    assert_eq!(ctx.component("transfo1"), Some(Status::Off));
    assert_eq!(ctx.line("l1"), Some(Status::On));
    assert_eq!(ctx.line("l2"), Some(Status::Off));
    assert_eq!(program.history().last().map(|e| e.event.clone()), Some(line_event("l1", names::LINE_ON)));
}

#[test]
fn test_failed_line_is_switched_off_and_restarted() {
    let mut cfg = ScenarioConfig::default();
    cfg.rates.on_demand_failure_prob = 0.0;
    cfg.selection.horizon = 20_000.0;
    cfg.selection.seed = 11;
    let mut program = cfg.build().unwrap();

    program.run().unwrap();

    let history = program.history();
    let first_fail = history
        .iter()
        .position(|e| e.event == line_event("l1", names::LINE_FAIL))
        .expect("l1 should fail within the horizon");
    let after: Vec<&Event> = history[first_fail..].iter().map(|e| &e.event).collect();
    // The line is switched off component by component.
    assert!(after.contains(&&component_event("grid", names::REQ_OFF)));
    assert!(after.contains(&&component_event("cb_up_1", names::REQ_OFF)));
    assert!(after.iter().any(|e| e.name == names::REPAIRED));
}

#[test]
fn test_outage_collector_over_a_run() {
    let mut cfg = ScenarioConfig::default();
    cfg.selection.horizon = 20_000.0;
    cfg.selection.seed = 5;
    let mut program = cfg.build().unwrap();
    let report = program.run().unwrap();

    let mut outages = OutageCollector::new().unwrap();
    outages.observe_all(program.history());
    outages.finish(report.elapsed);
    let summary = outages.summary();

    assert!(summary.component_failures > 0);
    assert!(summary.line_failures > 0);
    let availability = outages.availability("l1", report.elapsed);
    assert!((0.0..=1.0).contains(&availability));
}
