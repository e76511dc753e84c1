#![allow(dead_code)]

use gridsync_core::*;

/// Context used by script-only tests: the names of committed events.
pub type Log = Vec<String>;

pub type LogReducer = fn(&mut Log, &Event) -> Result<bool, ReducerFault>;

pub fn record(log: &mut Log, event: &Event) -> Result<bool, ReducerFault> {
    log.push(event.name.clone());
    Ok(true)
}

pub struct TestHarness {
    pub program: ContextualProgram<Log, LogReducer, TimeAwareSelection>,
}

impl TestHarness {
    pub fn new(horizon: f64) -> Self {
        Self::new_with_seed(horizon, 0)
    }

    pub fn new_with_seed(horizon: f64, seed: u64) -> Self {
        let strategy = TimeAwareSelection::from_config(&SelectionConfig {
            horizon,
            epsilon: DEFAULT_EPSILON,
            seed,
        })
        .unwrap();
        Self {
            program: ContextualProgram::new(Log::new(), record as LogReducer, Vec::new(), strategy),
        }
    }

    pub fn add(&mut self, name: &str, steps: Vec<Statement>) {
        self.program.add_thread(Box::new(Script::new(name, steps)));
    }

    pub fn run(&mut self) -> GridResult<RunReport<Log>> {
        self.program.run()
    }

    /// `(name, time)` of every committed event.
    pub fn committed(&self) -> Vec<(String, f64)> {
        self.program
            .history()
            .iter()
            .map(|e| (e.event.name.clone(), e.time))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.program.history().iter().map(|e| e.event.name.clone()).collect()
    }
}

pub fn request(name: &str) -> Statement {
    Statement::new().request(Event::new(name))
}

pub fn request_after(name: &str, delay: f64) -> Statement {
    Statement::new().request(Event::new(name).after(delay))
}

pub fn wait_for(name: &str) -> Statement {
    Statement::new().wait_for(EventSet::name(name))
}

/// Runs the default grid scenario with `seed` up to `horizon`.
pub fn run_grid(horizon: f64, seed: u64) -> (GridProgram, RunReport<GridContext>) {
    let mut cfg = ScenarioConfig::default();
    cfg.selection.horizon = horizon;
    cfg.selection.seed = seed;
    let mut program = cfg.build().unwrap();
    let report = program.run().unwrap();
    (program, report)
}
