//! Grid scenario configuration and program assembly.

use crate::components::{
    create_component_thread, create_line_thread, line::InitLine, FailureRates, ThreadParams,
};
use crate::engine::ContextualProgram;
use crate::error::{GridError, GridResult};
use crate::grid::{ComponentKind, GridComponent, GridContext, GridReducer, LineSpec};
use crate::selection::{SelectionConfig, TimeAwareSelection};
use crate::traits::BThread;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

pub type GridProgram = ContextualProgram<GridContext, GridReducer, TimeAwareSelection>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub selection: SelectionConfig,
    pub rates: FailureRates,
    pub components: Vec<GridComponent>,
    pub lines: Vec<LineSpec>,
    /// Thread kinds attached to every component.
    pub component_threads: Vec<String>,
    /// Thread kinds attached to every line.
    pub line_threads: Vec<String>,
    /// Line requested on at start.
    pub initial_line: Option<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            rates: FailureRates::default(),
            components: vec![
                GridComponent::new("grid", ComponentKind::Shared),
                GridComponent::new("cb_up_1", ComponentKind::Connection),
                GridComponent::new("transfo1", ComponentKind::Source),
            ],
            lines: vec![
                LineSpec::new("l1", ["grid", "cb_up_1"]),
                LineSpec::new("l2", ["grid", "transfo1"]),
            ],
            component_threads: vec!["decay".into(), "repair".into(), "toggle".into()],
            line_threads: vec![
                "status".into(),
                "restart".into(),
                "disable_on_fail".into(),
                "start".into(),
            ],
            initial_line: Some("l1".into()),
        }
    }
}

fn invalid(msg: impl Into<String>) -> GridError {
    GridError::InvalidScenario(msg.into())
}

impl ScenarioConfig {
    pub fn from_json(text: &str) -> GridResult<Self> {
        let config: ScenarioConfig = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> GridResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| invalid(e.to_string()))
    }

    pub fn validate(&self) -> GridResult<()> {
        self.selection.validate()?;

        let r = &self.rates;
        for (field, v) in [
            ("in_operation_failure_rate", r.in_operation_failure_rate),
            ("repair_rate", r.repair_rate),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(GridError::Configuration { field, value: v });
            }
        }
        if !(0.0..=1.0).contains(&r.on_demand_failure_prob) {
            return Err(GridError::Configuration {
                field: "on_demand_failure_prob",
                value: r.on_demand_failure_prob,
            });
        }
        if !(r.restart_delay.is_finite() && r.restart_delay >= 0.0) {
            return Err(GridError::Configuration { field: "restart_delay", value: r.restart_delay });
        }

        if self.components.is_empty() {
            return Err(invalid("no components"));
        }
        let mut names = BTreeSet::new();
        for c in &self.components {
            if !names.insert(c.name.as_str()) {
                return Err(invalid(format!("duplicate component `{}`", c.name)));
            }
        }
        let mut line_names = BTreeSet::new();
        for line in &self.lines {
            if !line_names.insert(line.name.as_str()) {
                return Err(invalid(format!("duplicate line `{}`", line.name)));
            }
            if line.components.is_empty() {
                return Err(invalid(format!("line `{}` has no components", line.name)));
            }
            if let Some(c) = line.components.iter().find(|c| !names.contains(c.as_str())) {
                return Err(invalid(format!("line `{}` uses unknown component `{c}`", line.name)));
            }
        }
        if let Some(l) = &self.initial_line {
            if !line_names.contains(l.as_str()) {
                return Err(invalid(format!("initial line `{l}` is not defined")));
            }
        }
        let params = ThreadParams { rates: self.rates, seed: 0 };
        let sample = LineSpec::new("sample", ["sample"]);
        for kind in &self.component_threads {
            create_component_thread(kind, "sample", &params)?;
        }
        for kind in &self.line_threads {
            create_line_thread(kind, &sample, &params)?;
        }
        Ok(())
    }

    pub fn context(&self) -> GridContext {
        GridContext::new(
            self.components.iter().map(|c| c.name.as_str()),
            self.lines.iter().map(|l| l.name.as_str()),
        )
    }

    /// Instantiates every configured process. Each one gets its own seed
    /// drawn in a fixed order from the scenario seed.
    pub fn threads(&self) -> GridResult<Vec<Box<dyn BThread<GridContext>>>> {
        let mut master = StdRng::seed_from_u64(self.selection.seed);
        let mut params = |rates: FailureRates| ThreadParams { rates, seed: master.gen() };
        let mut threads: Vec<Box<dyn BThread<GridContext>>> = Vec::new();

        for c in &self.components {
            for kind in &self.component_threads {
                threads.push(create_component_thread(kind, &c.name, &params(self.rates))?);
            }
        }
        for line in &self.lines {
            for kind in &self.line_threads {
                threads.push(create_line_thread(kind, line, &params(self.rates))?);
            }
        }
        if let Some(l) = &self.initial_line {
            threads.push(Box::new(InitLine::new(l)));
        }
        debug!(count = threads.len(), "scenario threads built");
        Ok(threads)
    }

    pub fn build(&self) -> GridResult<GridProgram> {
        self.validate()?;
        let strategy = TimeAwareSelection::from_config(&self.selection)?;
        Ok(ContextualProgram::new(self.context(), GridReducer, self.threads()?, strategy))
    }
}
