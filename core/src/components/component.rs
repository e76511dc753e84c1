//! Per-component processes: failure in operation, repair, on-demand toggling
//! and restart after repair.

use super::ThreadParams;
use crate::error::GridResult;
use crate::event::Event;
use crate::grid::{component_event, component_events, component_proposal, names, GridContext, COMPONENT_KEY};
use crate::matcher::EventSet;
use crate::sampling::{bernoulli, exponential};
use crate::statement::Statement;
use crate::traits::BThread;
use rand::prelude::*;
use rand_distr::{Bernoulli, Exp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecayState {
    Stopped,
    Running,
}

/// While the component is on, schedules an in-operation failure after an
/// exponential delay. Switching off or failing on demand cancels it.
pub struct ComponentDecay {
    name: String,
    component: String,
    delay: Exp<f64>,
    rng: StdRng,
    state: DecayState,
}

impl ComponentDecay {
    pub fn new(component: &str, scale: f64, seed: u64) -> GridResult<Self> {
        Ok(Self {
            name: format!("decay:{component}"),
            component: component.to_string(),
            delay: exponential("in_operation_failure_rate", scale)?,
            rng: StdRng::seed_from_u64(seed),
            state: DecayState::Stopped,
        })
    }

    pub fn build(component: &str, params: &ThreadParams) -> GridResult<Self> {
        Self::new(component, params.rates.decay_scale(), params.seed)
    }

    fn wait_for_on(&mut self) -> Statement {
        self.state = DecayState::Stopped;
        Statement::new().wait_for(component_event(&self.component, names::ON))
    }
}

impl BThread<GridContext> for ComponentDecay {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &GridContext) -> Option<Statement> {
        Some(self.wait_for_on())
    }

    fn resume(&mut self, _event: &Event, _ctx: &GridContext) -> Option<Statement> {
        match self.state {
            DecayState::Stopped => {
                self.state = DecayState::Running;
                let delay = self.delay.sample(&mut self.rng);
                Some(
                    Statement::new()
                        .request(component_proposal(&self.component, names::O_FAIL, delay))
                        .wait_for(component_events(&self.component, &[names::D_FAIL, names::OFF])),
                )
            }
            DecayState::Running => Some(self.wait_for_on()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairState {
    Healthy,
    Requesting,
    Repairing,
}

/// After any failure, asks for repair and then completes it after an
/// exponential delay. Holds the component's toggles and failures while down.
pub struct ComponentRepair {
    name: String,
    component: String,
    duration: Exp<f64>,
    rng: StdRng,
    state: RepairState,
}

impl ComponentRepair {
    pub fn new(component: &str, scale: f64, seed: u64) -> GridResult<Self> {
        Ok(Self {
            name: format!("repair:{component}"),
            component: component.to_string(),
            duration: exponential("repair_rate", scale)?,
            rng: StdRng::seed_from_u64(seed),
            state: RepairState::Healthy,
        })
    }

    pub fn build(component: &str, params: &ThreadParams) -> GridResult<Self> {
        Self::new(component, params.rates.repair_scale(), params.seed)
    }

    fn held(&self) -> EventSet {
        component_events(&self.component, &[names::O_FAIL, names::ON, names::OFF])
    }
}

impl BThread<GridContext> for ComponentRepair {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &GridContext) -> Option<Statement> {
        self.state = RepairState::Healthy;
        Some(Statement::new().wait_for(
            EventSet::NameContains("fail".into()).and(EventSet::field(COMPONENT_KEY, self.component.as_str())),
        ))
    }

    fn resume(&mut self, _event: &Event, ctx: &GridContext) -> Option<Statement> {
        match self.state {
            RepairState::Healthy => {
                self.state = RepairState::Requesting;
                Some(
                    Statement::new()
                        .request(component_event(&self.component, names::REQ_REPAIR))
                        .block(self.held()),
                )
            }
            RepairState::Requesting => {
                self.state = RepairState::Repairing;
                let delay = self.duration.sample(&mut self.rng);
                Some(
                    Statement::new()
                        .request(component_proposal(&self.component, names::REPAIRED, delay))
                        .block(self.held()),
                )
            }
            RepairState::Repairing => self.start(ctx),
        }
    }
}

/// Turns `req_on`/`req_off` into `on`/`off`, or into `d_fail` with the
/// on-demand failure probability.
pub struct ComponentToggle {
    name: String,
    component: String,
    on_demand_failure: Bernoulli,
    rng: StdRng,
    switching: bool,
}

impl ComponentToggle {
    pub fn new(component: &str, failure_prob: f64, seed: u64) -> GridResult<Self> {
        Ok(Self {
            name: format!("toggle:{component}"),
            component: component.to_string(),
            on_demand_failure: bernoulli("on_demand_failure_prob", failure_prob)?,
            rng: StdRng::seed_from_u64(seed),
            switching: false,
        })
    }

    pub fn build(component: &str, params: &ThreadParams) -> GridResult<Self> {
        Self::new(component, params.rates.on_demand_failure_prob, params.seed)
    }
}

impl BThread<GridContext> for ComponentToggle {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &GridContext) -> Option<Statement> {
        self.switching = false;
        Some(Statement::new().wait_for(component_events(&self.component, &[names::REQ_ON, names::REQ_OFF])))
    }

    fn resume(&mut self, event: &Event, ctx: &GridContext) -> Option<Statement> {
        if self.switching {
            return self.start(ctx);
        }
        self.switching = true;
        let target = if event.name == names::REQ_ON { names::ON } else { names::OFF };
        let outcome = if self.on_demand_failure.sample(&mut self.rng) {
            names::D_FAIL
        } else {
            target
        };
        Some(Statement::new().request(component_event(&self.component, outcome)))
    }
}

/// Requests the component back on a fixed delay after each repair.
pub struct RestartComponent {
    name: String,
    component: String,
    delay: f64,
    pending: bool,
}

impl RestartComponent {
    pub fn new(component: &str, delay: f64) -> Self {
        Self {
            name: format!("restart:{component}"),
            component: component.to_string(),
            delay,
            pending: false,
        }
    }

    pub fn build(component: &str, params: &ThreadParams) -> GridResult<Self> {
        Ok(Self::new(component, params.rates.restart_delay))
    }
}

impl BThread<GridContext> for RestartComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &GridContext) -> Option<Statement> {
        self.pending = false;
        Some(Statement::new().wait_for(component_event(&self.component, names::REPAIRED)))
    }

    fn resume(&mut self, _event: &Event, ctx: &GridContext) -> Option<Statement> {
        if self.pending {
            return self.start(ctx);
        }
        self.pending = true;
        Some(Statement::new().request(component_proposal(&self.component, names::REQ_ON, self.delay)))
    }
}
