use crate::error::{GridError, GridResult};
use crate::grid::{GridContext, LineSpec};
use crate::traits::BThread;
use serde::{Deserialize, Serialize};

pub mod component;
pub mod line;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureRates {
    /// Failures per hour while running.
    pub in_operation_failure_rate: f64,
    /// Chance that a switch request fails instead.
    pub on_demand_failure_prob: f64,
    /// Repairs per hour.
    pub repair_rate: f64,
    pub restart_delay: f64,
}

impl Default for FailureRates {
    fn default() -> Self {
        Self {
            in_operation_failure_rate: 1e-3,
            on_demand_failure_prob: 0.1,
            repair_rate: 1.0,
            restart_delay: 10.0,
        }
    }
}

impl FailureRates {
    pub fn decay_scale(&self) -> f64 {
        1.0 / self.in_operation_failure_rate
    }

    pub fn repair_scale(&self) -> f64 {
        1.0 / self.repair_rate
    }
}

/// What a thread constructor gets besides its target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadParams {
    pub rates: FailureRates,
    pub seed: u64,
}

macro_rules! register_threads {
    ($create:ident, $kinds:ident, $target:ty, $what:literal, { $($kind:expr => $ctor:path),* $(,)? }) => {
        pub fn $create(
            kind: &str,
            target: $target,
            params: &ThreadParams,
        ) -> GridResult<Box<dyn BThread<GridContext>>> {
            match kind {
                $(
                    $kind => Ok(Box::new($ctor(target, params)?)),
                )*
                _ => Err(GridError::InvalidScenario(format!(concat!("unknown ", $what, " thread `{}`"), kind))),
            }
        }

        pub fn $kinds() -> Vec<&'static str> {
            vec![$($kind),*]
        }
    };
}

register_threads!(create_component_thread, component_thread_kinds, &str, "component", {
    "decay" => component::ComponentDecay::build,
    "repair" => component::ComponentRepair::build,
    "toggle" => component::ComponentToggle::build,
    "restart" => component::RestartComponent::build,
});

register_threads!(create_line_thread, line_thread_kinds, &LineSpec, "line", {
    "status" => line::LineStatus::build,
    "restart" => line::LineRelay::restart,
    "start" => line::LineRelay::start_on_request,
    "disable_on_fail" => line::LineRelay::disable_on_fail,
    "stop" => line::LineRelay::stop_on_request,
});
