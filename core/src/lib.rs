//! Behavioral-programming kernel with a virtual clock, and a grid
//! failure/repair model built on it.
//!
//! b-threads offer [`Statement`]s; [`TimeAwareSelection`] picks the soonest
//! due event each round; [`ContextualProgram`] commits it, folds it into the
//! context and resumes the processes it satisfies.

pub mod analytics;
pub mod components;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod listener;
pub mod matcher;
pub mod sampling;
pub mod scenario;
pub mod script;
pub mod selection;
pub mod statement;
pub mod traits;

pub use analytics::{OutageCollector, OutageSummary};
pub use components::{FailureRates, ThreadParams};
pub use engine::{ContextualProgram, RunReport, Step, Termination, TraceEntry};
pub use error::{GridError, GridResult, ReducerFault};
pub use event::{Event, Payload, Proposal, TimedEvent};
pub use grid::{ComponentKind, GridComponent, GridContext, GridReducer, LineSpec, Status};
pub use listener::TracingListener;
pub use matcher::EventSet;
pub use scenario::{GridProgram, ScenarioConfig};
pub use script::{FnThread, Script};
pub use selection::{
    EventSelectionStrategy, Selection, SelectionConfig, SimpleEventSelection, TimeAwareSelection,
    DEFAULT_EPSILON,
};
pub use statement::Statement;
pub use traits::{BThread, ProgramListener, Reducer};
