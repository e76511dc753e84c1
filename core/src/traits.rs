use crate::engine::{Termination, TraceEntry};
use crate::error::ReducerFault;
use crate::event::Event;
use crate::statement::Statement;

/// A sequential process synchronizing through statements.
///
/// The program calls `start` once, then `resume` every time the process's
/// current statement is satisfied by a committed event. Returning `None`
/// finishes the process.
pub trait BThread<C> {
    fn name(&self) -> &str;
    fn start(&mut self, ctx: &C) -> Option<Statement>;
    fn resume(&mut self, event: &Event, ctx: &C) -> Option<Statement>;
}

/// Folds committed events into the program context.
///
/// Must be total: events it does not know return `Ok(false)` and leave the
/// context untouched.
pub trait Reducer<C> {
    fn reduce(&mut self, ctx: &mut C, event: &Event) -> Result<bool, ReducerFault>;
}

impl<C, F> Reducer<C> for F
where
    F: FnMut(&mut C, &Event) -> Result<bool, ReducerFault>,
{
    fn reduce(&mut self, ctx: &mut C, event: &Event) -> Result<bool, ReducerFault> {
        (self)(ctx, event)
    }
}

/// Observes a running program. All methods default to no-ops.
pub trait ProgramListener {
    fn on_start(&mut self) {}
    fn on_event(&mut self, _entry: &TraceEntry) {}
    fn on_end(&mut self, _termination: &Termination) {}
}
