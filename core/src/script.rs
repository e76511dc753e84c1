//! Generic b-threads: a fixed statement list and a closure-driven process.

use crate::event::Event;
use crate::statement::Statement;
use crate::traits::BThread;
use std::collections::VecDeque;

/// Offers its statements in order, one per synchronization point.
#[derive(Debug, Clone)]
pub struct Script {
    name: String,
    steps: VecDeque<Statement>,
    received: Vec<Event>,
}

impl Script {
    pub fn new(name: impl Into<String>, steps: impl IntoIterator<Item = Statement>) -> Self {
        Self {
            name: name.into(),
            steps: steps.into_iter().collect(),
            received: Vec::new(),
        }
    }

    /// Events that resumed this script so far.
    pub fn received(&self) -> &[Event] {
        &self.received
    }
}

impl<C> BThread<C> for Script {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &C) -> Option<Statement> {
        self.steps.pop_front()
    }

    fn resume(&mut self, event: &Event, _ctx: &C) -> Option<Statement> {
        self.received.push(event.clone());
        self.steps.pop_front()
    }
}

/// A process whose next statement is computed by a closure. The closure
/// gets `None` on start and the resuming event afterwards.
pub struct FnThread<F> {
    name: String,
    step: F,
}

impl<F> FnThread<F> {
    pub fn new(name: impl Into<String>, step: F) -> Self {
        Self { name: name.into(), step }
    }
}

impl<C, F> BThread<C> for FnThread<F>
where
    F: FnMut(Option<&Event>, &C) -> Option<Statement>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, ctx: &C) -> Option<Statement> {
        (self.step)(None, ctx)
    }

    fn resume(&mut self, event: &Event, ctx: &C) -> Option<Statement> {
        (self.step)(Some(event), ctx)
    }
}
