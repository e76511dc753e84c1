//! The program wrapper: drives b-threads through the selection strategy
//! and mirrors every committed event into a context.

use crate::error::{GridError, GridResult};
use crate::event::Event;
use crate::selection::{EventSelectionStrategy, Selection};
use crate::statement::Statement;
use crate::traits::{BThread, ProgramListener, Reducer};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, warn};

/// One committed event and the virtual time it was committed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub seq: u64,
    pub time: f64,
    pub event: Event,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[t={:.2} #{}] {}", self.time, self.seq, self.event)
    }
}

/// Clean ways for a run to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The next due event lies beyond the horizon.
    HorizonReached,
    /// No process requests anything any more.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Committed(TraceEntry),
    Finished(Termination),
}

#[derive(Debug, Clone)]
pub struct RunReport<C> {
    pub termination: Termination,
    pub elapsed: f64,
    pub committed: usize,
    pub context: C,
}

struct Slot<C> {
    thread: Box<dyn BThread<C>>,
    /// `None` while paused by a malformed statement.
    statement: Option<Statement>,
}

/// Checks a freshly produced statement. Malformed ones are recorded and
/// dropped so the process sits out instead of failing the round.
fn admit(name: &str, statement: Statement, diagnostics: &mut Vec<GridError>) -> Option<Statement> {
    match statement.validate() {
        Ok(()) => Some(statement),
        Err(reason) => {
            let err = GridError::MalformedStatement { thread: name.to_string(), reason };
            warn!(error = %err, "pausing process");
            diagnostics.push(err);
            None
        }
    }
}

pub struct ContextualProgram<C, R, S> {
    context: C,
    reducer: R,
    strategy: S,
    slots: Vec<Slot<C>>,
    joining: Vec<Box<dyn BThread<C>>>,
    leaving: Vec<String>,
    external: VecDeque<Event>,
    listeners: Vec<Box<dyn ProgramListener>>,
    history: Vec<TraceEntry>,
    diagnostics: Vec<GridError>,
    started: bool,
    finished: Option<Termination>,
    fault: Option<GridError>,
}

impl<C, R, S> ContextualProgram<C, R, S>
where
    C: Clone,
    R: Reducer<C>,
    S: EventSelectionStrategy,
{
    pub fn new(context: C, reducer: R, threads: Vec<Box<dyn BThread<C>>>, strategy: S) -> Self {
        Self {
            context,
            reducer,
            strategy,
            slots: Vec::new(),
            joining: threads,
            leaving: Vec::new(),
            external: VecDeque::new(),
            listeners: Vec::new(),
            history: Vec::new(),
            diagnostics: Vec::new(),
            started: false,
            finished: None,
            fault: None,
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn ProgramListener>) {
        self.listeners.push(listener);
    }

    /// Queues a process; it joins at the next round boundary.
    pub fn add_thread(&mut self, thread: Box<dyn BThread<C>>) {
        self.joining.push(thread);
    }

    /// Queues removal of every process named `name` at the next round boundary.
    pub fn remove_thread(&mut self, name: impl Into<String>) {
        self.leaving.push(name.into());
    }

    pub fn push_external(&mut self, event: Event) {
        self.external.push_back(event);
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn elapsed(&self) -> f64 {
        self.strategy.elapsed()
    }

    pub fn history(&self) -> &[TraceEntry] {
        &self.history
    }

    pub fn diagnostics(&self) -> &[GridError] {
        &self.diagnostics
    }

    /// Names of the processes currently taking part.
    pub fn active_threads(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.thread.name()).collect()
    }

    fn apply_membership(&mut self) {
        if !self.leaving.is_empty() {
            let leaving = std::mem::take(&mut self.leaving);
            self.slots.retain(|s| !leaving.iter().any(|n| n == s.thread.name()));
        }
        for mut thread in std::mem::take(&mut self.joining) {
            let Some(statement) = thread.start(&self.context) else {
                continue;
            };
            let statement = admit(thread.name(), statement, &mut self.diagnostics);
            self.slots.push(Slot { thread, statement });
        }
    }

    fn finish(&mut self, termination: Termination) -> Step {
        self.finished = Some(termination);
        for l in self.listeners.iter_mut() {
            l.on_end(&termination);
        }
        Step::Finished(termination)
    }

    fn fail(&mut self, err: GridError) -> GridError {
        self.fault = Some(err.clone());
        err
    }

    /// Runs one round: select, commit, reduce, resume.
    pub fn next_event(&mut self) -> GridResult<Step> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        if let Some(termination) = self.finished {
            return Ok(Step::Finished(termination));
        }

        self.apply_membership();
        if !self.started {
            self.started = true;
            for l in self.listeners.iter_mut() {
                l.on_start();
            }
        }

        let (owners, mut statements): (Vec<usize>, Vec<Statement>) = self
            .slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.statement.take().map(|st| (i, st)))
            .unzip();
        let selection = self.strategy.select(&mut statements, &mut self.external);
        for (i, st) in owners.into_iter().zip(statements) {
            self.slots[i].statement = Some(st);
        }

        let event = match selection {
            Selection::Event(event) => event,
            Selection::Horizon { .. } => return Ok(self.finish(Termination::HorizonReached)),
            Selection::Idle => {
                let pending: Vec<String> = self
                    .slots
                    .iter()
                    .filter_map(|s| s.statement.as_ref())
                    .flat_map(|st| st.request.iter().map(|p| p.to_string()))
                    .collect();
                if pending.is_empty() {
                    return Ok(self.finish(Termination::Exhausted));
                }
                let err = GridError::DeadlockNoProgress {
                    elapsed: self.strategy.elapsed(),
                    count: pending.len(),
                    pending,
                };
                return Err(self.fail(err));
            }
        };

        let mut scratch = self.context.clone();
        match self.reducer.reduce(&mut scratch, &event) {
            Ok(true) => self.context = scratch,
            Ok(false) => {}
            Err(source) => {
                let err = GridError::ReducerFault {
                    event: event.to_string(),
                    time: self.strategy.elapsed(),
                    source,
                };
                return Err(self.fail(err));
            }
        }

        let entry = TraceEntry {
            seq: self.history.len() as u64,
            time: self.strategy.elapsed(),
            event,
        };
        self.history.push(entry.clone());
        for l in self.listeners.iter_mut() {
            l.on_event(&entry);
        }

        let strategy = &self.strategy;
        let context = &self.context;
        let diagnostics = &mut self.diagnostics;
        let event = &entry.event;
        self.slots.retain_mut(|slot| {
            let satisfied = slot
                .statement
                .as_ref()
                .is_some_and(|st| strategy.is_satisfied(event, st));
            if !satisfied {
                return true;
            }
            match slot.thread.resume(event, context) {
                Some(next) => {
                    slot.statement = admit(slot.thread.name(), next, diagnostics);
                    true
                }
                None => {
                    debug!(thread = slot.thread.name(), "process finished");
                    false
                }
            }
        });

        Ok(Step::Committed(entry))
    }

    /// Steps until the run finishes.
    pub fn run(&mut self) -> GridResult<RunReport<C>> {
        loop {
            if let Step::Finished(termination) = self.next_event()? {
                return Ok(RunReport {
                    termination,
                    elapsed: self.elapsed(),
                    committed: self.history.len(),
                    context: self.context.clone(),
                });
            }
        }
    }
}
