//! Event selection strategies.
//!
//! [`SimpleEventSelection`] is the plain rendezvous arbiter: it knows about
//! requests, blocks and priorities but nothing about time.
//! [`TimeAwareSelection`] wraps it with a virtual clock so that timed
//! requests become selectable only once they are the soonest due.

use crate::error::{GridError, GridResult};
use crate::event::{Event, Proposal};
use crate::statement::Statement;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Outcome of one selection round.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// An event was committed; this is its delay-free form.
    Event(Event),
    /// Nothing can be selected this round.
    Idle,
    /// The soonest candidate is due after the horizon.
    Horizon { next_due: f64 },
}

pub trait EventSelectionStrategy {
    fn is_satisfied(&self, event: &Event, statement: &Statement) -> bool {
        statement.requests_now(event) || statement.wait_for.matches(event)
    }

    fn selectable_events(&self, statements: &[Statement]) -> Vec<Proposal>;

    /// Picks exactly one of `candidates`, or `None` if it is empty.
    fn tie_break(&mut self, candidates: &[Proposal], statements: &[Statement]) -> Option<Proposal>;

    fn select(&mut self, statements: &mut [Statement], external: &mut VecDeque<Event>) -> Selection;

    /// Virtual time committed so far.
    fn elapsed(&self) -> f64 {
        0.0
    }
}

fn blocked(event: &Event, statements: &[Statement]) -> bool {
    statements.iter().any(|s| s.blocks(event))
}

/// Pops the first external event unless an active statement blocks it.
fn take_external(external: &mut VecDeque<Event>, statements: &[Statement]) -> Option<Event> {
    match external.front() {
        Some(e) if !blocked(e, statements) => external.pop_front(),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct SimpleEventSelection {
    rng: StdRng,
}

impl SimpleEventSelection {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for SimpleEventSelection {
    fn default() -> Self {
        Self::new(0)
    }
}

impl EventSelectionStrategy for SimpleEventSelection {
    fn selectable_events(&self, statements: &[Statement]) -> Vec<Proposal> {
        let mut out: Vec<Proposal> = Vec::new();
        for st in statements {
            for p in &st.request {
                if let Proposal::Now(e) = p {
                    if blocked(e, statements) {
                        continue;
                    }
                }
                if !out.contains(p) {
                    out.push(p.clone());
                }
            }
        }
        out
    }

    fn tie_break(&mut self, candidates: &[Proposal], statements: &[Statement]) -> Option<Proposal> {
        let rank = |c: &Proposal| {
            statements
                .iter()
                .filter(|s| s.request.contains(c))
                .map(|s| s.priority)
                .max()
                .unwrap_or(i32::MIN)
        };
        let top = candidates.iter().map(rank).max()?;
        let best: Vec<&Proposal> = candidates.iter().filter(|&c| rank(c) == top).collect();
        let idx = self.rng.gen_range(0..best.len());
        Some(best[idx].clone())
    }

    fn select(&mut self, statements: &mut [Statement], external: &mut VecDeque<Event>) -> Selection {
        let candidates = self.selectable_events(statements);
        if let Some(chosen) = self.tie_break(&candidates, statements) {
            return Selection::Event(chosen.to_now());
        }
        match take_external(external, statements) {
            Some(e) => Selection::Event(e),
            None => Selection::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub horizon: f64,
    /// Delays closer than this are simultaneous.
    pub epsilon: f64,
    /// Seeds the tie-break among simultaneous candidates.
    pub seed: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { horizon: 300.0, epsilon: DEFAULT_EPSILON, seed: 42 }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> GridResult<()> {
        positive("horizon", self.horizon)?;
        positive("epsilon", self.epsilon)
    }
}

fn positive(field: &'static str, value: f64) -> GridResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GridError::Configuration { field, value })
    }
}

enum Plan {
    Empty,
    Horizon { next_due: f64 },
    Due { next_dt: f64, ties: Vec<Proposal> },
}

/// Selection with a virtual clock.
///
/// Each round only the soonest-due candidates are offered to the base
/// strategy's tie-break. Committing one advances the clock by its delay and
/// ages every active request by the same amount.
#[derive(Debug, Clone)]
pub struct TimeAwareSelection<B = SimpleEventSelection> {
    base: B,
    horizon: f64,
    epsilon: f64,
    elapsed: f64,
}

impl TimeAwareSelection<SimpleEventSelection> {
    /// Default epsilon and seed.
    pub fn new(horizon: f64) -> GridResult<Self> {
        Self::from_config(&SelectionConfig { horizon, ..Default::default() })
    }

    pub fn from_config(config: &SelectionConfig) -> GridResult<Self> {
        Self::with_base(config.horizon, config.epsilon, SimpleEventSelection::new(config.seed))
    }
}

impl<B: EventSelectionStrategy> TimeAwareSelection<B> {
    pub fn with_base(horizon: f64, epsilon: f64, base: B) -> GridResult<Self> {
        positive("horizon", horizon)?;
        positive("epsilon", epsilon)?;
        Ok(Self { base, horizon, epsilon, elapsed: 0.0 })
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn plan(&self, statements: &[Statement]) -> Plan {
        let candidates: Vec<Proposal> = self
            .base
            .selectable_events(statements)
            .into_iter()
            .filter(|c| !blocked(&c.to_now(), statements))
            .collect();
        if candidates.is_empty() {
            return Plan::Empty;
        }

        let next_dt = candidates.iter().map(Proposal::delay).fold(f64::INFINITY, f64::min);
        // The clock is a running sum; an event due at the horizon may land a
        // rounding error past it.
        if self.elapsed + next_dt > self.horizon + self.epsilon {
            return Plan::Horizon { next_due: self.elapsed + next_dt };
        }

        let ties = candidates
            .into_iter()
            .filter(|c| (c.delay() - next_dt).abs() < self.epsilon)
            .collect();
        Plan::Due { next_dt, ties }
    }
}

impl<B: EventSelectionStrategy> EventSelectionStrategy for TimeAwareSelection<B> {
    fn is_satisfied(&self, event: &Event, statement: &Statement) -> bool {
        self.base.is_satisfied(event, statement)
    }

    fn selectable_events(&self, statements: &[Statement]) -> Vec<Proposal> {
        match self.plan(statements) {
            Plan::Due { ties, .. } => ties,
            Plan::Empty | Plan::Horizon { .. } => Vec::new(),
        }
    }

    fn tie_break(&mut self, candidates: &[Proposal], statements: &[Statement]) -> Option<Proposal> {
        self.base.tie_break(candidates, statements)
    }

    fn select(&mut self, statements: &mut [Statement], external: &mut VecDeque<Event>) -> Selection {
        match self.plan(statements) {
            Plan::Empty => match take_external(external, statements) {
                Some(e) => Selection::Event(e),
                None => Selection::Idle,
            },
            Plan::Horizon { next_due } => {
                debug!(elapsed = self.elapsed, next_due, horizon = self.horizon, "horizon reached");
                Selection::Horizon { next_due }
            }
            Plan::Due { next_dt, ties } => {
                trace!(next_dt, ties = ties.len(), "due candidates");
                let Some(chosen) = self.base.tie_break(&ties, statements) else {
                    return Selection::Idle;
                };
                self.elapsed += next_dt;
                for st in statements.iter_mut() {
                    st.advance(next_dt, self.epsilon);
                }
                Selection::Event(chosen.to_now())
            }
        }
    }

    fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
