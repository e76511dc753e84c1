//! Grid domain: component and line status, the context they live in, and
//! the reducer that keeps it in step with committed events.

use crate::error::ReducerFault;
use crate::event::{Event, Proposal};
use crate::matcher::EventSet;
use crate::traits::Reducer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Payload key naming the component an event is about.
pub const COMPONENT_KEY: &str = "c";
/// Payload key naming the line an event is about.
pub const LINE_KEY: &str = "l";

pub mod names {
    pub const ON: &str = "on";
    pub const OFF: &str = "off";
    pub const O_FAIL: &str = "o_fail";
    pub const D_FAIL: &str = "d_fail";
    pub const REQ_REPAIR: &str = "req_repair";
    pub const REPAIRED: &str = "repaired";
    pub const REQ_ON: &str = "req_on";
    pub const REQ_OFF: &str = "req_off";

    pub const LINE_FAIL: &str = "line_fail";
    pub const LINE_OFF: &str = "line_off";
    pub const LINE_ON: &str = "line_on";
    pub const LINE_OPERATIONAL: &str = "line_operational";
    pub const LINE_REQ_ON: &str = "line_req_on";
    pub const LINE_REQ_OFF: &str = "line_req_off";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    On,
    Off,
    Broken,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::On => "ON",
            Status::Off => "OFF",
            Status::Broken => "BROKEN",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Connection,
    Source,
    Shared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridComponent {
    pub name: String,
    pub kind: ComponentKind,
}

impl GridComponent {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self { name: name.into(), kind }
    }
}

impl fmt::Display for GridComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}) {}", self.kind, self.name)
    }
}

/// A named chain of components that only delivers power when all are on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpec {
    pub name: String,
    pub components: Vec<String>,
}

impl LineSpec {
    pub fn new<S: Into<String>>(name: impl Into<String>, components: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            components: components.into_iter().map(Into::into).collect(),
        }
    }
}

/// Status of every component and line. Everything starts `Off`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridContext {
    pub components: BTreeMap<String, Status>,
    pub lines: BTreeMap<String, Status>,
}

impl GridContext {
    pub fn new<A, B>(components: impl IntoIterator<Item = A>, lines: impl IntoIterator<Item = B>) -> Self
    where
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            components: components.into_iter().map(|c| (c.into(), Status::Off)).collect(),
            lines: lines.into_iter().map(|l| (l.into(), Status::Off)).collect(),
        }
    }

    pub fn component(&self, name: &str) -> Option<Status> {
        self.components.get(name).copied()
    }

    pub fn line(&self, name: &str) -> Option<Status> {
        self.lines.get(name).copied()
    }

    pub fn all_components(&self, names: &[String], status: Status) -> bool {
        names.iter().all(|n| self.component(n) == Some(status))
    }

    pub fn any_component(&self, names: &[String], status: Status) -> bool {
        names.iter().any(|n| self.component(n) == Some(status))
    }
}

pub fn component_event(component: &str, name: &str) -> Event {
    Event::new(name).with(COMPONENT_KEY, component)
}

/// A component event due after `delay`; plain when the delay is not positive.
pub fn component_proposal(component: &str, name: &str, delay: f64) -> Proposal {
    let event = component_event(component, name);
    if delay > 0.0 {
        event.after(delay).into()
    } else {
        event.into()
    }
}

pub fn line_event(line: &str, name: &str) -> Event {
    Event::new(name).with(LINE_KEY, line)
}

/// Exact events `names` for one component.
pub fn component_events(component: &str, names: &[&str]) -> EventSet {
    EventSet::events(names.iter().map(|n| component_event(component, n)))
}

/// Every event about any of `lines`.
pub fn lines_set(lines: &[String]) -> EventSet {
    EventSet::field_in(LINE_KEY, lines.iter().cloned())
}

fn component_transition(name: &str) -> Option<Status> {
    match name {
        names::O_FAIL | names::D_FAIL => Some(Status::Broken),
        names::OFF | names::REPAIRED => Some(Status::Off),
        names::ON => Some(Status::On),
        _ => None,
    }
}

fn line_transition(name: &str) -> Option<Status> {
    match name {
        names::LINE_FAIL => Some(Status::Broken),
        names::LINE_OFF | names::LINE_OPERATIONAL => Some(Status::Off),
        names::LINE_ON => Some(Status::On),
        _ => None,
    }
}

fn apply(
    table: &mut BTreeMap<String, Status>,
    kind: &str,
    id: &serde_json::Value,
    status: Status,
) -> Result<bool, ReducerFault> {
    let id = id
        .as_str()
        .ok_or_else(|| ReducerFault::new(format!("{kind} id must be a string, got {id}")))?;
    let slot = table
        .get_mut(id)
        .ok_or_else(|| ReducerFault::new(format!("unknown {kind} `{id}`")))?;
    debug!(kind, id, from = %slot, to = %status, "status update");
    *slot = status;
    Ok(true)
}

/// Applies component (`c`) and line (`l`) status transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridReducer;

impl Reducer<GridContext> for GridReducer {
    fn reduce(&mut self, ctx: &mut GridContext, event: &Event) -> Result<bool, ReducerFault> {
        if let Some(id) = event.get(COMPONENT_KEY) {
            return match component_transition(&event.name) {
                Some(status) => apply(&mut ctx.components, "component", id, status),
                None => Ok(false),
            };
        }
        if let Some(id) = event.get(LINE_KEY) {
            return match line_transition(&event.name) {
                Some(status) => apply(&mut ctx.lines, "line", id, status),
                None => Ok(false),
            };
        }
        Ok(false)
    }
}
