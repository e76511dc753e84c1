//! Events and their timed variants.
//!
//! An [`Event`] is what processes synchronize on. A [`TimedEvent`] is the
//! same event announced `delay` virtual time units ahead. [`Proposal`] is
//! either of the two and is what statements carry in their request set.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub type Payload = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub payload: Payload,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), payload: Payload::new() }
    }

    /// Adds one payload field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Payload field as a string, if it is one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// The same event, due `delay` time units from now.
    pub fn after(self, delay: f64) -> TimedEvent {
        TimedEvent { event: self, delay }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.payload.is_empty() {
            let fields: Vec<String> = self.payload.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            write!(f, " {{{}}}", fields.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    pub event: Event,
    pub delay: f64,
}

impl TimedEvent {
    pub fn new(delay: f64, event: Event) -> Self {
        Self { event, delay }
    }

    pub fn to_now(&self) -> Event {
        self.event.clone()
    }
}

impl PartialEq for TimedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event && self.delay == other.delay
    }
}

impl fmt::Display for TimedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} t={:.2}", self.event, self.delay)
    }
}

/// An entry of a statement's request set.
///
/// Deserializes from either `{"event": {..}, "delay": d}` or the flat
/// `{"name": .., "payload": {..}, "delay": d}`; without `delay` it is plain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, from = "ProposalDoc")]
pub enum Proposal {
    After(TimedEvent),
    Now(Event),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedDoc {
    event: Event,
    delay: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FlatDoc {
    name: String,
    #[serde(default)]
    payload: Payload,
    delay: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProposalDoc {
    Nested(NestedDoc),
    Flat(FlatDoc),
}

impl From<ProposalDoc> for Proposal {
    fn from(doc: ProposalDoc) -> Self {
        match doc {
            ProposalDoc::Nested(n) => Proposal::After(TimedEvent::new(n.delay, n.event)),
            ProposalDoc::Flat(f) => {
                let event = Event { name: f.name, payload: f.payload };
                match f.delay {
                    Some(delay) => Proposal::After(TimedEvent::new(delay, event)),
                    None => Proposal::Now(event),
                }
            }
        }
    }
}

impl Proposal {
    /// The underlying event, ignoring any delay.
    pub fn event(&self) -> &Event {
        match self {
            Proposal::Now(e) => e,
            Proposal::After(t) => &t.event,
        }
    }

    pub fn name(&self) -> &str {
        &self.event().name
    }

    /// Remaining delay; zero for plain events.
    pub fn delay(&self) -> f64 {
        match self {
            Proposal::Now(_) => 0.0,
            Proposal::After(t) => t.delay,
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, Proposal::After(_))
    }

    /// Drops the delay so the event can be compared against plain matchers.
    pub fn to_now(&self) -> Event {
        self.event().clone()
    }

    /// Returns this proposal as seen `dt` time units later.
    ///
    /// Plain events are unchanged. A timed event whose remaining delay falls
    /// to `epsilon` or below becomes plain.
    pub fn advance(&self, dt: f64, epsilon: f64) -> Proposal {
        match self {
            Proposal::Now(_) => self.clone(),
            Proposal::After(t) => {
                let remaining = t.delay - dt;
                if remaining <= epsilon {
                    Proposal::Now(t.to_now())
                } else {
                    Proposal::After(TimedEvent::new(remaining, t.event.clone()))
                }
            }
        }
    }
}

impl PartialEq for Proposal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Proposal::Now(a), Proposal::Now(b)) => a == b,
            (Proposal::After(a), Proposal::After(b)) => a == b,
            (Proposal::Now(a), Proposal::After(b)) | (Proposal::After(b), Proposal::Now(a)) => {
                b.delay == 0.0 && *a == b.event
            }
        }
    }
}

impl PartialEq<Event> for Proposal {
    fn eq(&self, other: &Event) -> bool {
        *self == Proposal::Now(other.clone())
    }
}

impl From<Event> for Proposal {
    fn from(e: Event) -> Self {
        Proposal::Now(e)
    }
}

impl From<TimedEvent> for Proposal {
    fn from(t: TimedEvent) -> Self {
        Proposal::After(t)
    }
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proposal::Now(e) => e.fmt(f),
            Proposal::After(t) => t.fmt(f),
        }
    }
}
