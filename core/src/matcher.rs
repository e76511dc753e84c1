//! Inspectable event matchers used for wait-for and block sets.

use crate::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSet {
    #[default]
    Empty,
    All,
    Exact(Event),
    Name(String),
    NameIn(Vec<String>),
    NameContains(String),
    Field { key: String, value: Value },
    FieldIn { key: String, values: Vec<Value> },
    AnyOf(Vec<EventSet>),
    AllOf(Vec<EventSet>),
    Not(Box<EventSet>),
    AllExcept(Event),
}

impl EventSet {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EventSet::Empty => false,
            EventSet::All => true,
            EventSet::Exact(e) => e == event,
            EventSet::Name(n) => event.name == *n,
            EventSet::NameIn(ns) => ns.iter().any(|n| *n == event.name),
            EventSet::NameContains(s) => event.name.contains(s.as_str()),
            EventSet::Field { key, value } => event.get(key) == Some(value),
            EventSet::FieldIn { key, values } => {
                event.get(key).is_some_and(|v| values.contains(v))
            }
            EventSet::AnyOf(sets) => sets.iter().any(|s| s.matches(event)),
            EventSet::AllOf(sets) => sets.iter().all(|s| s.matches(event)),
            EventSet::Not(set) => !set.matches(event),
            EventSet::AllExcept(e) => e != event,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, EventSet::Empty)
    }

    /// Matches any of the listed events exactly.
    pub fn events(events: impl IntoIterator<Item = Event>) -> Self {
        EventSet::AnyOf(events.into_iter().map(EventSet::Exact).collect())
    }

    pub fn name(name: impl Into<String>) -> Self {
        EventSet::Name(name.into())
    }

    pub fn names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        EventSet::NameIn(names.into_iter().map(Into::into).collect())
    }

    pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        EventSet::Field { key: key.into(), value: value.into() }
    }

    pub fn field_in<V: Into<Value>>(key: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        EventSet::FieldIn {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(self, other: EventSet) -> Self {
        match self {
            EventSet::AllOf(mut sets) => {
                sets.push(other);
                EventSet::AllOf(sets)
            }
            s => EventSet::AllOf(vec![s, other]),
        }
    }

    pub fn or(self, other: EventSet) -> Self {
        match self {
            EventSet::Empty => other,
            EventSet::AnyOf(mut sets) => {
                sets.push(other);
                EventSet::AnyOf(sets)
            }
            s => EventSet::AnyOf(vec![s, other]),
        }
    }

    pub fn negate(self) -> Self {
        EventSet::Not(Box::new(self))
    }
}

impl From<Event> for EventSet {
    fn from(e: Event) -> Self {
        EventSet::Exact(e)
    }
}
