//! Synchronization statements.

use crate::error::{GridError, GridResult};
use crate::event::{Event, Proposal};
use crate::matcher::EventSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a process offers at one synchronization point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default)]
    pub request: Vec<Proposal>,
    #[serde(default)]
    pub wait_for: EventSet,
    #[serde(default)]
    pub block: EventSet,
    #[serde(default)]
    pub priority: i32,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(mut self, proposal: impl Into<Proposal>) -> Self {
        self.request.push(proposal.into());
        self
    }

    pub fn requests<P: Into<Proposal>>(mut self, proposals: impl IntoIterator<Item = P>) -> Self {
        self.request.extend(proposals.into_iter().map(Into::into));
        self
    }

    pub fn wait_for(mut self, set: impl Into<EventSet>) -> Self {
        self.wait_for = set.into();
        self
    }

    pub fn block(mut self, set: impl Into<EventSet>) -> Self {
        self.block = set.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn has_requests(&self) -> bool {
        !self.request.is_empty()
    }

    /// `true` if one of the requests is `event` and already due.
    pub fn requests_now(&self, event: &Event) -> bool {
        self.request.iter().any(|p| p == event)
    }

    pub fn blocks(&self, event: &Event) -> bool {
        self.block.matches(event)
    }

    /// Rewrites every request as seen `dt` time units later.
    pub fn advance(&mut self, dt: f64, epsilon: f64) {
        for proposal in self.request.iter_mut() {
            *proposal = proposal.advance(dt, epsilon);
        }
    }

    /// Checks request delays.
    pub fn validate(&self) -> Result<(), String> {
        for p in &self.request {
            let d = p.delay();
            if !d.is_finite() || d < 0.0 {
                return Err(format!("request `{}` has invalid delay {}", p.name(), d));
            }
        }
        Ok(())
    }

    /// Parses a loosely-shaped statement document.
    ///
    /// `request` may be absent, a single event, or a list; `wait_for` and
    /// `block` may be an [`EventSet`], a single event, or a list of events.
    pub fn from_value(thread: &str, value: Value) -> GridResult<Statement> {
        let malformed = |reason: String| GridError::MalformedStatement {
            thread: thread.to_string(),
            reason,
        };
        let Value::Object(map) = value else {
            return Err(malformed("statement must be an object".into()));
        };

        let mut statement = Statement::new();
        for (key, v) in map {
            match key.as_str() {
                "request" => statement.request = parse_requests(v).map_err(malformed)?,
                "wait_for" | "waitFor" => statement.wait_for = parse_set(v).map_err(malformed)?,
                "block" => statement.block = parse_set(v).map_err(malformed)?,
                "priority" => {
                    statement.priority = v
                        .as_i64()
                        .and_then(|p| i32::try_from(p).ok())
                        .ok_or_else(|| malformed(format!("priority must be an integer, got {v}")))?
                }
                other => return Err(malformed(format!("unrecognized field `{other}`"))),
            }
        }
        statement.validate().map_err(malformed)?;
        Ok(statement)
    }
}

fn parse_requests(v: Value) -> Result<Vec<Proposal>, String> {
    match v {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| format!("bad request entry: {e}")))
            .collect(),
        single => serde_json::from_value(single)
            .map(|p| vec![p])
            .map_err(|e| format!("bad request: {e}")),
    }
}

fn parse_set(v: Value) -> Result<EventSet, String> {
    match v {
        Value::Null => Ok(EventSet::Empty),
        Value::Array(items) => {
            let events: Result<Vec<Event>, _> = items.into_iter().map(serde_json::from_value).collect();
            events.map(EventSet::events).map_err(|e| format!("bad event list: {e}"))
        }
        other => {
            if let Ok(set) = serde_json::from_value::<EventSet>(other.clone()) {
                return Ok(set);
            }
            serde_json::from_value::<Event>(other)
                .map(EventSet::Exact)
                .map_err(|e| format!("unrecognized event set: {e}"))
        }
    }
}
