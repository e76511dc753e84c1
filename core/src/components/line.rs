//! Per-line processes: status derivation and the relays that switch a
//! line's components on or off in sequence.

use super::ThreadParams;
use crate::error::GridResult;
use crate::event::Event;
use crate::grid::{component_event, line_event, names, GridContext, LineSpec, Status, COMPONENT_KEY};
use crate::matcher::EventSet;
use crate::statement::Statement;
use crate::traits::BThread;

/// Derives line-level events from its components' events and the context.
///
/// Failure of any component fails the line; switching a component off turns
/// a running line off; once no component is broken after a repair the line
/// is operational again; when every component is on the line is on.
pub struct LineStatus {
    name: String,
    line: LineSpec,
    updating: bool,
}

impl LineStatus {
    pub fn new(line: LineSpec) -> Self {
        Self {
            name: format!("status:{}", line.name),
            line,
            updating: false,
        }
    }

    pub fn build(line: &LineSpec, _params: &ThreadParams) -> GridResult<Self> {
        Ok(Self::new(line.clone()))
    }

    fn watched(&self) -> EventSet {
        EventSet::field_in(COMPONENT_KEY, self.line.components.iter().cloned()).and(EventSet::names([
            names::ON,
            names::OFF,
            names::REPAIRED,
            names::O_FAIL,
            names::D_FAIL,
        ]))
    }

    fn watch(&mut self) -> Statement {
        self.updating = false;
        Statement::new().wait_for(self.watched())
    }

    fn derive(&self, event: &Event, ctx: &GridContext) -> Option<&'static str> {
        let current = ctx.line(&self.line.name);
        let comps = &self.line.components;
        match event.name.as_str() {
            names::O_FAIL | names::D_FAIL if current != Some(Status::Broken) => Some(names::LINE_FAIL),
            names::OFF if current == Some(Status::On) => Some(names::LINE_OFF),
            names::REPAIRED if !ctx.any_component(comps, Status::Broken) => Some(names::LINE_OPERATIONAL),
            names::ON if ctx.all_components(comps, Status::On) => Some(names::LINE_ON),
            _ => None,
        }
    }
}

impl BThread<GridContext> for LineStatus {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &GridContext) -> Option<Statement> {
        Some(self.watch())
    }

    fn resume(&mut self, event: &Event, ctx: &GridContext) -> Option<Statement> {
        if self.updating {
            return Some(self.watch());
        }
        match self.derive(event, ctx) {
            Some(update) => {
                self.updating = true;
                Some(
                    Statement::new()
                        .request(line_event(&self.line.name, update))
                        .block(self.watched()),
                )
            }
            None => Some(self.watch()),
        }
    }
}

/// On `trigger`, requests `command` for each of the line's components in
/// order, then waits for the trigger again.
pub struct LineRelay {
    name: String,
    trigger: Event,
    command: &'static str,
    components: Vec<String>,
    cursor: Option<usize>,
}

impl LineRelay {
    pub fn new(kind: &str, line: &LineSpec, trigger: &str, command: &'static str) -> Self {
        Self {
            name: format!("{kind}:{}", line.name),
            trigger: line_event(&line.name, trigger),
            command,
            components: line.components.clone(),
            cursor: None,
        }
    }

    /// Restarts the line once it is operational again.
    pub fn restart(line: &LineSpec, _params: &ThreadParams) -> GridResult<Self> {
        Ok(Self::new("restart_line", line, names::LINE_OPERATIONAL, names::REQ_ON))
    }

    pub fn start_on_request(line: &LineSpec, _params: &ThreadParams) -> GridResult<Self> {
        Ok(Self::new("start_line", line, names::LINE_REQ_ON, names::REQ_ON))
    }

    /// Switches every component off when the line fails.
    pub fn disable_on_fail(line: &LineSpec, _params: &ThreadParams) -> GridResult<Self> {
        Ok(Self::new("disable_line", line, names::LINE_FAIL, names::REQ_OFF))
    }

    pub fn stop_on_request(line: &LineSpec, _params: &ThreadParams) -> GridResult<Self> {
        Ok(Self::new("stop_line", line, names::LINE_REQ_OFF, names::REQ_OFF))
    }

    fn next(&mut self) -> Statement {
        let idx = self.cursor.map_or(0, |i| i + 1);
        match self.components.get(idx) {
            Some(c) => {
                self.cursor = Some(idx);
                Statement::new().request(component_event(c, self.command))
            }
            None => {
                self.cursor = None;
                Statement::new().wait_for(self.trigger.clone())
            }
        }
    }
}

impl BThread<GridContext> for LineRelay {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &GridContext) -> Option<Statement> {
        self.cursor = None;
        Some(Statement::new().wait_for(self.trigger.clone()))
    }

    fn resume(&mut self, _event: &Event, _ctx: &GridContext) -> Option<Statement> {
        Some(self.next())
    }
}

/// Asks for one line to be started, once.
pub struct InitLine {
    name: String,
    line: String,
}

impl InitLine {
    pub fn new(line: &str) -> Self {
        Self { name: format!("init:{line}"), line: line.to_string() }
    }
}

impl BThread<GridContext> for InitLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _ctx: &GridContext) -> Option<Statement> {
        Some(Statement::new().request(line_event(&self.line, names::LINE_REQ_ON)))
    }

    fn resume(&mut self, _event: &Event, _ctx: &GridContext) -> Option<Statement> {
        None
    }
}
