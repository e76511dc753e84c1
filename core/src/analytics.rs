use crate::engine::TraceEntry;
use crate::error::{GridError, GridResult};
use crate::grid::{names, COMPONENT_KEY, LINE_KEY};
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Histogram resolution: one unit of virtual time is recorded as this many ticks.
const TICKS_PER_UNIT: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutageSummary {
    pub line_failures: u64,
    pub component_failures: u64,
    pub repairs: u64,
    pub p50: Option<f64>,
    pub p99: Option<f64>,
    pub max: Option<f64>,
}

/// Collects line outage durations and failure counts from committed events.
///
/// An outage opens on `line_fail` and closes on the line's next
/// `line_operational` or `line_on`.
pub struct OutageCollector {
    durations: Histogram<u64>,
    down_since: BTreeMap<String, f64>,
    downtime: BTreeMap<String, f64>,
    pub line_failures: u64,
    pub component_failures: u64,
    pub repairs: u64,
}

impl OutageCollector {
    pub fn new() -> GridResult<Self> {
        let durations = Histogram::new(3).map_err(|e| GridError::InvalidScenario(e.to_string()))?;
        Ok(Self {
            durations,
            down_since: BTreeMap::new(),
            downtime: BTreeMap::new(),
            line_failures: 0,
            component_failures: 0,
            repairs: 0,
        })
    }

    pub fn observe(&mut self, entry: &TraceEntry) {
        let event = &entry.event;
        if event.get(COMPONENT_KEY).is_some() {
            match event.name.as_str() {
                names::O_FAIL | names::D_FAIL => self.component_failures += 1,
                names::REPAIRED => self.repairs += 1,
                _ => {}
            }
            return;
        }
        let Some(line) = event.get_str(LINE_KEY) else {
            return;
        };
        match event.name.as_str() {
            names::LINE_FAIL => {
                if !self.down_since.contains_key(line) {
                    self.down_since.insert(line.to_string(), entry.time);
                    self.line_failures += 1;
                }
            }
            names::LINE_OPERATIONAL | names::LINE_ON => {
                if let Some(start) = self.down_since.remove(line) {
                    self.close(line, entry.time - start);
                }
            }
            _ => {}
        }
    }

    pub fn observe_all<'a>(&mut self, entries: impl IntoIterator<Item = &'a TraceEntry>) {
        for e in entries {
            self.observe(e);
        }
    }

    fn close(&mut self, line: &str, duration: f64) {
        self.durations.saturating_record((duration.max(0.0) * TICKS_PER_UNIT).round() as u64);
        *self.downtime.entry(line.to_string()).or_insert(0.0) += duration;
    }

    /// Closes outages still open at `end`. They count towards downtime but
    /// not towards the duration histogram, which only holds completed ones.
    pub fn finish(&mut self, end: f64) {
        for (line, start) in std::mem::take(&mut self.down_since) {
            *self.downtime.entry(line).or_insert(0.0) += (end - start).max(0.0);
        }
    }

    pub fn completed_outages(&self) -> u64 {
        self.durations.len()
    }

    pub fn percentile(&self, q: f64) -> Option<f64> {
        if self.durations.is_empty() {
            return None;
        }
        Some(self.durations.value_at_quantile(q) as f64 / TICKS_PER_UNIT)
    }

    pub fn downtime(&self, line: &str) -> f64 {
        self.downtime.get(line).copied().unwrap_or(0.0)
    }

    /// Fraction of `[0, elapsed]` the line was not failed.
    pub fn availability(&self, line: &str, elapsed: f64) -> f64 {
        if elapsed <= 0.0 {
            return 1.0;
        }
        (1.0 - self.downtime(line) / elapsed).clamp(0.0, 1.0)
    }

    pub fn summary(&self) -> OutageSummary {
        OutageSummary {
            line_failures: self.line_failures,
            component_failures: self.component_failures,
            repairs: self.repairs,
            p50: self.percentile(0.5),
            p99: self.percentile(0.99),
            max: (!self.durations.is_empty()).then(|| self.durations.max() as f64 / TICKS_PER_UNIT),
        }
    }
}
