use crate::engine::{Termination, TraceEntry};
use crate::traits::ProgramListener;
use tracing::info;

/// Emits one `info` line per committed event.
#[derive(Debug, Default)]
pub struct TracingListener {
    committed: u64,
}

impl TracingListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramListener for TracingListener {
    fn on_start(&mut self) {
        info!("program started");
    }

    fn on_event(&mut self, entry: &TraceEntry) {
        self.committed += 1;
        info!(
            time = entry.time,
            seq = entry.seq,
            event = %entry.event.name,
            payload = ?entry.event.payload,
            "committed"
        );
    }

    fn on_end(&mut self, termination: &Termination) {
        info!(?termination, committed = self.committed, "program finished");
    }
}
