use log::{info, warn};
use scanmon_messages::{ScanState, SweepReport};

/// What the reporter knows about the running sweep, derived from engine events.
#[derive(Debug, Default)]
pub(super) struct ReportState {
    /// Current engine state (from StateSnapshot)
    pub scan_state: Option<ScanState>,
    /// Sequence number of the last report seen
    pub last_sequence: u64,
    /// Steps the engine finished but whose report never arrived
    pub missed_steps: u64,
}

impl ReportState {
    pub fn handle_snapshot(&mut self, state: ScanState) {
        info!(
            "Sweeping {} .. {} in {} steps, {} bins averaged over {} frames",
            state.config.start,
            state.config.end,
            state.config.step,
            state.fft_size,
            state.avg_size
        );
        // A new graph numbers its steps from 1 again
        self.last_sequence = 0;
        self.scan_state = Some(state);
    }

    pub fn handle_sweep(&mut self, report: &SweepReport) {
        let expected = self.last_sequence + 1;
        if report.sequence > expected {
            let missed = report.sequence - expected;
            self.missed_steps += missed;
            warn!("{} report(s) dropped before step {}", missed, report.sequence);
        }
        self.last_sequence = report.sequence;
    }
}
