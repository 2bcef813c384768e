mod error;
mod report_buffer;
mod state;
mod sweep_log;

pub use error::ReportError;
pub use report_buffer::{
    CAPACITY, REGION_SIZE, ReportBuffer, ReportFile, ReportRegion, ReportSnapshot, poll, snapshot,
};
pub use sweep_log::SweepLog;

use log::{error, info, warn};
use scanmon_messages::{Event, ScanState, SweepReport};
use state::ReportState;

/// Counters of what the reporter persisted and what it failed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    /// Spectra published to the report buffer
    pub published: u64,
    pub buffer_failures: u64,
    /// Per-MHz log files written
    pub log_files: u64,
    pub log_failures: u64,
    /// Steps whose report was dropped on the way from the engine
    pub missed_steps: u64,
}

/// Consumes engine events: prints progress, publishes every averaged spectrum to the
/// report buffer and writes the per-MHz log files.
pub struct Reporter {
    buffer: ReportBuffer,
    log: Option<SweepLog>,
    state: ReportState,
    stats: PersistenceStats,
}

impl Reporter {
    pub fn new(buffer: ReportBuffer, log: Option<SweepLog>) -> Self {
        Self {
            buffer,
            log,
            state: ReportState::default(),
            stats: PersistenceStats::default(),
        }
    }

    pub fn buffer(&self) -> &ReportBuffer {
        &self.buffer
    }

    /// The sweep the engine last announced, if any.
    pub fn scan_state(&self) -> Option<&ScanState> {
        self.state.scan_state.as_ref()
    }

    pub fn stats(&self) -> PersistenceStats {
        PersistenceStats {
            missed_steps: self.state.missed_steps,
            ..self.stats
        }
    }

    /// Handle one engine event. A fault ends the reporter with the engine's reason.
    pub fn handle_event(&mut self, event: Event) -> anyhow::Result<()> {
        match event {
            Event::StateSnapshot(state) => self.state.handle_snapshot(state),
            Event::Sweep(report) => self.handle_sweep(&report),
            Event::Fault(reason) => {
                error!("Engine fault: {}", reason);
                anyhow::bail!("sweep stopped: {}", reason);
            }
        }
        Ok(())
    }

    fn handle_sweep(&mut self, report: &SweepReport) {
        self.state.handle_sweep(report);
        let spectrum = &report.spectrum;

        let (hours, minutes, seconds) = sweep_log::clock(report.elapsed);
        info!(
            "{:02}:{:02}:{:02}: Finished scanning {:.6} MHz - {:.6} MHz",
            hours,
            minutes,
            seconds,
            spectrum.start_hz() / 1e6,
            spectrum.end_hz() / 1e6
        );
        if report.overloaded_frames > 0 {
            warn!(
                "{} overloaded frame(s) at {:.6} MHz",
                report.overloaded_frames,
                spectrum.center_hz() / 1e6
            );
        }
        for signal in &report.signals {
            let frequency = signal.result.centroid_hz.unwrap_or(signal.candidate_hz);
            info!(
                "  {} at {:.6} MHz: score {:.2}, {:.1} kHz wide, {:.1} dB",
                signal.detector,
                frequency / 1e6,
                signal.result.score,
                signal.result.bandwidth_hz / 1e3,
                signal.result.power_db
            );
        }

        if let Some(log) = &mut self.log {
            match log.record(spectrum, report.elapsed) {
                Ok(Some(_)) => self.stats.log_files += 1,
                Ok(None) => {}
                Err(e) => {
                    self.stats.log_failures += 1;
                    warn!("Failed to write spectrum log: {}", e);
                }
            }
        }

        match self.buffer.publish(spectrum) {
            Ok(_) => self.stats.published += 1,
            Err(e) => {
                self.stats.buffer_failures += 1;
                warn!("Failed to publish spectrum: {}", e);
            }
        }
    }

    /// Run until the engine closes the event channel (blocking).
    pub fn run(mut self, event_rx: flume::Receiver<Event>) -> anyhow::Result<PersistenceStats> {
        for event in event_rx.iter() {
            self.handle_event(event)?;
        }
        let stats = self.stats();
        match self.scan_state() {
            Some(state) => info!(
                "Event channel closed after sweeping {} .. {}: {:?}",
                state.config.start, state.config.end, stats
            ),
            None => info!("Event channel closed before any sweep started: {:?}", stats),
        }
        Ok(stats)
    }
}
