use std::time::Duration;

use crate::{AveragedSpectrum, ScanState, SignalReport};

/// Events sent from the engine to the reporting side.
#[derive(Debug)]
pub enum Event {
    /// State snapshot sent every time a sweep graph is (re)started.
    StateSnapshot(ScanState),
    /// One finished tuning step.
    Sweep(SweepReport),
    /// The sweep stopped on an unrecoverable condition.
    Fault(String),
}

/// Everything produced by one averaging step.
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Number of steps finished since the sweep started, starting at 1.
    pub sequence: u64,
    /// Time between the start of the sweep and the end of this step.
    pub elapsed: Duration,
    pub spectrum: AveragedSpectrum,
    pub signals: Vec<SignalReport>,
    /// Frames in this step whose interior peak crossed the overload threshold.
    pub overloaded_frames: u32,
}
