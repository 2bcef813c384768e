mod command;
mod detection;
mod event;
mod spectrum;
mod state;
mod units;

pub use command::Command;
pub use detection::{
    Detection, DetectionResult, DetectorProfile, FiveBandConfig, SignalReport, ThreeBandConfig,
};
pub use event::{Event, SweepReport};
pub use spectrum::{AveragedSpectrum, SpectrumBin};
pub use state::{Emitter, FrequencyHole, ScanConfig, ScanState, SourceConfig};
pub use units::{Decibels, Hertz};
