use std::io;
use thiserror::Error;

/// Result type for sweep operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors raised by the accumulator, the tuner and the sweep plumbing
#[derive(Error, Debug)]
pub enum ScanError {
    /// Frame rejected before touching the running sum
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `finalize` called before `avg_size` frames were accumulated
    #[error("Average not ready: {count} of {avg_size} frames accumulated")]
    NotReady { count: u32, avg_size: u32 },

    /// `accumulate` called on a complete average that was never finalized
    #[error("Average of {avg_size} frames is complete and must be finalized first")]
    NotFinalized { avg_size: u32 },

    /// No frequency in the sweep range could be tuned within tolerance
    #[error("Tuner unreachable: nothing within tolerance in {attempts} attempts from {start_hz} Hz")]
    TunerUnreachable { start_hz: f64, attempts: usize },

    /// The tuner itself reported a failure
    #[error("Tuner error: {0}")]
    Tuner(String),

    /// Scan configuration rejected
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Frame source I/O
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
