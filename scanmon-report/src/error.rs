use std::io;
use thiserror::Error;

/// Errors raised while publishing or reading sweep reports
#[derive(Error, Debug)]
pub enum ReportError {
    /// Spectrum has more bins than the region can hold
    #[error("Spectrum of {bins} bins does not fit the report region (capacity {capacity})")]
    TooLarge { bins: usize, capacity: usize },

    /// The writer published while the region was being read
    #[error("Torn read: counter moved from {before} to {after}")]
    TornRead { before: i32, after: i32 },

    /// Header values that no writer could have produced
    #[error("Corrupt report region: {0}")]
    Corrupt(String),

    /// Mirror file or log I/O
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
