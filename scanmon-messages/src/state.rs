use crate::{Decibels, DetectorProfile, Hertz};
use std::path::PathBuf;

/// Current state of the sweep engine.
#[derive(Debug, Clone)]
pub struct ScanState {
    /// Frequency the tuner was last commanded to
    pub center_frequency: Hertz,
    /// Sample rate
    pub sample_rate: Hertz,
    /// FFT size (number of bins)
    pub fft_size: usize,
    /// Frames averaged per step
    pub avg_size: u32,
    /// Current scan configuration
    pub config: ScanConfig,
}

/// A carrier injected by the simulated receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub frequency: Hertz,
    pub bandwidth: Hertz,
    pub power: Decibels,
}

/// A range the simulated tuner cannot lock onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyHole {
    pub start: Hertz,
    pub end: Hertz,
}

impl FrequencyHole {
    pub fn contains(&self, frequency: Hertz) -> bool {
        frequency >= self.start && frequency < self.end
    }
}

/// Configuration for the spectrum frame source.
#[derive(Debug, Clone)]
pub enum SourceConfig {
    /// Synthesize frames from a flat noise floor plus emitters.
    Simulated {
        noise_floor: Decibels,
        emitters: Vec<Emitter>,
        holes: Vec<FrequencyHole>,
    },
    /// Read raw little-endian f32 power frames from a file.
    File { path: PathBuf, looping: bool },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Simulated {
            noise_floor: Decibels(-90.0),
            emitters: vec![
                Emitter {
                    frequency: Hertz::mhz(96.4),
                    bandwidth: Hertz::khz(200.0),
                    power: Decibels(-40.0),
                },
                Emitter {
                    frequency: Hertz::mhz(101.1),
                    bandwidth: Hertz::khz(200.0),
                    power: Decibels(-55.0),
                },
            ],
            holes: Vec::new(),
        }
    }
}

/// Everything needed to build one sweep.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub start: Hertz,
    pub end: Hertz,
    pub step: Hertz,
    pub sample_rate: Hertz,
    pub fft_size: usize,
    pub avg_size: u32,
    /// Maximum distance between the requested and achieved tuner frequency.
    pub tolerance_hz: f64,
    /// Subtracted from every sample before averaging.
    pub gain_compensation_db: Option<Decibels>,
    /// Frames whose interior peak exceeds this are flagged as overloaded.
    pub overload_threshold_db: Option<Decibels>,
    /// Distance between candidate frequencies handed to the detectors.
    pub candidate_step: Hertz,
    pub source: SourceConfig,
    pub profiles: Vec<DetectorProfile>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            start: Hertz::mhz(88.0),
            end: Hertz::mhz(108.0),
            step: Hertz::mhz(1.6),
            sample_rate: Hertz::mhz(2.0),
            fft_size: 1024,
            avg_size: 8,
            tolerance_hz: 100.0,
            gain_compensation_db: None,
            overload_threshold_db: None,
            candidate_step: Hertz::khz(12.5),
            source: SourceConfig::default(),
            profiles: DetectorProfile::defaults(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.start < self.end) {
            return Err(format!("start {} must be below end {}", self.start, self.end));
        }
        if self.step.as_hz() <= 0.0 {
            return Err(format!("step must be positive, got {}", self.step));
        }
        if self.sample_rate.as_hz() <= 0.0 {
            return Err(format!("sample rate must be positive, got {}", self.sample_rate));
        }
        if self.fft_size < 2 || self.fft_size % 2 != 0 {
            return Err(format!("FFT size must be even and at least 2, got {}", self.fft_size));
        }
        if self.avg_size == 0 {
            return Err("averaging size must be at least 1".to_string());
        }
        if self.tolerance_hz <= 0.0 {
            return Err(format!("tuner tolerance must be positive, got {}", self.tolerance_hz));
        }
        if self.candidate_step.as_hz() <= 0.0 {
            return Err(format!("candidate step must be positive, got {}", self.candidate_step));
        }
        Ok(())
    }

    /// Attempts allowed before giving up on finding a tunable step: one full sweep.
    pub fn retune_budget(&self) -> usize {
        ((self.end.as_hz() - self.start.as_hz()) / self.step.as_hz()).ceil() as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retune_budget(), 14);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let inverted = ScanConfig {
            start: Hertz::mhz(108.0),
            end: Hertz::mhz(88.0),
            ..ScanConfig::default()
        };
        assert!(inverted.validate().is_err());

        let odd_fft = ScanConfig {
            fft_size: 1023,
            ..ScanConfig::default()
        };
        assert!(odd_fft.validate().unwrap_err().contains("even"));

        let no_avg = ScanConfig {
            avg_size: 0,
            ..ScanConfig::default()
        };
        assert!(no_avg.validate().is_err());
    }

    #[test]
    fn test_hole_contains() {
        let hole = FrequencyHole {
            start: Hertz::mhz(90.0),
            end: Hertz::mhz(91.0),
        };
        assert!(hole.contains(Hertz::mhz(90.0)));
        assert!(hole.contains(Hertz::mhz(90.5)));
        assert!(!hole.contains(Hertz::mhz(91.0)));
    }
}
