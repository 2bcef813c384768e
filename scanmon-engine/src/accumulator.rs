use log::{debug, info, warn};
use scanmon_messages::{AveragedSpectrum, ScanConfig};

use crate::tuner::Tuner;
use crate::{ScanError, ScanResult};

/// Move DC from the edges to the center: `[DC, positive, negative] -> [negative, DC, positive]`.
///
/// For even lengths this is its own inverse.
pub fn fft_shift<T: Copy>(bins: &[T]) -> Vec<T> {
    let mut shifted = bins.to_vec();
    shifted.rotate_left(bins.len() / 2);
    shifted
}

/// Averages spectrum frames at one tuning step and walks the tuner across the sweep range.
///
/// Owns its tuner; run one accumulator per receiver.
pub struct SweepAccumulator<T: Tuner> {
    tuner: T,
    sum: Vec<f64>,
    count: u32,
    avg_size: u32,
    start_freq: f64,
    end_freq: f64,
    step: f64,
    current_freq: f64,
    sample_rate: f64,
    tolerance_hz: f64,
    retune_budget: usize,
    gain_compensation_db: Option<f32>,
    overload_threshold_db: Option<f32>,
    overloaded_frames: u32,
}

impl<T: Tuner> SweepAccumulator<T> {
    /// Build an accumulator for `config`. The tuner is not touched until [`Self::tune_start`].
    pub fn new(config: &ScanConfig, tuner: T) -> ScanResult<Self> {
        config.validate().map_err(ScanError::InvalidConfig)?;
        debug!(
            "Constructing accumulator: {} .. {} step {}, {} bins, averaging {}",
            config.start, config.end, config.step, config.fft_size, config.avg_size
        );
        Ok(Self {
            tuner,
            sum: vec![0.0; config.fft_size],
            count: 0,
            avg_size: config.avg_size,
            start_freq: config.start.as_hz(),
            end_freq: config.end.as_hz(),
            step: config.step.as_hz(),
            current_freq: config.start.as_hz(),
            sample_rate: config.sample_rate.as_hz(),
            tolerance_hz: config.tolerance_hz,
            retune_budget: config.retune_budget(),
            gain_compensation_db: config.gain_compensation_db.map(f32::from),
            overload_threshold_db: config.overload_threshold_db.map(f32::from),
            overloaded_frames: 0,
        })
    }

    pub fn vector_length(&self) -> usize {
        self.sum.len()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn avg_size(&self) -> u32 {
        self.avg_size
    }

    pub fn is_ready(&self) -> bool {
        self.count >= self.avg_size
    }

    /// Frequency the tuner was last commanded to.
    pub fn current_freq(&self) -> f64 {
        self.current_freq
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Frames of the current step that tripped the overload threshold.
    pub fn overloaded_frames(&self) -> u32 {
        self.overloaded_frames
    }

    pub fn tuner(&self) -> &T {
        &self.tuner
    }

    /// Add one frame in FFT-bin order to the running sum.
    ///
    /// Returns `true` once `avg_size` frames have been summed. Rejected frames leave the
    /// running sum untouched.
    pub fn accumulate(&mut self, frame: &[f32]) -> ScanResult<bool> {
        if self.is_ready() {
            return Err(ScanError::NotFinalized {
                avg_size: self.avg_size,
            });
        }
        if frame.len() != self.sum.len() {
            return Err(ScanError::InvalidInput(format!(
                "frame has {} bins, expected {}",
                frame.len(),
                self.sum.len()
            )));
        }
        if let Some(bin) = frame.iter().position(|sample| !sample.is_finite()) {
            return Err(ScanError::InvalidInput(format!(
                "non-finite sample {} at bin {}",
                frame[bin], bin
            )));
        }

        if let Some(threshold) = self.overload_threshold_db {
            // First and last bins carry DC and filter edge artifacts
            let interior = &frame[1..frame.len().saturating_sub(1).max(1)];
            let peak = interior.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            if peak > threshold {
                self.overloaded_frames += 1;
                warn!(
                    "Frame peak {:.1} dB over overload threshold {:.1} dB at {} Hz",
                    peak, threshold, self.current_freq
                );
            }
        }

        let offset = self.gain_compensation_db.unwrap_or(0.0);
        for (total, &sample) in self.sum.iter_mut().zip(frame) {
            *total += f64::from(sample - offset);
        }
        self.count += 1;

        Ok(self.is_ready())
    }

    /// Turn the running sum into an averaged spectrum in ascending-frequency order and reset.
    pub fn finalize(&mut self) -> ScanResult<AveragedSpectrum> {
        if !self.is_ready() {
            return Err(ScanError::NotReady {
                count: self.count,
                avg_size: self.avg_size,
            });
        }

        let count = f64::from(self.count);
        let averaged: Vec<f32> = self.sum.iter().map(|total| (total / count) as f32).collect();
        let spectrum =
            AveragedSpectrum::new(self.current_freq, self.sample_rate, fft_shift(&averaged));

        self.sum.iter_mut().for_each(|total| *total = 0.0);
        self.count = 0;
        self.overloaded_frames = 0;

        Ok(spectrum)
    }

    /// Tune to the start of the range, stepping past frequencies the tuner cannot reach.
    pub fn tune_start(&mut self) -> ScanResult<f64> {
        self.current_freq = self.start_freq;
        self.settle()
    }

    /// Move to the next step of the sweep. The sweep restarts at `start_freq` after the
    /// last step and never ends on its own.
    pub fn advance(&mut self) -> ScanResult<f64> {
        self.step_forward();
        self.settle()
    }

    fn step_forward(&mut self) {
        self.current_freq += self.step;
        if self.current_freq >= self.end_freq {
            info!("Finished range, starting again");
            self.current_freq = self.start_freq;
        }
    }

    /// Command the tuner until it lands within tolerance, giving up after one full sweep.
    fn settle(&mut self) -> ScanResult<f64> {
        let first = self.current_freq;
        for attempt in 1..=self.retune_budget {
            let actual = self.tuner.set_center_freq(self.current_freq)?;
            if (self.current_freq - actual).abs() < self.tolerance_hz {
                return Ok(self.current_freq);
            }
            debug!(
                "Tuner landed on {} Hz instead of {} Hz (attempt {}), skipping step",
                actual, self.current_freq, attempt
            );
            // current_freq stays on the last commanded frequency once the budget is spent
            if attempt < self.retune_budget {
                self.step_forward();
            }
        }
        Err(ScanError::TunerUnreachable {
            start_hz: first,
            attempts: self.retune_budget,
        })
    }
}
