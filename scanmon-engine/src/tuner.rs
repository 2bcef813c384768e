use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;
use scanmon_messages::{FrequencyHole, Hertz};

use crate::{ScanError, ScanResult};

/// Frequency control of the receiver front end.
pub trait Tuner: Send {
    /// Frequency the hardware is currently tuned to.
    fn center_freq(&self) -> ScanResult<f64>;

    /// Request a new center frequency and return the frequency actually achieved.
    fn set_center_freq(&mut self, frequency_hz: f64) -> ScanResult<f64>;
}

impl<T: Tuner + ?Sized> Tuner for Box<T> {
    fn center_freq(&self) -> ScanResult<f64> {
        (**self).center_freq()
    }

    fn set_center_freq(&mut self, frequency_hz: f64) -> ScanResult<f64> {
        (**self).set_center_freq(frequency_hz)
    }
}

/// Tuned frequency shared between a simulated tuner and the receiver that renders it.
#[derive(Debug, Clone, Default)]
pub struct SharedFrequency(Arc<AtomicU64>);

impl SharedFrequency {
    pub fn new(frequency_hz: f64) -> Self {
        Self(Arc::new(AtomicU64::new(frequency_hz.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, frequency_hz: f64) {
        self.0.store(frequency_hz.to_bits(), Ordering::Release);
    }
}

/// Tuner without hardware. Requests that land in a hole snap to the nearest hole edge,
/// the way a real front end reports the closest frequency its synthesizer can reach.
#[derive(Debug, Clone)]
pub struct SimulatedTuner {
    frequency: SharedFrequency,
    holes: Vec<FrequencyHole>,
}

impl SimulatedTuner {
    pub fn new(frequency: SharedFrequency, holes: Vec<FrequencyHole>) -> Self {
        Self { frequency, holes }
    }
}

impl Tuner for SimulatedTuner {
    fn center_freq(&self) -> ScanResult<f64> {
        Ok(self.frequency.get())
    }

    fn set_center_freq(&mut self, frequency_hz: f64) -> ScanResult<f64> {
        if !frequency_hz.is_finite() || frequency_hz < 0.0 {
            return Err(ScanError::Tuner(format!("cannot tune to {} Hz", frequency_hz)));
        }
        let requested = Hertz(frequency_hz);
        let actual = match self.holes.iter().find(|hole| hole.contains(requested)) {
            Some(hole) => {
                let below = frequency_hz - hole.start.as_hz();
                let above = hole.end.as_hz() - frequency_hz;
                if below <= above {
                    hole.start.as_hz()
                } else {
                    hole.end.as_hz()
                }
            }
            None => frequency_hz,
        };
        trace!("Simulated tuner asked for {} Hz, landed on {} Hz", frequency_hz, actual);
        self.frequency.set(actual);
        Ok(actual)
    }
}
