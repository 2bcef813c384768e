/// One frequency bin of an averaged spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumBin {
    pub frequency_hz: f64,
    pub power_db: f32,
}

/// Averaged power spectrum of one tuning step, in ascending-frequency order.
///
/// Slot `i` sits at `center + i * sample_rate / N - sample_rate / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedSpectrum {
    center_hz: f64,
    sample_rate_hz: f64,
    powers: Vec<f32>,
}

impl AveragedSpectrum {
    /// Wrap frequency-ordered powers captured with the tuner at `center_hz`.
    pub fn new(center_hz: f64, sample_rate_hz: f64, powers: Vec<f32>) -> Self {
        Self {
            center_hz,
            sample_rate_hz,
            powers,
        }
    }

    pub fn center_hz(&self) -> f64 {
        self.center_hz
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// Width of one bin.
    pub fn step_hz(&self) -> f64 {
        self.sample_rate_hz / self.powers.len().max(1) as f64
    }

    /// Frequency of the first slot.
    pub fn start_hz(&self) -> f64 {
        self.center_hz - self.sample_rate_hz / 2.0
    }

    /// Frequency just past the last slot.
    pub fn end_hz(&self) -> f64 {
        self.start_hz() + self.step_hz() * self.powers.len() as f64
    }

    pub fn frequency_of(&self, slot: usize) -> f64 {
        self.center_hz + slot as f64 * self.step_hz() - self.sample_rate_hz / 2.0
    }

    pub fn powers(&self) -> &[f32] {
        &self.powers
    }

    pub fn bins(&self) -> impl Iterator<Item = SpectrumBin> + '_ {
        self.powers
            .iter()
            .enumerate()
            .map(|(slot, &power_db)| SpectrumBin {
                frequency_hz: self.frequency_of(slot),
                power_db,
            })
    }

    /// Slot containing `frequency_hz`, if it is inside the spectrum.
    pub fn slot_of(&self, frequency_hz: f64) -> Option<usize> {
        let offset = ((frequency_hz - self.start_hz()) / self.step_hz()).floor();
        if offset < 0.0 || offset >= self.powers.len() as f64 {
            return None;
        }
        Some(offset as usize)
    }

    pub fn power_at(&self, frequency_hz: f64) -> Option<f32> {
        self.slot_of(frequency_hz).map(|slot| self.powers[slot])
    }
}
