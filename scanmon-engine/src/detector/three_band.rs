use scanmon_messages::{AveragedSpectrum, Detection, DetectionResult, ThreeBandConfig};

use super::Detector;
use super::stats::{above, mean, nonzero};

/// Floor added to the above-mean sample count.
const SIGNAL_COUNT_FLOOR: f64 = 0.000001;
/// Floor of the integrated linear power, applied to the reported level only.
const POWER_FLOOR: f64 = 0.00000001;
/// Below this the channel carries no usable weight for a centroid.
const CENTROID_EPSILON: f64 = f64::MIN_POSITIVE;

/// Compares a center band against the two shoulder bands right next to it.
///
/// The score is `(left_level / left_signal - 1) + (right_level / right_signal - 1)`: zero
/// when nothing was found, otherwise a margin whose sign follows the dB levels involved
/// (non-positive whenever the levels are positive). Any non-zero score is a detection.
#[derive(Debug, Clone)]
pub struct ThreeBandDetector {
    config: ThreeBandConfig,
}

impl ThreeBandDetector {
    pub fn new(config: ThreeBandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThreeBandConfig {
        &self.config
    }

    /// Evaluate at `candidate_hz` over a frequency-ordered power array.
    pub fn apply_array(
        &self,
        power: &[f32],
        frequency_start_hz: f64,
        frequency_step_hz: f64,
        candidate_hz: f64,
    ) -> Detection {
        let offset = (candidate_hz - frequency_start_hz) / frequency_step_hz;
        if !offset.is_finite() || offset < 0.0 {
            return Detection::NotApplicable;
        }
        let center_pos = offset as usize;
        let center_width = (self.config.center_width_khz * 1000.0 / frequency_step_hz) as usize;
        let side_width = (self.config.side_width_khz * 1000.0 / frequency_step_hz) as usize;
        if center_width == 0 || side_width == 0 {
            return Detection::NotApplicable;
        }

        let half = center_width / 2;
        let Some(center_begin) = center_pos.checked_sub(half) else {
            return Detection::NotApplicable;
        };
        let Some(left_begin) = center_begin.checked_sub(side_width) else {
            return Detection::NotApplicable;
        };
        let right_begin = center_begin + center_width;
        let right_end = right_begin + side_width;
        if right_end > power.len() {
            return Detection::NotApplicable;
        }

        let left_level = mean(&power[left_begin..center_begin]);
        let right_level = mean(&power[right_begin..right_end]);
        let center_level = mean(&power[center_begin..right_begin]);

        // A signal cannot sit below its own noise shoulders
        if center_level < left_level || center_level < right_level {
            return Detection::Scored(DetectionResult::rejected());
        }

        let left_half = (0..=half).map(|x| power[center_pos - x]);
        let right_half = (0..=half).map(|x| power[center_pos + x]);
        let (left_sum, left_n) = above(left_half, center_level);
        let (right_sum, right_n) = above(right_half, center_level);
        if left_n == 0 || right_n == 0 {
            return Detection::Scored(DetectionResult::rejected());
        }
        let left_signal = left_sum / (left_n as f64 + SIGNAL_COUNT_FLOOR);
        let right_signal = right_sum / (right_n as f64 + SIGNAL_COUNT_FLOOR);

        let threshold = self.config.detection_threshold_db;
        if left_signal < left_level + threshold || right_signal < right_level + threshold {
            return Detection::Scored(DetectionResult::rejected());
        }

        let left_cut = 0.7 * left_signal + 0.3 * left_level;
        let right_cut = 0.7 * right_signal + 0.3 * right_level;
        let left_edge = (1..=half)
            .map(|x| center_pos - x)
            .find(|&px| f64::from(power[px]) < left_cut)
            .unwrap_or(center_pos - half);
        let right_edge = (1..=half)
            .map(|x| center_pos + x)
            .find(|&px| f64::from(power[px]) < right_cut)
            .unwrap_or(center_pos + half);

        let mut power_integral = 0.0;
        let mut frequency_integral = 0.0;
        for px in left_edge..right_edge {
            let linear = 10.0_f64.powf(f64::from(power[px]) * 0.1);
            power_integral += linear;
            frequency_integral += (frequency_start_hz + px as f64 * frequency_step_hz) * linear;
        }
        let centroid_hz =
            (power_integral > CENTROID_EPSILON).then(|| frequency_integral / power_integral);

        let score = left_level / nonzero(left_signal, SIGNAL_COUNT_FLOOR) - 1.0
            + right_level / nonzero(right_signal, SIGNAL_COUNT_FLOOR)
            - 1.0;

        Detection::Scored(DetectionResult {
            score,
            power_db: 10.0 * (power_integral + POWER_FLOOR).log10(),
            bandwidth_hz: (right_edge - left_edge) as f64 * frequency_step_hz,
            centroid_hz,
        })
    }
}

impl Detector for ThreeBandDetector {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn apply(&self, spectrum: &AveragedSpectrum, candidate_hz: f64) -> Detection {
        self.apply_array(
            spectrum.powers(),
            spectrum.start_hz(),
            spectrum.step_hz(),
            candidate_hz,
        )
    }

    fn is_detection(&self, result: &DetectionResult) -> bool {
        result.score != 0.0
    }

    fn window_width_points(&self, frequency_step_hz: f64) -> usize {
        self.config.window_width_points(frequency_step_hz)
    }

    fn reach_khz(&self) -> (f64, f64) {
        (self.config.min_offset_khz(), self.config.max_offset_khz())
    }
}
