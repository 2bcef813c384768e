use scanmon_messages::{AveragedSpectrum, Detection, DetectionResult, FiveBandConfig};

use super::Detector;
use super::stats::{below, high_mean, nonzero};

const OUT_COUNT_FLOOR: f64 = 0.00000001;
const RELATIVE_MATCH_FLOOR: f64 = 0.01;
/// Trailing level smoothing of the bandwidth walk.
const EDGE_SMOOTHING: f64 = 0.9;

/// Legacy detector matching a center peak plus two shifted side peaks against an
/// out-of-band noise floor.
///
/// Higher scores are stronger detections; [`Detection::NotApplicable`] stands in for the
/// legacy `-1` when the window is too small for the configured geometry.
#[derive(Debug, Clone)]
pub struct FiveBandDetector {
    config: FiveBandConfig,
}

fn band(window: &[f32], begin: i64, end: i64) -> Option<&[f32]> {
    if begin < 0 || end <= begin || end as usize > window.len() {
        return None;
    }
    Some(&window[begin as usize..end as usize])
}

impl FiveBandDetector {
    pub fn new(config: FiveBandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FiveBandConfig {
        &self.config
    }

    /// Evaluate the profile at the center of `window`.
    ///
    /// Scanning is up to the caller; this only answers "does the middle of this window
    /// look like the profile".
    pub fn process_window(
        &self,
        window: &[f32],
        frequency_start_hz: f64,
        frequency_step_hz: f64,
    ) -> Detection {
        let config = &self.config;
        let length = window.len() as i64;
        if window.len() < config.window_width_points(frequency_step_hz) {
            return Detection::NotApplicable;
        }

        let center_pos = length / 2;
        let center_freq = frequency_start_hz + frequency_step_hz * center_pos as f64;
        let left_freq = center_freq - config.left_shift_khz * 1000.0;
        let right_freq = center_freq + config.right_shift_khz * 1000.0;
        let left_pos = ((left_freq - frequency_start_hz) / frequency_step_hz) as i64;
        let right_pos = ((right_freq - frequency_start_hz) / frequency_step_hz) as i64;

        let center_width = (config.center_width_khz * 1000.0 / frequency_step_hz) as i64;
        let left_width = (config.left_width_khz * 1000.0 / frequency_step_hz) as i64;
        let right_width = (config.right_width_khz * 1000.0 / frequency_step_hz) as i64;

        if left_pos - 2 * left_width < 0
            || left_pos >= length
            || right_pos < 0
            || right_pos + 2 * right_width >= length
            || center_width as f64 * 2.1 > length as f64
        {
            return Detection::NotApplicable;
        }

        // Noise floor from everything outside the side bands, trimmed to the samples below
        // its own mean
        let left_out = band(window, 0, left_pos - left_width).unwrap_or(&[]);
        let right_out = band(window, right_pos + right_width, length).unwrap_or(&[]);
        let outside = || left_out.iter().chain(right_out).copied();
        let out_total: f64 = outside().map(f64::from).sum();
        let out_average = out_total / (outside().count() as f64 + OUT_COUNT_FLOOR);
        let out_low_average = match below(outside(), out_average) {
            (_, 0) => out_average,
            (low_sum, low_n) => low_sum / (low_n as f64 + OUT_COUNT_FLOOR),
        };

        let Some(center_band) =
            band(window, center_pos - center_width, center_pos + center_width)
        else {
            return Detection::NotApplicable;
        };
        let (center_power, center_power_high) = high_mean(center_band);

        let (left_power_high, right_power_high) = if config.single_peak {
            (0.0, 0.0)
        } else {
            let (Some(left_band), Some(right_band)) = (
                band(window, left_pos - left_width, left_pos + left_width),
                band(window, right_pos - right_width, right_pos + right_width),
            ) else {
                return Detection::NotApplicable;
            };
            (high_mean(left_band).1, high_mean(right_band).1)
        };

        let center_to_background = center_power_high - out_low_average;
        let left_to_background = left_power_high - out_low_average;
        let right_to_background = right_power_high - out_low_average;

        let mut score = if config.single_peak {
            center_to_background
        } else {
            let reference = nonzero(center_to_background, OUT_COUNT_FLOOR);
            let relative_match = |target: f64, to_background: f64| {
                (1.0 - (target - to_background / reference).abs()).max(RELATIVE_MATCH_FLOOR)
            };
            let rel_left = relative_match(config.left_relative_power, left_to_background);
            let rel_right = relative_match(config.right_relative_power, right_to_background);
            center_to_background * rel_left * rel_right
        };

        let standard_min_hz = config.standard_min_frequency_mhz * 1_000_000.0;
        let standard_max_hz = config.standard_max_frequency_mhz * 1_000_000.0;
        if center_freq < standard_min_hz {
            score *= center_freq / standard_min_hz;
        }
        if center_freq > standard_max_hz {
            score *= standard_max_hz / center_freq;
        }

        // Channel edges: trailing level walking outward from the side peak positions
        let edge_level = (center_power_high + out_average) * 0.5;
        let mut level = f64::from(window[left_pos as usize]);
        let mut left_edge = left_pos;
        for x in (1..=left_pos).rev() {
            level = level * EDGE_SMOOTHING + (1.0 - EDGE_SMOOTHING) * f64::from(window[x as usize]);
            left_edge = x;
            if level < edge_level {
                break;
            }
        }
        let mut level = f64::from(window[right_pos as usize]);
        let mut right_edge = right_pos;
        for x in right_pos..length {
            level = level * EDGE_SMOOTHING + (1.0 - EDGE_SMOOTHING) * f64::from(window[x as usize]);
            right_edge = x;
            if level < edge_level {
                break;
            }
        }

        Detection::Scored(DetectionResult {
            score,
            power_db: center_power,
            bandwidth_hz: (right_edge - left_edge) as f64 * frequency_step_hz,
            centroid_hz: None,
        })
    }

    /// Bins needed on each side of the candidate for the geometry to fit.
    fn half_window(&self, frequency_step_hz: f64) -> usize {
        let config = &self.config;
        let bins = |khz: f64| (khz * 1000.0 / frequency_step_hz).ceil() as usize;
        let left = bins(config.left_shift_khz + 2.1 * config.left_width_khz);
        let right = bins(config.right_shift_khz + 2.1 * config.right_width_khz);
        let center = bins(1.05 * config.center_width_khz);
        left.max(right).max(center) + 1
    }
}

impl Detector for FiveBandDetector {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn apply(&self, spectrum: &AveragedSpectrum, candidate_hz: f64) -> Detection {
        let Some(slot) = spectrum.slot_of(candidate_hz) else {
            return Detection::NotApplicable;
        };
        let half = self.half_window(spectrum.step_hz());
        let Some(begin) = slot.checked_sub(half) else {
            return Detection::NotApplicable;
        };
        let end = slot + half + 1;
        if end > spectrum.len() {
            return Detection::NotApplicable;
        }
        self.process_window(
            &spectrum.powers()[begin..end],
            spectrum.frequency_of(begin),
            spectrum.step_hz(),
        )
    }

    fn is_detection(&self, result: &DetectionResult) -> bool {
        result.score >= self.config.min_score
    }

    fn window_width_points(&self, frequency_step_hz: f64) -> usize {
        self.config.window_width_points(frequency_step_hz)
    }

    fn reach_khz(&self) -> (f64, f64) {
        (self.config.min_offset_khz(), self.config.max_offset_khz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f64 = 1000.0;

    fn config(single_peak: bool) -> FiveBandConfig {
        FiveBandConfig {
            name: "test".to_string(),
            standard_min_frequency_mhz: 0.0,
            standard_max_frequency_mhz: 1000.0,
            single_peak,
            center_width_khz: 4.0,
            left_shift_khz: 20.0,
            left_width_khz: 4.0,
            right_shift_khz: 20.0,
            right_width_khz: 4.0,
            left_relative_power: 0.5,
            right_relative_power: 0.5,
            min_score: 10.0,
        }
    }

    fn fill(window: &mut [f32], center: usize, half_width: usize, level: f32) {
        window[center - half_width..center + half_width].iter_mut().for_each(|p| *p = level);
    }

    #[test]
    fn test_short_window_is_not_applicable() {
        let detector = FiveBandDetector::new(config(false));
        let needed = detector.window_width_points(STEP);
        assert_eq!(needed, 56);

        let window = vec![-90.0f32; needed - 1];
        let detection = detector.process_window(&window, 0.0, STEP);

        assert_eq!(detection, Detection::NotApplicable);
        assert_eq!(detection.score(), -1.0);
    }

    #[test]
    fn test_single_peak_scores_center_over_background() {
        let detector = FiveBandDetector::new(config(true));
        let mut window = vec![-90.0f32; 101];
        fill(&mut window, 50, 4, -40.0);

        let result = *detector.process_window(&window, 0.0, STEP).result().unwrap();

        // Center band [46, 54) is entirely at -40 dB, so its high mean falls back to -40
        assert!((result.score - 50.0).abs() < 1e-3, "score {}", result.score);
        assert!((result.power_db + 40.0).abs() < 1e-6);
        assert!(detector.is_detection(&result));
    }

    #[test]
    fn test_matching_side_peaks_score_higher_than_missing_ones() {
        let detector = FiveBandDetector::new(config(false));
        let mut window = vec![-90.0f32; 101];
        fill(&mut window, 50, 4, -40.0);
        let center_only = detector.process_window(&window, 0.0, STEP).score();

        // Side peaks 25 dB over the floor: half of the center's 50 dB
        fill(&mut window, 30, 2, -65.0);
        fill(&mut window, 70, 2, -65.0);
        let with_sides = detector.process_window(&window, 0.0, STEP).score();

        assert!(with_sides > 40.0, "score {}", with_sides);
        assert!(center_only < with_sides);
        // Missing side peaks only match to 1 - 0.5 each
        assert!((center_only - 12.5).abs() < 1e-3, "score {}", center_only);
    }

    #[test]
    fn test_relative_match_is_floored() {
        let mut config = config(false);
        config.left_relative_power = 5.0;
        config.right_relative_power = 5.0;
        let detector = FiveBandDetector::new(config);
        let mut window = vec![-90.0f32; 101];
        fill(&mut window, 50, 4, -40.0);

        let score = detector.process_window(&window, 0.0, STEP).score();

        assert!((score - 50.0 * 0.01 * 0.01).abs() < 1e-6, "score {}", score);
    }

    #[test]
    fn test_out_of_range_frequency_is_penalized() {
        let mut config = config(true);
        config.standard_min_frequency_mhz = 200.0;
        config.standard_max_frequency_mhz = 300.0;
        let detector = FiveBandDetector::new(config);
        let mut window = vec![-90.0f32; 101];
        fill(&mut window, 50, 4, -40.0);

        // Window center at 100 MHz, half the configured minimum
        let low = detector.process_window(&window, 100e6 - 50.0 * STEP, STEP).score();
        // Window center at 600 MHz, twice the configured maximum
        let high = detector.process_window(&window, 600e6 - 50.0 * STEP, STEP).score();
        let inside = detector.process_window(&window, 250e6 - 50.0 * STEP, STEP).score();

        assert!((low - 25.0).abs() < 1e-3, "score {}", low);
        assert!((high - 25.0).abs() < 1e-3, "score {}", high);
        assert!((inside - 50.0).abs() < 1e-3, "score {}", inside);
    }

    #[test]
    fn test_bandwidth_walk_stops_at_floor() {
        let detector = FiveBandDetector::new(config(true));
        let mut window = vec![-90.0f32; 101];
        // Wide plateau reaching both side positions
        fill(&mut window, 50, 30, -40.0);

        let result = *detector.process_window(&window, 0.0, STEP).result().unwrap();

        assert!(result.bandwidth_hz > 40.0 * STEP, "bandwidth {}", result.bandwidth_hz);
        assert!(result.bandwidth_hz < 80.0 * STEP, "bandwidth {}", result.bandwidth_hz);
    }

    #[test]
    fn test_apply_centers_window_on_candidate() {
        let detector = FiveBandDetector::new(config(true));
        let mut powers = vec![-90.0f32; 400];
        fill(&mut powers, 250, 4, -40.0);
        let spectrum = AveragedSpectrum::new(200_000.0, 400.0 * STEP, powers);

        let on_peak = detector.apply(&spectrum, spectrum.frequency_of(250));
        let off_peak = detector.apply(&spectrum, spectrum.frequency_of(150));
        let at_edge = detector.apply(&spectrum, spectrum.frequency_of(10));

        assert!((on_peak.score() - 50.0).abs() < 1e-3);
        assert!(off_peak.score().abs() < 1e-3);
        assert_eq!(at_edge, Detection::NotApplicable);
    }
}
