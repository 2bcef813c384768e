use serde::{Deserialize, Serialize};

/// Parameters of the three-band detector: a center band flanked by two shoulder bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreeBandConfig {
    pub name: String,
    /// Nominal range where this signal type is expected. Informational only.
    pub standard_min_frequency_mhz: f64,
    pub standard_max_frequency_mhz: f64,
    pub center_width_khz: f64,
    pub side_width_khz: f64,
    /// Minimum level of the peak over each shoulder, in dB.
    pub detection_threshold_db: f64,
    /// Reserved for a future bandwidth estimator.
    #[serde(default)]
    pub bw_threshold: f64,
}

impl ThreeBandConfig {
    pub fn min_offset_khz(&self) -> f64 {
        self.center_width_khz / 2.0 + self.side_width_khz
    }

    pub fn max_offset_khz(&self) -> f64 {
        self.center_width_khz / 2.0 + self.side_width_khz
    }

    /// Number of bins the detector needs around a candidate.
    pub fn window_width_points(&self, frequency_step_hz: f64) -> usize {
        ((2.0 * self.side_width_khz + self.center_width_khz) * 1000.0 / frequency_step_hz) as usize
    }
}

/// Parameters of the legacy five-band detector.
///
/// ```text
///                     __
///                    /  \
///              _____/    \    _
///             /           \__/ \
/// ___________/  ^             ^ \__________
///               |<-- left     |
///               |   shift     |
///                     right shift -->|
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiveBandConfig {
    pub name: String,
    /// Outside this range the score is scaled down linearly with the distance.
    pub standard_min_frequency_mhz: f64,
    pub standard_max_frequency_mhz: f64,
    /// Score the center band only and ignore the side peaks.
    #[serde(default)]
    pub single_peak: bool,
    pub center_width_khz: f64,
    pub left_shift_khz: f64,
    pub left_width_khz: f64,
    pub right_shift_khz: f64,
    pub right_width_khz: f64,
    /// Expected side-peak to center-peak level over background.
    pub left_relative_power: f64,
    pub right_relative_power: f64,
    /// Scores at or above this count as a detection.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

fn default_min_score() -> f64 {
    10.0
}

impl FiveBandConfig {
    pub fn min_offset_khz(&self) -> f64 {
        self.left_shift_khz + 2.0 * self.left_width_khz
    }

    pub fn max_offset_khz(&self) -> f64 {
        self.right_shift_khz + 2.0 * self.right_width_khz
    }

    pub fn window_width_points(&self, frequency_step_hz: f64) -> usize {
        ((self.left_shift_khz
            + 2.1 * self.left_width_khz
            + self.right_shift_khz
            + 2.1 * self.right_width_khz)
            * 1000.0
            / frequency_step_hz) as usize
    }
}

/// A named detector profile as written in a profile file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorProfile {
    ThreeBand(ThreeBandConfig),
    FiveBand(FiveBandConfig),
}

impl DetectorProfile {
    pub fn name(&self) -> &str {
        match self {
            Self::ThreeBand(config) => &config.name,
            Self::FiveBand(config) => &config.name,
        }
    }

    /// Profiles used when none are configured.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::ThreeBand(ThreeBandConfig {
                name: "narrowband-fm".to_string(),
                standard_min_frequency_mhz: 30.0,
                standard_max_frequency_mhz: 1000.0,
                center_width_khz: 25.0,
                side_width_khz: 12.5,
                detection_threshold_db: 6.0,
                bw_threshold: 0.0,
            }),
            Self::ThreeBand(ThreeBandConfig {
                name: "wideband-fm".to_string(),
                standard_min_frequency_mhz: 87.5,
                standard_max_frequency_mhz: 108.0,
                center_width_khz: 250.0,
                side_width_khz: 100.0,
                detection_threshold_db: 10.0,
                bw_threshold: 0.0,
            }),
            // Reaches 1.45 MHz below and 4.7 MHz above the candidate, so it only fires on
            // captures wider than about 6.2 MHz and is skipped otherwise
            Self::FiveBand(FiveBandConfig {
                name: "analog-tv".to_string(),
                standard_min_frequency_mhz: 47.0,
                standard_max_frequency_mhz: 862.0,
                single_peak: false,
                center_width_khz: 100.0,
                left_shift_khz: 1250.0,
                left_width_khz: 100.0,
                right_shift_khz: 4500.0,
                right_width_khz: 100.0,
                left_relative_power: 1.0,
                right_relative_power: 0.5,
                min_score: default_min_score(),
            }),
        ]
    }
}

/// Output of one detector evaluated at one candidate frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionResult {
    /// Detector-specific score. Zero means nothing was found.
    pub score: f64,
    /// Estimated signal power in dB.
    pub power_db: f64,
    pub bandwidth_hz: f64,
    /// Power-weighted mean frequency, when the detector estimates it.
    pub centroid_hz: Option<f64>,
}

impl DetectionResult {
    /// Bandwidth reported alongside a zero score.
    pub const SENTINEL_BANDWIDTH_HZ: f64 = 0.0001;

    /// The "nothing here" result.
    pub fn rejected() -> Self {
        Self {
            score: 0.0,
            power_db: 0.0,
            bandwidth_hz: Self::SENTINEL_BANDWIDTH_HZ,
            centroid_hz: None,
        }
    }
}

/// Outcome of applying a detector at a candidate frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    Scored(DetectionResult),
    /// The detector geometry does not fit into the supplied spectrum.
    NotApplicable,
}

impl Detection {
    /// Score with the legacy `-1` convention for `NotApplicable`.
    pub fn score(&self) -> f64 {
        match self {
            Self::Scored(result) => result.score,
            Self::NotApplicable => -1.0,
        }
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        match self {
            Self::Scored(result) => Some(result),
            Self::NotApplicable => None,
        }
    }
}

/// A detection found while scanning one averaged spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalReport {
    /// Name of the profile that fired.
    pub detector: String,
    pub candidate_hz: f64,
    pub result: DetectionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_geometry() {
        let DetectorProfile::ThreeBand(narrow) = &DetectorProfile::defaults()[0] else {
            panic!("first default should be three-band");
        };
        assert_eq!(narrow.min_offset_khz(), 25.0);
        assert_eq!(narrow.window_width_points(1000.0), 50);

        let DetectorProfile::FiveBand(tv) = &DetectorProfile::defaults()[2] else {
            panic!("third default should be five-band");
        };
        assert_eq!(tv.min_offset_khz(), 1450.0);
        assert_eq!(tv.max_offset_khz(), 4700.0);
        assert_eq!(tv.window_width_points(1000.0), 6170);
    }

    #[test]
    fn test_profile_json() {
        let json = r#"[
            {"kind": "three_band", "name": "pmr446", "standard_min_frequency_mhz": 446.0,
             "standard_max_frequency_mhz": 446.2, "center_width_khz": 12.5,
             "side_width_khz": 6.25, "detection_threshold_db": 8.0},
            {"kind": "five_band", "name": "legacy", "standard_min_frequency_mhz": 50.0,
             "standard_max_frequency_mhz": 800.0, "single_peak": true,
             "center_width_khz": 10.0, "left_shift_khz": 20.0, "left_width_khz": 5.0,
             "right_shift_khz": 20.0, "right_width_khz": 5.0,
             "left_relative_power": 0.0, "right_relative_power": 0.0}
        ]"#;

        let profiles: Vec<DetectorProfile> = serde_json::from_str(json).unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name(), "pmr446");
        match &profiles[1] {
            DetectorProfile::FiveBand(config) => {
                assert!(config.single_peak);
                assert_eq!(config.min_score, 10.0);
            }
            other => panic!("expected five-band profile, got {:?}", other),
        }
    }

    #[test]
    fn test_not_applicable_score() {
        assert_eq!(Detection::NotApplicable.score(), -1.0);
        assert_eq!(Detection::Scored(DetectionResult::rejected()).score(), 0.0);
        assert!(Detection::NotApplicable.result().is_none());
    }
}
