mod five_band;
mod stats;
mod three_band;

pub use five_band::FiveBandDetector;
pub use three_band::ThreeBandDetector;

use log::{debug, trace};
use scanmon_messages::{AveragedSpectrum, Detection, DetectionResult, DetectorProfile, SignalReport};

/// A signal profile evaluated at one candidate frequency of an averaged spectrum.
pub trait Detector: Send {
    /// Profile name, used to label reports.
    fn name(&self) -> &str;

    /// Score the spectrum at `candidate_hz`. Stateless across calls.
    fn apply(&self, spectrum: &AveragedSpectrum, candidate_hz: f64) -> Detection;

    /// Whether a scored result counts as a detection for this profile.
    fn is_detection(&self, result: &DetectionResult) -> bool;

    /// Bins the profile spans around a candidate.
    fn window_width_points(&self, frequency_step_hz: f64) -> usize;

    /// How far below and above the candidate the profile looks, in kHz.
    fn reach_khz(&self) -> (f64, f64);
}

/// Band widths are floored to whole bins, which can shave up to one bin off each band.
const FIT_SLACK_BINS: f64 = 3.0;

/// Whether the profile can be evaluated anywhere in a spectrum of this size.
fn fits(spectrum: &AveragedSpectrum, detector: &dyn Detector) -> bool {
    let (below, above) = detector.reach_khz();
    let reach_bins = (below + above) * 1000.0 / spectrum.step_hz();
    reach_bins <= spectrum.len() as f64 + FIT_SLACK_BINS
}

pub fn build_detector(profile: &DetectorProfile) -> Box<dyn Detector> {
    match profile {
        DetectorProfile::ThreeBand(config) => Box::new(ThreeBandDetector::new(config.clone())),
        DetectorProfile::FiveBand(config) => Box::new(FiveBandDetector::new(config.clone())),
    }
}

/// Walk candidates across the spectrum every `candidate_step_hz` and collect detections.
///
/// Candidates fire from the low edge of a carrier first; after a hit the walk resumes past
/// its upper edge, so one carrier yields one report.
pub fn scan_candidates(
    spectrum: &AveragedSpectrum,
    detector: &dyn Detector,
    candidate_step_hz: f64,
) -> Vec<SignalReport> {
    let mut reports = Vec::new();
    if spectrum.is_empty() || candidate_step_hz <= 0.0 {
        return reports;
    }
    if !fits(spectrum, detector) {
        trace!(
            "{} reaches past a {} Hz wide spectrum, skipping",
            detector.name(),
            spectrum.end_hz() - spectrum.start_hz()
        );
        return reports;
    }

    let mut candidate = spectrum.start_hz();
    while candidate < spectrum.end_hz() {
        let mut next = candidate + candidate_step_hz;
        if let Detection::Scored(result) = detector.apply(spectrum, candidate) {
            if detector.is_detection(&result) {
                trace!(
                    "{} fired at {} Hz: score {:.3}, {:.1} Hz wide",
                    detector.name(),
                    candidate,
                    result.score,
                    result.bandwidth_hz
                );
                let center = result.centroid_hz.unwrap_or(candidate);
                let upper_edge =
                    (center + result.bandwidth_hz / 2.0).max(candidate + result.bandwidth_hz);
                next = next.max(upper_edge + candidate_step_hz);
                reports.push(SignalReport {
                    detector: detector.name().to_string(),
                    candidate_hz: candidate,
                    result,
                });
            }
        }
        candidate = next;
    }
    reports
}

/// The detectors selected for a scan, run against every averaged spectrum.
pub struct DetectorBank {
    detectors: Vec<Box<dyn Detector>>,
    candidate_step_hz: f64,
}

impl DetectorBank {
    pub fn new(detectors: Vec<Box<dyn Detector>>, candidate_step_hz: f64) -> Self {
        Self {
            detectors,
            candidate_step_hz,
        }
    }

    pub fn from_profiles(profiles: &[DetectorProfile], candidate_step_hz: f64) -> Self {
        debug!(
            "Building detector bank: {:?}",
            profiles.iter().map(DetectorProfile::name).collect::<Vec<_>>()
        );
        Self::new(profiles.iter().map(build_detector).collect(), candidate_step_hz)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Every detection of every profile in this spectrum.
    pub fn scan(&self, spectrum: &AveragedSpectrum) -> Vec<SignalReport> {
        self.detectors
            .iter()
            .flat_map(|detector| {
                scan_candidates(spectrum, detector.as_ref(), self.candidate_step_hz)
            })
            .collect()
    }
}
