//! Band statistics shared by the detectors. Power values are dB.

/// Plain mean. Callers guarantee a non-empty band.
pub(crate) fn mean(band: &[f32]) -> f64 {
    band.iter().map(|&p| f64::from(p)).sum::<f64>() / band.len() as f64
}

/// Sum and count of samples strictly above `level`.
pub(crate) fn above(band: impl IntoIterator<Item = f32>, level: f64) -> (f64, usize) {
    band.into_iter()
        .map(f64::from)
        .filter(|&p| p > level)
        .fold((0.0, 0), |(sum, n), p| (sum + p, n + 1))
}

/// Sum and count of samples strictly below `level`.
pub(crate) fn below(band: impl IntoIterator<Item = f32>, level: f64) -> (f64, usize) {
    band.into_iter()
        .map(f64::from)
        .filter(|&p| p < level)
        .fold((0.0, 0), |(sum, n), p| (sum + p, n + 1))
}

/// Mean of the samples above the band mean. A band with nothing above its mean is flat,
/// so its high mean is the mean itself.
pub(crate) fn high_mean(band: &[f32]) -> (f64, f64) {
    let plain = mean(band);
    let (sum, n) = above(band.iter().copied(), plain);
    if n == 0 { (plain, plain) } else { (plain, sum / n as f64) }
}

/// Keep magnitude away from zero without flipping the sign.
pub(crate) fn nonzero(value: f64, floor: f64) -> f64 {
    if value.abs() < floor {
        floor.copysign(value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholded_means() {
        let band = [-90.0, -90.0, -10.0, -20.0];
        assert_eq!(mean(&band), -52.5);
        assert_eq!(above(band, -52.5), (-30.0, 2));
        assert_eq!(below(band, -52.5), (-180.0, 2));
        assert_eq!(high_mean(&band), (-52.5, -15.0));
    }

    #[test]
    fn test_high_mean_of_flat_band() {
        assert_eq!(high_mean(&[-80.0; 5]), (-80.0, -80.0));
    }

    #[test]
    fn test_nonzero_keeps_sign() {
        assert_eq!(nonzero(0.0, 1e-6), 1e-6);
        assert_eq!(nonzero(-1e-9, 1e-6), -1e-6);
        assert_eq!(nonzero(-3.0, 1e-6), -3.0);
    }
}
