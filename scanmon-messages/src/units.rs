use serde::{Deserialize, Serialize};

/// Frequency in Hertz.
///
/// Kept as `f64`: GHz-scale centers with Hz-scale bin offsets do not survive `f32`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hertz(pub f64);

impl std::fmt::Display for Hertz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6} MHz", self.as_mhz())
    }
}

impl Hertz {
    pub const fn khz(khz: f64) -> Self {
        Self(khz * 1_000.0)
    }

    pub const fn mhz(mhz: f64) -> Self {
        Self(mhz * 1_000_000.0)
    }

    pub const fn ghz(ghz: f64) -> Self {
        Self(ghz * 1_000_000_000.0)
    }

    pub const fn as_hz(self) -> f64 {
        self.0
    }

    pub const fn as_mhz(self) -> f64 {
        self.0 / 1_000_000.0
    }
}

impl From<f64> for Hertz {
    fn from(hz: f64) -> Self {
        Self(hz)
    }
}

impl From<Hertz> for f64 {
    fn from(hz: Hertz) -> Self {
        hz.0
    }
}

/// Power level in Decibels (dB).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decibels(pub f32);

impl std::fmt::Display for Decibels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} dB", self.0)
    }
}

impl Decibels {
    /// Convert decibels to a linear power ratio.
    /// For power: linear = 10^(dB/10)
    pub fn to_power_ratio(self) -> f64 {
        10.0_f64.powf(f64::from(self.0) / 10.0)
    }

    /// Convert a linear power ratio to decibels.
    /// For power: dB = 10 * log10(linear)
    pub fn from_power_ratio(linear: f64) -> Self {
        Self((10.0 * linear.log10()) as f32)
    }

    pub const fn as_db(self) -> f32 {
        self.0
    }
}

impl From<f32> for Decibels {
    fn from(db: f32) -> Self {
        Self(db)
    }
}

impl From<Decibels> for f32 {
    fn from(db: Decibels) -> Self {
        db.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hertz_constructors() {
        assert_eq!(Hertz::khz(12.5), Hertz(12_500.0));
        assert_eq!(Hertz::mhz(433.92).as_hz(), 433_920_000.0);
        assert_eq!(Hertz::ghz(1.2).as_mhz(), 1_200.0);
        assert_eq!(Hertz::mhz(100.0).to_string(), "100.000000 MHz");
    }

    #[test]
    fn test_decibel_power_conversion() {
        assert!((Decibels(20.0).to_power_ratio() - 100.0).abs() < 1e-9);
        assert!((Decibels::from_power_ratio(1000.0).as_db() - 30.0).abs() < 1e-5);
        assert_eq!(Decibels(-3.04).to_string(), "-3.0 dB");
    }
}
