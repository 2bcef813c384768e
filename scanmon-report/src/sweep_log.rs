use log::debug;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use scanmon_messages::AveragedSpectrum;

/// Minimum center movement between two log files.
const LOG_SPACING_HZ: f64 = 1_000_000.0;

/// Elapsed time as `(hours, minutes, seconds)`.
pub(crate) fn clock(elapsed: Duration) -> (u64, u64, u64) {
    let t = elapsed.as_secs();
    (t / 3600, (t % 3600) / 60, t % 60)
}

/// Writes one text file per averaged spectrum, at most one per MHz of tuner movement.
pub struct SweepLog {
    dir: PathBuf,
    last_log_out: f64,
}

impl SweepLog {
    /// Log into `dir`, creating it when missing.
    pub fn new<P: Into<PathBuf>>(dir: P) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Logging spectra to {}", dir.display());
        Ok(Self {
            dir,
            last_log_out: 0.0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `spectrum` if its center moved at least 1 MHz since the last file.
    ///
    /// Returns the path written, or `None` when suppressed. The center counts as logged
    /// even when the write fails.
    pub fn record(
        &mut self,
        spectrum: &AveragedSpectrum,
        elapsed: Duration,
    ) -> io::Result<Option<PathBuf>> {
        let center = spectrum.center_hz();
        if (center - self.last_log_out).abs() < LOG_SPACING_HZ {
            return Ok(None);
        }
        self.last_log_out = center;

        let (hours, minutes, seconds) = clock(elapsed);
        let path = self.dir.join(format!(
            "signal_{:02}_{:02}_{:02}_{:.6}_{:.6}.txt",
            hours,
            minutes,
            seconds,
            spectrum.start_hz() / 1e6,
            spectrum.end_hz() / 1e6
        ));

        let mut out = BufWriter::new(File::create(&path)?);
        for bin in spectrum.bins() {
            writeln!(out, "{} {}", bin.frequency_hz, bin.power_db)?;
        }
        out.flush()?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn spectrum(center_hz: f64) -> AveragedSpectrum {
        AveragedSpectrum::new(center_hz, 2e6, vec![-90.0, -20.5, -85.0, -70.25])
    }

    #[test]
    fn test_clock() {
        assert_eq!(clock(Duration::from_secs(3725)), (1, 2, 5));
        assert_eq!(clock(Duration::from_millis(59_999)), (0, 0, 59));
    }

    #[test]
    fn test_file_name_and_contents() {
        let dir = tempdir().unwrap();
        let mut log = SweepLog::new(dir.path()).unwrap();

        let path = log
            .record(&spectrum(100e6), Duration::from_secs(3725))
            .unwrap()
            .expect("first spectrum is logged");

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "signal_01_02_05_99.000000_101.000000.txt"
        );
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "99000000 -90",
                "99500000 -20.5",
                "100000000 -85",
                "100500000 -70.25"
            ]
        );
    }

    #[test]
    fn test_log_needs_one_mhz_of_movement() {
        let dir = tempdir().unwrap();
        let mut log = SweepLog::new(dir.path().join("logs")).unwrap();
        let elapsed = Duration::from_secs(1);

        // Anything within 1 MHz of zero never logs
        assert!(log.record(&spectrum(0.5e6), elapsed).unwrap().is_none());
        assert!(log.record(&spectrum(100e6), elapsed).unwrap().is_some());
        assert!(log.record(&spectrum(100.8e6), elapsed).unwrap().is_none());
        assert!(log.record(&spectrum(101e6), elapsed).unwrap().is_some());
        // Wraparound back to the start is a big move
        assert!(log.record(&spectrum(100e6), elapsed).unwrap().is_some());

        assert_eq!(std::fs::read_dir(log.dir()).unwrap().count(), 2);
    }
}
