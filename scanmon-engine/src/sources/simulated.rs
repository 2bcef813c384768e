use log::debug;
use scanmon_messages::{Decibels, Emitter};
use std::io;
use std::thread;
use std::time::Duration;

use super::FrameSource;
use crate::accumulator::fft_shift;
use crate::tuner::SharedFrequency;

/// Renders the spectrum a receiver tuned to the shared frequency would see: a flat noise
/// floor with rectangular emitters power-summed on top. Frames come out in FFT-bin order.
///
/// Deterministic; the same tuning always yields the same frame.
pub struct SimulatedReceiver {
    frequency: SharedFrequency,
    sample_rate_hz: f64,
    noise_floor: Decibels,
    emitters: Vec<Emitter>,
    frame_period: Option<Duration>,
}

impl SimulatedReceiver {
    pub fn new(
        frequency: SharedFrequency,
        sample_rate_hz: f64,
        noise_floor: Decibels,
        emitters: Vec<Emitter>,
    ) -> Self {
        debug!(
            "Simulated receiver: floor {}, {} emitter(s)",
            noise_floor,
            emitters.len()
        );
        Self {
            frequency,
            sample_rate_hz,
            noise_floor,
            emitters,
            frame_period: None,
        }
    }

    /// Pace frames at the rate a real analyzer of `fft_size` bins would deliver them.
    pub fn paced(mut self, fft_size: usize) -> Self {
        self.frame_period = Some(Duration::from_secs_f64(fft_size as f64 / self.sample_rate_hz));
        self
    }

    /// Power at `frequency_hz` in dB.
    pub fn power_at(&self, frequency_hz: f64) -> f32 {
        let linear: f64 = self
            .emitters
            .iter()
            .filter(|e| (frequency_hz - e.frequency.as_hz()).abs() <= e.bandwidth.as_hz() / 2.0)
            .map(|e| e.power.to_power_ratio())
            .sum();
        Decibels::from_power_ratio(self.noise_floor.to_power_ratio() + linear).0
    }
}

impl FrameSource for SimulatedReceiver {
    fn read_frame(&mut self, frame: &mut [f32]) -> io::Result<bool> {
        if let Some(period) = self.frame_period {
            thread::sleep(period);
        }
        let n = frame.len();
        let step = self.sample_rate_hz / n as f64;
        let start = self.frequency.get() - self.sample_rate_hz / 2.0;
        let ordered: Vec<f32> = (0..n)
            .map(|slot| self.power_at(start + slot as f64 * step))
            .collect();
        frame.copy_from_slice(&fft_shift(&ordered));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanmon_messages::Hertz;

    fn receiver(center_hz: f64) -> SimulatedReceiver {
        SimulatedReceiver::new(
            SharedFrequency::new(center_hz),
            1.0e6,
            Decibels(-90.0),
            vec![Emitter {
                frequency: Hertz::mhz(100.1),
                bandwidth: Hertz::khz(50.0),
                power: Decibels(-30.0),
            }],
        )
    }

    #[test]
    fn test_emitter_lands_in_expected_bin() {
        let mut source = receiver(100e6);
        let mut frame = vec![0.0f32; 100];
        assert!(source.read_frame(&mut frame).unwrap());

        // Back to frequency order: 10 kHz bins from 99.5 MHz, emitter at slot 60
        let ordered = fft_shift(&frame);
        assert!((ordered[60] - -30.0).abs() < 0.01, "got {}", ordered[60]);
        assert!((ordered[50] - -90.0).abs() < 1e-3);
        assert!((ordered[0] - -90.0).abs() < 1e-3);
        let loud = ordered.iter().filter(|&&p| p > -50.0).count();
        // 100.08 .. 100.12 MHz
        assert_eq!(loud, 5);
    }

    #[test]
    fn test_frame_follows_shared_frequency() {
        let mut source = receiver(100e6);
        let frequency = source.frequency.clone();
        let mut frame = vec![0.0f32; 100];

        frequency.set(150e6);
        source.read_frame(&mut frame).unwrap();
        assert!(frame.iter().all(|&p| (p - -90.0).abs() < 1e-3));

        frequency.set(100.1e6);
        source.read_frame(&mut frame).unwrap();
        // Emitter now sits on DC, which is raw bin 0
        assert!(frame[0] > -31.0);
    }

    #[test]
    fn test_overlapping_emitters_add_in_power() {
        let source = SimulatedReceiver::new(
            SharedFrequency::new(0.0),
            1.0e6,
            Decibels(-200.0),
            vec![
                Emitter {
                    frequency: Hertz(1000.0),
                    bandwidth: Hertz(100.0),
                    power: Decibels(-30.0),
                },
                Emitter {
                    frequency: Hertz(1000.0),
                    bandwidth: Hertz(100.0),
                    power: Decibels(-30.0),
                },
            ],
        );
        assert!((source.power_at(1000.0) - -26.99).abs() < 0.01);
    }
}
