use flume::{SendTimeoutError, Sender, TrySendError};
use log::{debug, error, warn};
use rustradio::block::{Block, BlockRet};
use rustradio::stream::ReadStream;
use rustradio::{Error, rustradio_macros};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use scanmon_messages::{Event, SweepReport};

use crate::accumulator::SweepAccumulator;
use crate::detector::DetectorBank;
use crate::tuner::Tuner;

/// How long a terminal fault waits for room in the event channel.
const FAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the sweep stopped, shared between the scanner and whoever runs its graph.
#[derive(Debug, Clone, Default)]
pub struct FaultSlot(Arc<Mutex<Option<String>>>);

impl FaultSlot {
    pub fn set(&self, reason: String) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason);
    }

    pub fn take(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Averages spectrum frames, runs the detectors on every finished step, reports it over
/// a flume channel and retunes for the next step.
pub struct SweepProcessor {
    accumulator: SweepAccumulator<Box<dyn Tuner>>,
    detectors: DetectorBank,
    event_tx: Sender<Event>,
    fault: FaultSlot,
    started: Instant,
    sequence: u64,
    dropped_reports: u64,
}

impl SweepProcessor {
    pub fn new(
        accumulator: SweepAccumulator<Box<dyn Tuner>>,
        detectors: DetectorBank,
        event_tx: Sender<Event>,
        fault: FaultSlot,
    ) -> Self {
        Self {
            accumulator,
            detectors,
            event_tx,
            fault,
            started: Instant::now(),
            sequence: 0,
            dropped_reports: 0,
        }
    }

    pub fn vector_length(&self) -> usize {
        self.accumulator.vector_length()
    }

    /// Feed one frame through. Returns `false` once the sweep must stop.
    pub fn process_frame(&mut self, frame: &[f32]) -> bool {
        match self.accumulator.accumulate(frame) {
            Ok(false) => return true,
            Ok(true) => {}
            Err(e) => {
                warn!("Dropping frame at {} Hz: {}", self.accumulator.current_freq(), e);
                return true;
            }
        }

        let overloaded_frames = self.accumulator.overloaded_frames();
        let spectrum = match self.accumulator.finalize() {
            Ok(spectrum) => spectrum,
            Err(e) => return self.fail(e.to_string()),
        };
        let signals = self.detectors.scan(&spectrum);
        self.sequence += 1;
        debug!(
            "Step {} at {} Hz: {} signal(s)",
            self.sequence,
            spectrum.center_hz(),
            signals.len()
        );

        let report = SweepReport {
            sequence: self.sequence,
            elapsed: self.started.elapsed(),
            spectrum,
            signals,
            overloaded_frames,
        };
        // Never stall the sweep on a slow consumer
        match self.event_tx.try_send(Event::Sweep(report)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped_reports += 1;
                warn!(
                    "Report channel full, dropped step {} ({} dropped so far)",
                    self.sequence, self.dropped_reports
                );
            }
            Err(TrySendError::Disconnected(_)) => return false,
        }

        match self.accumulator.advance() {
            Ok(_) => true,
            Err(e) => self.fail(e.to_string()),
        }
    }

    /// Record the fault and hand it to the consumer. The sweep is over, so waiting
    /// for room in the channel is fine here.
    fn fail(&mut self, reason: String) -> bool {
        error!("Sweep stopped: {}", reason);
        self.fault.set(reason.clone());
        match self.event_tx.send_timeout(Event::Fault(reason), FAULT_SEND_TIMEOUT) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => warn!("Report channel still full, fault not delivered"),
            Err(SendTimeoutError::Disconnected(_)) => {}
        }
        false
    }
}

/// A sink block that feeds FFT frames to a [`SweepProcessor`].
#[derive(rustradio_macros::Block)]
pub struct ScannerSink {
    #[rustradio(in)]
    src: ReadStream<f32>,
    processor: SweepProcessor,
}

impl ScannerSink {
    pub fn new(src: ReadStream<f32>, processor: SweepProcessor) -> Self {
        Self { src, processor }
    }
}

impl Block for ScannerSink {
    fn work(&mut self) -> Result<BlockRet<'_>, Error> {
        let n = self.processor.vector_length();

        let frame: Vec<f32> = {
            let (input, _tags) = self.src.read_buf()?;

            // Wait until we have at least one FFT frame
            if input.len() < n {
                return Ok(BlockRet::Pending);
            }

            // Only process one FFT frame at a time
            let frame = input.iter().take(n).copied().collect();
            input.consume(n);
            frame
        };

        if self.processor.process_frame(&frame) {
            Ok(BlockRet::Again)
        } else {
            Ok(BlockRet::EOF)
        }
    }
}
