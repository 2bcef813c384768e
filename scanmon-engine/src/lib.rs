mod accumulator;
mod detector;
mod error;
mod graph;
mod sinks;
mod sources;
mod tuner;

pub use accumulator::{SweepAccumulator, fft_shift};
pub use detector::{
    Detector, DetectorBank, FiveBandDetector, ThreeBandDetector, build_detector, scan_candidates,
};
pub use error::{ScanError, ScanResult};
pub use graph::{SweepGraph, build_graph};
pub use sources::{FileFrameSource, FrameSource, SimulatedReceiver};
pub use tuner::{SharedFrequency, SimulatedTuner, Tuner};

use anyhow::{Result, anyhow};
use flume::{Receiver, Sender};
use log::{debug, error, info};
use rustradio::graph::{CancellationToken, GraphRunner};
use scanmon_messages::{Command, Event, Hertz, ScanConfig, ScanState};
use std::thread;
use std::time::Duration;

const FAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// The sweep engine backend.
/// Owns the rustradio graph and processes commands from the front end.
pub struct Engine {
    cmd_rx: Receiver<Command>,
    event_tx: Sender<Event>,
    current_config: ScanConfig,
    should_exit: bool,
}

impl Engine {
    /// Create a new Engine instance.
    pub fn new(cmd_rx: Receiver<Command>, event_tx: Sender<Event>, config: ScanConfig) -> Self {
        debug!("Constructing a new engine");
        Self {
            cmd_rx,
            event_tx,
            current_config: config,
            should_exit: false,
        }
    }

    /// Run the engine (blocking).
    /// Runs in a loop that restarts the sweep graph whenever the scan configuration changes.
    pub fn run(mut self) -> Result<()> {
        while !self.should_exit {
            self.run_graph_iteration()?;
        }
        Ok(())
    }

    fn run_graph_iteration(&mut self) -> Result<()> {
        let SweepGraph {
            mut graph,
            tuned_hz,
            fault,
        } = match build_graph(self.event_tx.clone(), &self.current_config) {
            Ok(built) => built,
            Err(e) => {
                let _ = self
                    .event_tx
                    .send_timeout(Event::Fault(e.to_string()), FAULT_SEND_TIMEOUT);
                return Err(e.into());
            }
        };
        let cancel_token = graph.cancel_token();

        let state = ScanState {
            center_frequency: Hertz(tuned_hz),
            sample_rate: self.current_config.sample_rate,
            fft_size: self.current_config.fft_size,
            avg_size: self.current_config.avg_size,
            config: self.current_config.clone(),
        };
        self.event_tx.send(Event::StateSnapshot(state))?;

        let graph_handle = thread::spawn(move || graph.run());

        self.process_commands(&cancel_token, &graph_handle);

        match graph_handle.join() {
            Ok(Err(e)) => error!("Sweep graph failed: {}", e),
            Err(_) => error!("Sweep graph panicked"),
            Ok(Ok(())) => {}
        }
        match fault.take() {
            Some(reason) => Err(anyhow!("Sweep stopped: {}", reason)),
            None => Ok(()),
        }
    }

    fn process_commands(
        &mut self,
        cancel_token: &CancellationToken,
        graph_handle: &thread::JoinHandle<std::result::Result<(), rustradio::Error>>,
    ) {
        loop {
            let msg = self.cmd_rx.recv_timeout(Duration::from_millis(100));

            match msg {
                Ok(Command::Stop) | Err(flume::RecvTimeoutError::Disconnected) => {
                    debug!("Engine received {:?}", msg);
                    self.should_exit = true;
                    cancel_token.cancel();
                    break;
                }
                Ok(Command::ChangeScan(new_config)) => {
                    info!(
                        "Restarting sweep over {} .. {}",
                        new_config.start, new_config.end
                    );
                    self.current_config = new_config;
                    cancel_token.cancel();
                    break;
                }
                Err(flume::RecvTimeoutError::Timeout) => {
                    if graph_handle.is_finished() {
                        self.should_exit = true;
                        break;
                    }
                }
            }
        }
    }
}
