use flume::Sender;
use log::info;
use rustradio::graph::{Graph, GraphRunner};

use scanmon_messages::{Event, ScanConfig, SourceConfig};

use crate::ScanResult;
use crate::accumulator::SweepAccumulator;
use crate::detector::DetectorBank;
use crate::sinks::{FaultSlot, ScannerSink, SweepProcessor};
use crate::sources::{FileFrameSource, FrameSource, FrameSourceBlock, SimulatedReceiver};
use crate::tuner::{SharedFrequency, SimulatedTuner, Tuner};

/// A sweep graph ready to run.
pub struct SweepGraph {
    pub graph: Graph,
    /// Frequency the sweep starts on.
    pub tuned_hz: f64,
    /// Set when the sweep stops on an error instead of a cancel or end of input.
    pub fault: FaultSlot,
}

/// Build the sweep graph: frame source → scanner sink.
///
/// The tuner is commanded to the first reachable step before the graph is returned, so a
/// range with nothing tunable fails here rather than inside the graph.
pub fn build_graph(event_tx: Sender<Event>, config: &ScanConfig) -> ScanResult<SweepGraph> {
    let frequency = SharedFrequency::new(config.start.as_hz());
    let (source, holes): (Box<dyn FrameSource>, _) = match &config.source {
        SourceConfig::Simulated {
            noise_floor,
            emitters,
            holes,
        } => {
            let receiver = SimulatedReceiver::new(
                frequency.clone(),
                config.sample_rate.as_hz(),
                *noise_floor,
                emitters.clone(),
            )
            .paced(config.fft_size);
            (Box::new(receiver), holes.clone())
        }
        // Recordings carry no tuner; the sweep bookkeeping still walks the range
        SourceConfig::File { path, looping } => {
            (Box::new(FileFrameSource::new(path, *looping)?), Vec::new())
        }
    };
    let tuner: Box<dyn Tuner> = Box::new(SimulatedTuner::new(frequency, holes));

    let mut accumulator = SweepAccumulator::new(config, tuner)?;
    let tuned = accumulator.tune_start()?;
    info!("Sweep starting at {} Hz", tuned);

    let detectors = DetectorBank::from_profiles(&config.profiles, config.candidate_step.as_hz());

    let (source_block, prev) = FrameSourceBlock::new(source, config.fft_size);
    let fault = FaultSlot::default();
    let processor = SweepProcessor::new(accumulator, detectors, event_tx, fault.clone());
    let scanner_sink = ScannerSink::new(prev, processor);

    let mut graph = Graph::new();

    // Add blocks to graph
    graph.add(Box::new(source_block));
    graph.add(Box::new(scanner_sink));

    Ok(SweepGraph {
        graph,
        tuned_hz: tuned,
        fault,
    })
}
