use std::thread;
use std::time::Duration;

use scanmon_messages::{
    AveragedSpectrum, DetectionResult, Event, Hertz, ScanConfig, ScanState, SignalReport,
    SweepReport,
};
use scanmon_report::{PersistenceStats, ReportBuffer, Reporter, SweepLog};
use tempfile::tempdir;

fn snapshot_event() -> Event {
    let config = ScanConfig::default();
    Event::StateSnapshot(ScanState {
        center_frequency: config.start,
        sample_rate: config.sample_rate,
        fft_size: 8,
        avg_size: config.avg_size,
        config,
    })
}

fn sweep_event(sequence: u64, center_hz: f64) -> Event {
    let mut powers = vec![-90.0f32; 8];
    powers[4] = -30.0;
    Event::Sweep(SweepReport {
        sequence,
        elapsed: Duration::from_secs(sequence),
        spectrum: AveragedSpectrum::new(center_hz, 2e6, powers),
        signals: vec![SignalReport {
            detector: "test".to_string(),
            candidate_hz: center_hz,
            result: DetectionResult {
                score: -4.0,
                power_db: -30.0,
                bandwidth_hz: 250e3,
                centroid_hz: Some(center_hz),
            },
        }],
        overloaded_frames: 0,
    })
}

#[test]
fn test_reporter_persists_until_channel_closes() {
    let dir = tempdir().unwrap();
    let log = SweepLog::new(dir.path().join("logs")).unwrap();
    let reporter = Reporter::new(ReportBuffer::with_mirror(dir.path().join("report.bin")), Some(log));
    assert_eq!(reporter.buffer().mirror(), Some(dir.path().join("report.bin").as_path()));
    let (event_tx, event_rx) = flume::bounded::<Event>(4);

    let producer = thread::spawn(move || {
        event_tx.send(snapshot_event()).unwrap();
        event_tx.send(sweep_event(1, 88e6)).unwrap();
        // Less than 1 MHz away: published but not logged
        event_tx.send(sweep_event(2, 88.5e6)).unwrap();
        event_tx.send(sweep_event(3, 90e6)).unwrap();
    });

    let stats = reporter.run(event_rx).unwrap();
    producer.join().unwrap();

    assert_eq!(
        stats,
        PersistenceStats {
            published: 3,
            buffer_failures: 0,
            log_files: 2,
            log_failures: 0,
            missed_steps: 0,
        }
    );
    assert_eq!(std::fs::read_dir(dir.path().join("logs")).unwrap().count(), 2);

    let mirrored = scanmon_report::snapshot(&scanmon_report::ReportFile::new(
        dir.path().join("report.bin"),
    ))
    .unwrap();
    assert_eq!(mirrored.counter, 3);
    assert_eq!(mirrored.pairs.len(), 8);
    assert_eq!(mirrored.pairs[4], (90e6, -30.0));
}

#[test]
fn test_reporter_counts_missed_steps() {
    let mut reporter = Reporter::new(ReportBuffer::new(), None);

    reporter.handle_event(snapshot_event()).unwrap();
    reporter.handle_event(sweep_event(1, 88e6)).unwrap();
    reporter.handle_event(sweep_event(4, 92.8e6)).unwrap();

    assert_eq!(reporter.stats().missed_steps, 2);
    assert_eq!(reporter.stats().published, 2);
    assert_eq!(reporter.buffer().counter(), 2);

    // A restarted sweep numbers from 1 again
    reporter.handle_event(snapshot_event()).unwrap();
    reporter.handle_event(sweep_event(1, 88e6)).unwrap();
    assert_eq!(reporter.stats().missed_steps, 2);
}

#[test]
fn test_reporter_survives_log_failures() {
    let dir = tempdir().unwrap();
    let log = SweepLog::new(dir.path().join("logs")).unwrap();
    std::fs::remove_dir(dir.path().join("logs")).unwrap();
    let mut reporter = Reporter::new(ReportBuffer::new(), Some(log));

    reporter.handle_event(sweep_event(1, 88e6)).unwrap();
    reporter.handle_event(sweep_event(2, 90e6)).unwrap();

    let stats = reporter.stats();
    assert_eq!(stats.log_failures, 2);
    assert_eq!(stats.log_files, 0);
    assert_eq!(stats.published, 2);
}

#[test]
fn test_reporter_stops_on_fault() {
    let reporter = Reporter::new(ReportBuffer::new(), None);
    let (event_tx, event_rx) = flume::unbounded::<Event>();
    event_tx.send(snapshot_event()).unwrap();
    event_tx
        .send(Event::Fault("Tuner unreachable".to_string()))
        .unwrap();
    // Never reached
    event_tx.send(sweep_event(1, Hertz::mhz(88.0).as_hz())).unwrap();

    let err = reporter.run(event_rx).unwrap_err();

    assert!(err.to_string().contains("Tuner unreachable"));
}

#[test]
fn test_reporter_tracks_announced_sweep() {
    let mut reporter = Reporter::new(ReportBuffer::new(), None);
    assert!(reporter.scan_state().is_none());
    assert!(reporter.buffer().mirror().is_none());

    reporter.handle_event(snapshot_event()).unwrap();

    let state = reporter.scan_state().expect("snapshot seen");
    assert_eq!(state.config.start, Hertz::mhz(88.0));
    assert_eq!(state.config.end, Hertz::mhz(108.0));
    assert_eq!(state.fft_size, 8);
}
