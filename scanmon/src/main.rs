use scanmon_engine::Engine;
use scanmon_messages::{Command, Decibels, DetectorProfile, Hertz, ScanConfig, SourceConfig};
use scanmon_report::{ReportBuffer, Reporter, SweepLog};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, error, info};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "scanmon")]
#[command(about = "Sweep a tuner across a frequency range and report the signals found")]
struct Args {
    /// Sweep start in MHz
    #[arg(long, default_value_t = 88.0)]
    start: f64,

    /// Sweep end in MHz
    #[arg(long, default_value_t = 108.0)]
    end: f64,

    /// Tuning step in MHz
    #[arg(long, default_value_t = 1.6)]
    step: f64,

    /// Receiver sample rate in MHz
    #[arg(long, default_value_t = 2.0)]
    sample_rate: f64,

    /// Bins per spectrum frame
    #[arg(long, default_value_t = 1024)]
    fft_size: usize,

    /// Frames averaged per tuning step
    #[arg(long, default_value_t = 8)]
    avg: u32,

    /// Subtracted from every sample before averaging, in dB
    #[arg(long, allow_hyphen_values = true)]
    gain_compensation: Option<f32>,

    /// Flag frames whose peak exceeds this level, in dB
    #[arg(long, allow_hyphen_values = true)]
    overload_threshold: Option<f32>,

    /// JSON array of detector profiles (built-in profiles otherwise)
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Recorded spectrum frames (raw little-endian f32) instead of the simulated receiver
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Restart the recording at end of file
    #[arg(long, requires = "input")]
    loop_input: bool,

    /// Directory for the per-MHz spectrum logs
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Mirror the report region to this file
    #[arg(long)]
    shm_path: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn scan_config(&self) -> Result<ScanConfig> {
        let profiles = match &self.profiles {
            Some(path) => load_profiles(path)?,
            None => DetectorProfile::defaults(),
        };
        let source = match &self.input {
            Some(path) => SourceConfig::File {
                path: path.clone(),
                looping: self.loop_input,
            },
            None => SourceConfig::default(),
        };
        let config = ScanConfig {
            start: Hertz::mhz(self.start),
            end: Hertz::mhz(self.end),
            step: Hertz::mhz(self.step),
            sample_rate: Hertz::mhz(self.sample_rate),
            fft_size: self.fft_size,
            avg_size: self.avg,
            gain_compensation_db: self.gain_compensation.map(Decibels),
            overload_threshold_db: self.overload_threshold.map(Decibels),
            source,
            profiles,
            ..ScanConfig::default()
        };
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid scan configuration: {}", e))?;
        Ok(config)
    }

    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn load_profiles(path: &Path) -> Result<Vec<DetectorProfile>> {
    let file = File::open(path)
        .with_context(|| format!("opening detector profiles {}", path.display()))?;
    let profiles: Vec<DetectorProfile> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing detector profiles {}", path.display()))?;
    if profiles.is_empty() {
        anyhow::bail!("{} defines no detector profiles", path.display());
    }
    Ok(profiles)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = args.level();

    env_logger::builder()
        .format(|buf, record| {
            writeln!(
                buf,
                "{:<5} - {} | {}",
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .filter_level(LevelFilter::Warn)
        .filter_module("scanmon", level)
        .filter_module("scanmon_engine", level)
        .filter_module("scanmon_report", level)
        .filter_module("rustradio", LevelFilter::Warn)
        .init();

    let config = args.scan_config()?;
    let buffer = match &args.shm_path {
        Some(path) => ReportBuffer::with_mirror(path),
        None => ReportBuffer::new(),
    };
    if let Some(path) = buffer.mirror() {
        info!("Publishing spectra to {}", path.display());
    }
    let log = SweepLog::new(&args.log_dir)
        .with_context(|| format!("creating log directory {}", args.log_dir.display()))?;
    info!(
        "Scanning {} .. {} with {} detector profile(s)",
        config.start,
        config.end,
        config.profiles.len()
    );

    // Create flume channels for bidirectional communication
    let (cmd_tx, cmd_rx) = flume::unbounded();
    let (event_tx, event_rx) = flume::bounded(16);

    // Spawn engine thread
    let engine_handle = std::thread::spawn(move || {
        let engine = Engine::new(cmd_rx, event_tx, config);
        if let Err(e) = engine.run() {
            error!("Engine failed: {:#}", e);
        }
    });

    // Run the reporter on the main thread (blocking)
    let result = Reporter::new(buffer, Some(log)).run(event_rx);

    // Reporter has exited - send stop command to engine
    let _ = cmd_tx.send(Command::Stop);

    // Wait for engine thread to finish
    engine_handle
        .join()
        .map_err(|_| anyhow::anyhow!("Engine thread panicked"))?;

    let stats = result?;
    info!("Done: {:?}", stats);
    Ok(())
}
