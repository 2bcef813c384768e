use crate::ScanConfig;

/// Commands sent from the front end to the engine.
#[derive(Debug)]
pub enum Command {
    /// Stop the engine and terminate the DSP graph.
    Stop,
    /// Replace the scan configuration. Engine will stop current graph, rebuild, and restart
    /// the sweep from the new start frequency.
    ChangeScan(ScanConfig),
}
