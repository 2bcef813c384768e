mod scanner;

pub use scanner::{FaultSlot, ScannerSink, SweepProcessor};
