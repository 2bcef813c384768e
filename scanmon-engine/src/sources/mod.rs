mod block;
mod file;
mod simulated;

pub use block::FrameSourceBlock;
pub use file::FileFrameSource;
pub use simulated::SimulatedReceiver;

use std::io;

/// Abstraction for spectrum frame producers (receiver analyzer, recordings, simulation).
pub trait FrameSource: Send {
    /// Fill `frame` with the next power spectrum in FFT-bin order.
    /// Returns `false` once the source is exhausted.
    fn read_frame(&mut self, frame: &mut [f32]) -> io::Result<bool>;
}
