use log::error;
use rustradio::block::{Block, BlockRet};
use rustradio::stream::WriteStream;
use rustradio::{Error, rustradio_macros};

use super::FrameSource;

/// A source block that pulls whole spectrum frames from a [`FrameSource`] into the graph.
#[derive(rustradio_macros::Block)]
#[rustradio(new)]
pub struct FrameSourceBlock {
    #[rustradio(out)]
    dst: WriteStream<f32>,
    source: Box<dyn FrameSource>,
    fft_size: usize,
}

impl Block for FrameSourceBlock {
    fn work(&mut self) -> Result<BlockRet<'_>, Error> {
        let mut output = self.dst.write_buf()?;

        // Only ever write complete frames
        if output.len() < self.fft_size {
            return Ok(BlockRet::Pending);
        }

        let frame = &mut output.slice()[..self.fft_size];
        match self.source.read_frame(frame) {
            Ok(true) => {}
            Ok(false) => return Ok(BlockRet::EOF),
            Err(e) => {
                error!("Frame source failed: {}", e);
                return Err(e.into());
            }
        }
        output.produce(self.fft_size, &[]);

        Ok(BlockRet::Again)
    }
}
