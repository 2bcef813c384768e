use log::debug;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use super::FrameSource;

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// Replays recorded spectrum frames: consecutive little-endian f32 power values, one frame
/// after another, each frame in FFT-bin order.
#[derive(Debug)]
pub struct FileFrameSource {
    file: File,
    loop_on_eof: bool,
    scratch: Vec<u8>,
}

impl FileFrameSource {
    /// Open a recording. If `loop_on_eof` is true, playback restarts from the beginning at EOF.
    pub fn new<P: AsRef<Path>>(path: P, loop_on_eof: bool) -> io::Result<Self> {
        debug!("Opening frame recording {}", path.as_ref().display());
        let file = File::open(path)?;
        Ok(Self {
            file,
            loop_on_eof,
            scratch: Vec::new(),
        })
    }
}

impl FrameSource for FileFrameSource {
    fn read_frame(&mut self, frame: &mut [f32]) -> io::Result<bool> {
        let bytes_needed = frame.len() * SAMPLE_BYTES;
        self.scratch.resize(bytes_needed, 0);

        let mut total_read = 0;
        while total_read < bytes_needed {
            match self.file.read(&mut self.scratch[total_read..]) {
                Ok(0) if total_read == 0 && self.loop_on_eof => {
                    // Restart from beginning
                    self.file.seek(SeekFrom::Start(0))?;
                    // An empty file would spin here forever
                    if self.file.metadata()?.len() == 0 {
                        return Ok(false);
                    }
                }
                Ok(0) if total_read == 0 => return Ok(false),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("truncated frame: {} of {} bytes", total_read, bytes_needed),
                    ));
                }
                Ok(n) => total_read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        for (sample, bytes) in frame.iter_mut().zip(self.scratch.chunks_exact(SAMPLE_BYTES)) {
            *sample = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temp file with power samples
    fn create_frame_file(samples: &[f32]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        for &val in samples {
            temp_file.write_all(&val.to_le_bytes()).unwrap();
        }
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_file_frame_source_reads_frames() {
        let temp_file = create_frame_file(&[-90.0, -80.0, -20.5, -85.0, -70.0, -60.0, -50.0, -40.0]);

        let mut source = FileFrameSource::new(temp_file.path(), false).unwrap();
        let mut frame = vec![0.0; 4];

        assert!(source.read_frame(&mut frame).unwrap());
        assert_eq!(frame, vec![-90.0, -80.0, -20.5, -85.0]);
        assert!(source.read_frame(&mut frame).unwrap());
        assert_eq!(frame, vec![-70.0, -60.0, -50.0, -40.0]);
    }

    #[test]
    fn test_file_frame_source_eof_no_loop() {
        let temp_file = create_frame_file(&[1.0, 2.0]);

        let mut source = FileFrameSource::new(temp_file.path(), false).unwrap();
        let mut frame = vec![0.0; 2];

        assert!(source.read_frame(&mut frame).unwrap());
        // Second read hits EOF and leaves the frame alone
        assert!(!source.read_frame(&mut frame).unwrap());
        assert_eq!(frame, vec![1.0, 2.0]);
    }

    #[test]
    fn test_file_frame_source_eof_with_loop() {
        let temp_file = create_frame_file(&[1.0, 2.0]);

        let mut source = FileFrameSource::new(temp_file.path(), true).unwrap();
        let mut frame = vec![0.0; 2];

        assert!(source.read_frame(&mut frame).unwrap());
        frame.fill(0.0);
        assert!(source.read_frame(&mut frame).unwrap());
        assert_eq!(frame, vec![1.0, 2.0]);
    }

    #[test]
    fn test_file_frame_source_empty_loop_ends() {
        let temp_file = create_frame_file(&[]);
        let mut source = FileFrameSource::new(temp_file.path(), true).unwrap();
        assert!(!source.read_frame(&mut [0.0; 2]).unwrap());
    }

    #[test]
    fn test_file_frame_source_file_not_found() {
        let result = FileFrameSource::new("/nonexistent/path/to/frames.f32", false);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_file_frame_source_truncated_frame() {
        // Three samples, frames of two
        let temp_file = create_frame_file(&[1.0, 2.0, 3.0]);

        let mut source = FileFrameSource::new(temp_file.path(), false).unwrap();
        let mut frame = vec![0.0; 2];

        assert!(source.read_frame(&mut frame).unwrap());
        let err = source.read_frame(&mut frame).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
