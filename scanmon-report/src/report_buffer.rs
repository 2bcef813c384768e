use log::debug;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use scanmon_messages::AveragedSpectrum;

use crate::error::ReportError;

/// Size of the report region in bytes.
pub const REGION_SIZE: usize = 1_000_000;

const COUNTER_OFFSET: usize = 0;
const LENGTH_OFFSET: usize = 16;
const DATA_OFFSET: usize = 20;
const PAIR_SIZE: usize = 8;

/// Most `(frequency, power)` pairs the region can hold.
pub const CAPACITY: usize = (REGION_SIZE - DATA_OFFSET) / PAIR_SIZE;

/// Byte-addressable view of a report region, in memory or mirrored to a file.
pub trait ReportRegion {
    /// Fill `buf` with the bytes starting at `offset`.
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<(), ReportError>;
}

/// One consistent read of a report region.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSnapshot {
    pub counter: i32,
    /// `(frequency_hz, power_db)` in ascending frequency.
    pub pairs: Vec<(f32, f32)>,
}

fn read_i32<R: ReportRegion + ?Sized>(region: &R, offset: usize) -> Result<i32, ReportError> {
    let mut bytes = [0u8; 4];
    region.read_at(offset, &mut bytes)?;
    Ok(i32::from_ne_bytes(bytes))
}

/// Read counter, data, then the counter again; a moved counter is a torn read.
pub fn snapshot<R: ReportRegion + ?Sized>(region: &R) -> Result<ReportSnapshot, ReportError> {
    let before = read_i32(region, COUNTER_OFFSET)?;

    let length = read_i32(region, LENGTH_OFFSET)?;
    let length = usize::try_from(length)
        .ok()
        .filter(|&n| n <= CAPACITY)
        .ok_or_else(|| ReportError::Corrupt(format!("vector length {}", length)))?;
    let mut data = vec![0u8; length * PAIR_SIZE];
    region.read_at(DATA_OFFSET, &mut data)?;

    let after = read_i32(region, COUNTER_OFFSET)?;
    if before != after {
        return Err(ReportError::TornRead { before, after });
    }

    let pairs = data
        .chunks_exact(PAIR_SIZE)
        .map(|pair| {
            let frequency = f32::from_ne_bytes([pair[0], pair[1], pair[2], pair[3]]);
            let power = f32::from_ne_bytes([pair[4], pair[5], pair[6], pair[7]]);
            (frequency, power)
        })
        .collect();
    Ok(ReportSnapshot {
        counter: after,
        pairs,
    })
}

/// `None` while the counter still equals `last_counter`.
pub fn poll<R: ReportRegion + ?Sized>(
    region: &R,
    last_counter: i32,
) -> Result<Option<ReportSnapshot>, ReportError> {
    if read_i32(region, COUNTER_OFFSET)? == last_counter {
        return Ok(None);
    }
    snapshot(region).map(Some)
}

/// Fixed-layout region holding the most recent averaged spectrum.
///
/// ```text
/// offset 0   i32  update counter, bumped once per publish (wrapping)
/// offset 16  i32  N
/// offset 20  N × (f32 frequency_hz, f32 power_db), ascending frequency
/// ```
///
/// All values are native-endian. With a mirror path set, the whole region is rewritten
/// to that file after every publish so other processes can read it.
pub struct ReportBuffer {
    region: Vec<u8>,
    mirror: Option<PathBuf>,
}

impl ReportBuffer {
    pub fn new() -> Self {
        Self {
            region: vec![0; REGION_SIZE],
            mirror: None,
        }
    }

    pub fn with_mirror<P: Into<PathBuf>>(path: P) -> Self {
        let mirror = path.into();
        debug!("Mirroring report region to {}", mirror.display());
        Self {
            region: vec![0; REGION_SIZE],
            mirror: Some(mirror),
        }
    }

    pub fn mirror(&self) -> Option<&Path> {
        self.mirror.as_deref()
    }

    pub fn counter(&self) -> i32 {
        self.i32_at(COUNTER_OFFSET)
    }

    pub fn vector_length(&self) -> usize {
        usize::try_from(self.i32_at(LENGTH_OFFSET)).unwrap_or(0)
    }

    /// The `index`-th published `(frequency_hz, power_db)` pair.
    pub fn pair(&self, index: usize) -> Option<(f32, f32)> {
        if index >= self.vector_length() {
            return None;
        }
        let offset = DATA_OFFSET + index * PAIR_SIZE;
        Some((self.f32_at(offset), self.f32_at(offset + 4)))
    }

    /// Write `spectrum` and bump the counter. Returns the new counter value.
    ///
    /// The counter is bumped last, after all pairs are in place. A failed mirror write
    /// leaves the in-memory region published.
    pub fn publish(&mut self, spectrum: &AveragedSpectrum) -> Result<i32, ReportError> {
        let bins = spectrum.len();
        if bins > CAPACITY {
            return Err(ReportError::TooLarge {
                bins,
                capacity: CAPACITY,
            });
        }

        self.put(LENGTH_OFFSET, &(bins as i32).to_ne_bytes());
        for (index, bin) in spectrum.bins().enumerate() {
            let offset = DATA_OFFSET + index * PAIR_SIZE;
            self.put(offset, &(bin.frequency_hz as f32).to_ne_bytes());
            self.put(offset + 4, &bin.power_db.to_ne_bytes());
        }
        let counter = self.counter().wrapping_add(1);
        self.put(COUNTER_OFFSET, &counter.to_ne_bytes());

        if let Some(path) = &self.mirror {
            fs::write(path, &self.region)?;
        }
        Ok(counter)
    }

    pub fn snapshot(&self) -> Result<ReportSnapshot, ReportError> {
        snapshot(self)
    }

    pub fn poll(&self, last_counter: i32) -> Result<Option<ReportSnapshot>, ReportError> {
        poll(self, last_counter)
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        self.region[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn i32_at(&self, offset: usize) -> i32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.region[offset..offset + 4]);
        i32::from_ne_bytes(bytes)
    }

    fn f32_at(&self, offset: usize) -> f32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.region[offset..offset + 4]);
        f32::from_ne_bytes(bytes)
    }
}

impl Default for ReportBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRegion for ReportBuffer {
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<(), ReportError> {
        let end = offset + buf.len();
        let bytes = self.region.get(offset..end).ok_or_else(|| {
            ReportError::Corrupt(format!("read of {}..{} past region end", offset, end))
        })?;
        buf.copy_from_slice(bytes);
        Ok(())
    }
}

/// A report region mirrored by another process, read straight from its file.
#[derive(Debug, Clone)]
pub struct ReportFile {
    path: PathBuf,
}

impl ReportFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl ReportRegion for ReportFile {
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<(), ReportError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }
}
