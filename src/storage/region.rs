//! Fixed-size byte regions backing the offline buffer.
//!
//! A region is a flat array of `capacity` bytes, zero where unused. The
//! event log keeps its own copy of the used prefix and writes through to
//! the region, so a region only has to support whole-region reads at open.

use crate::errors::AppResult;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub trait Region {
    fn capacity(&self) -> usize;

    /// Read the full region (exactly `capacity` bytes).
    fn load(&mut self) -> AppResult<Vec<u8>>;

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> AppResult<()>;

    /// Zero the whole region.
    fn zero(&mut self) -> AppResult<()>;

    fn flush(&mut self) -> AppResult<()>;
}

/// Volatile region, used by tests and dry runs.
#[derive(Debug, Clone)]
pub struct MemRegion {
    bytes: Vec<u8>,
}

impl MemRegion {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
        }
    }

    /// Rebuild a region from raw bytes, e.g. to simulate a power cycle.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Region for MemRegion {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn load(&mut self) -> AppResult<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> AppResult<()> {
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn zero(&mut self) -> AppResult<()> {
        self.bytes.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> AppResult<()> {
        Ok(())
    }
}

/// Region stored in a pre-sized file; survives restarts.
#[derive(Debug)]
pub struct FileRegion {
    path: PathBuf,
    file: File,
    capacity: usize,
}

impl FileRegion {
    /// Open (or create) the file and size it to `capacity` zero bytes.
    /// A file already larger than `capacity` keeps its size so no buffered
    /// record is cut off.
    pub fn open(path: &Path, capacity: usize) -> AppResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let current = file.metadata()?.len() as usize;
        let capacity = if current > capacity {
            log::warn!(
                "[REGION] {} holds {} bytes, more than the configured {}; keeping file size",
                path.display(),
                current,
                capacity
            );
            current
        } else {
            file.set_len(capacity as u64)?;
            capacity
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            capacity,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Region for FileRegion {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn load(&mut self) -> AppResult<Vec<u8>> {
        let mut buf = vec![0; self.capacity];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> AppResult<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    fn zero(&mut self) -> AppResult<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&vec![0; self.capacity])?;
        Ok(())
    }

    fn flush(&mut self) -> AppResult<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}
