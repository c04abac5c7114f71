use std::fs::{File, OpenOptions};
use std::io::{self, prelude::*, SeekFrom};
use std::path::{Path, PathBuf};

use memmap2::MmapOptions;

use super::{read_index, read_snapshots, Snapshot};
use crate::{Error, Index, IndexEntry, Result};

#[derive(Debug)]
pub struct ArchiveReader {
    pub(crate) file: File,
    pub(crate) path: PathBuf,
    pub(crate) offset: u64,
    pub(crate) index: Index,
    pub(crate) snapshots: Vec<Snapshot>,
}

impl ArchiveReader {
    /// Opens an existing archive at its latest snapshot.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ArchiveReader> {
        Self::open_at(path, 0)
    }

    /// Opens an existing archive as it was when the block ending at `offset` was
    /// written. An offset of 0 selects the latest block.
    pub fn open_at<P: AsRef<Path>>(path: P, offset: u64) -> Result<ArchiveReader> {
        let mut file = OpenOptions::new().read(true).open(path.as_ref())?;
        let (index, snapshots) = read_index(&mut file, offset)?;

        tracing::debug!(
            path = %path.as_ref().display(),
            offset,
            entries = index.len(),
            "opened archive for reading"
        );

        Ok(ArchiveReader {
            file,
            path: path.as_ref().to_path_buf(),
            offset,
            index,
            snapshots,
        })
    }

    /// Lists every snapshot in the archive without reading any index.
    pub fn list_snapshots<P: AsRef<Path>>(path: P) -> Result<Vec<Snapshot>> {
        let mut file = OpenOptions::new().read(true).open(path.as_ref())?;
        read_snapshots(&mut file)
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline(always)]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline(always)]
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Snapshots visible from this reader's offset, oldest first.
    #[inline(always)]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn get(&self, entry: &IndexEntry) -> io::Result<EntryReader> {
        EntryReader::new(&self.path, entry)
    }

    /// # Safety
    ///
    /// The mapping is only valid while no other process truncates the archive.
    pub unsafe fn memory_map(&self, entry: &IndexEntry) -> io::Result<memmap2::Mmap> {
        MmapOptions::new()
            .offset(entry.start)
            .len(entry.size as usize)
            .map(&self.file)
    }

    /// Checks the stored crc32 of an entry against its bytes.
    pub fn verify(&self, entry: &IndexEntry) -> Result<()> {
        // Zero-length maps are rejected by the OS.
        let actual = if entry.size == 0 {
            crc32fast::hash(&[])
        } else {
            let mmap = unsafe { self.memory_map(entry)? };
            crc32fast::hash(&mmap)
        };

        if actual != entry.crc32 {
            return Err(Error::ChecksumMismatch {
                offset: entry.start,
                expected: entry.crc32,
                actual,
            });
        }

        Ok(())
    }
}

/// A bounded view over one entry's bytes, backed by its own file handle.
#[derive(Debug)]
pub struct EntryReader {
    file: File,
    start: u64,
    len: u64,
    pos: u64,
}

impl EntryReader {
    pub(crate) fn new(path: &Path, entry: &IndexEntry) -> io::Result<EntryReader> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(EntryReader {
            file,
            start: entry.start,
            len: entry.size,
            pos: 0,
        })
    }

    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Reads at `offset` within the entry without moving the stream position.
    pub fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.len || buf.is_empty() {
            return Ok(0);
        }

        let n = std::cmp::min(buf.len() as u64, self.len - offset) as usize;
        self.file.seek(SeekFrom::Start(self.start + offset))?;
        self.file.read(&mut buf[..n])
    }
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.read_at(buf, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for EntryReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(n) => {
                self.pos = n;
                return Ok(n);
            }
            SeekFrom::Current(n) => (self.pos, n),
            SeekFrom::End(n) => (self.len, n),
        };

        let next = if delta >= 0 {
            base.checked_add(delta as u64)
        } else {
            base.checked_sub(delta.unsigned_abs())
        };

        match next {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
