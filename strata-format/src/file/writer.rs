use std::fs::{File, OpenOptions};
use std::io::{self, prelude::*, BufWriter, SeekFrom};
use std::path::{Path, PathBuf};

use super::{read_index, reader::EntryReader, Snapshot};
use crate::{
    footer::{BlockFooter, FOOTER_SIZE},
    ser::{IndexBlock, Serialize},
    Header, Index, IndexEntry, Result,
};

#[derive(Debug)]
struct PendingEntry {
    header: Header,
    start: u64,
    size: u64,
    hasher: crc32fast::Hasher,
}

/// Appends entries to an archive. Entries are written as a stream: a header
/// starts an entry, writes extend it, and the next header (or a flush) seals it.
/// Sealed entries become part of the archive's index once the writer is closed.
#[derive(Debug)]
pub struct ArchiveReadWriter {
    file: BufWriter<File>,
    path: PathBuf,
    persisted: Index,
    snapshots: Vec<Snapshot>,
    pending: Vec<IndexEntry>,
    current: Option<PendingEntry>,
    block_start: u64,
    position: u64,
    finished: bool,
}

impl Drop for ArchiveReadWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finish_inner() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to finish archive on drop");
        }
    }
}

impl ArchiveReadWriter {
    /// Opens an archive for appending, creating an empty one if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ArchiveReadWriter> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;

        let (persisted, snapshots) = read_index(&mut file, 0)?;
        let position = file.seek(SeekFrom::End(0))?;

        tracing::debug!(
            path = %path.as_ref().display(),
            position = format_args!("{:#x}", position),
            entries = persisted.len(),
            "opened archive for writing"
        );

        Ok(ArchiveReadWriter {
            file: BufWriter::new(file),
            path: path.as_ref().to_path_buf(),
            persisted,
            snapshots,
            pending: vec![],
            current: None,
            block_start: position,
            position,
            finished: false,
        })
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Everything already in the archive followed by the sealed entries of this session.
    pub fn index(&self) -> Index {
        let mut index = self.persisted.clone();
        index.extend(self.pending.iter().cloned());
        index
    }

    /// Borrowing form of [`ArchiveReadWriter::index`].
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &IndexEntry> {
        self.persisted.iter().chain(self.pending.iter())
    }

    #[inline(always)]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Streams a sealed entry. The entry's bytes must have been flushed.
    pub fn get(&self, entry: &IndexEntry) -> io::Result<EntryReader> {
        EntryReader::new(&self.path, entry)
    }

    /// Seals the entry in progress, if any, and starts a new one at the current position.
    pub fn write_header(&mut self, header: Header) -> io::Result<()> {
        self.seal_current();

        tracing::trace!(name = %header.name, start = self.position, "begin entry");

        self.current = Some(PendingEntry {
            header,
            start: self.position,
            size: 0,
            hasher: crc32fast::Hasher::new(),
        });

        Ok(())
    }

    #[inline(always)]
    fn seal_current(&mut self) {
        if let Some(current) = self.current.take() {
            tracing::trace!(
                name = %current.header.name,
                start = current.start,
                size = current.size,
                "sealed entry"
            );

            self.pending.push(IndexEntry {
                header: current.header,
                start: current.start,
                size: current.size,
                crc32: current.hasher.finalize(),
            });
        }
    }

    /// Writes the index and footer for the sealed entries of this block, if any,
    /// and starts the next block after it.
    fn write_block(&mut self) -> io::Result<u64> {
        if self.pending.is_empty() {
            self.file.flush()?;
            return Ok(self.snapshots.last().map(|s| s.offset).unwrap_or(0));
        }

        let mut index = vec![];
        IndexBlock {
            entries: &self.pending,
            block_start: self.block_start,
        }
        .write(&mut index)?;

        let index_length = index.len() as u64;
        let block_length = self.position - self.block_start + index_length + FOOTER_SIZE;
        let footer = BlockFooter::new(
            self.pending.len() as u32,
            crc32fast::hash(&index),
            index_length,
            block_length,
        );

        self.file.write_all(&index)?;
        footer.write(&mut self.file)?;
        self.file.flush()?;
        self.file.get_ref().sync_data()?;

        self.position += index_length + FOOTER_SIZE;

        tracing::debug!(
            block_start = format_args!("{:#x}", self.block_start),
            end = format_args!("{:#x}", self.position),
            entries = self.pending.len(),
            "wrote index block"
        );

        self.snapshots.push(Snapshot {
            offset: self.position,
            block_start: self.block_start,
            entry_count: self.pending.len() as u32,
        });
        self.persisted.extend(self.pending.drain(..));
        self.block_start = self.position;

        Ok(self.position)
    }

    /// Seals the entry in progress and makes every sealed entry durable by
    /// appending an index block. The writer stays usable. Returns the offset of
    /// the latest snapshot.
    pub fn commit(&mut self) -> io::Result<u64> {
        self.seal_current();
        self.write_block()
    }

    fn finish_inner(&mut self) -> io::Result<u64> {
        if self.finished {
            return Ok(self.position);
        }
        self.finished = true;

        self.seal_current();
        self.write_block()
    }

    /// Seals any pending entry, appends the index block and syncs the file.
    /// Returns the offset of the latest snapshot.
    pub fn close(mut self) -> io::Result<u64> {
        self.finish_inner()
    }
}

impl Write for ArchiveReadWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let current = match self.current.as_mut() {
            Some(current) => current,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "no entry in progress; write a header first",
                ))
            }
        };

        self.file.write_all(buf)?;
        current.hasher.update(buf);
        current.size += buf.len() as u64;
        self.position += buf.len() as u64;

        Ok(buf.len())
    }

    /// Seals the entry in progress and pushes buffered bytes to the OS so other
    /// handles on the same file can read them.
    fn flush(&mut self) -> io::Result<()> {
        self.seal_current();
        self.file.flush()
    }
}
