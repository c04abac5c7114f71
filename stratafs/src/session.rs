use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use strata_format::{ArchiveReadWriter, ArchiveReader, EntryReader, Header, IndexEntry, Snapshot};

use crate::{FsError, FsOptions, FsResult};

fn surface(err: strata_format::Error) -> FsError {
    match err {
        strata_format::Error::Io(e) => FsError::Io(e),
        e => FsError::Archive(e),
    }
}

/// Archive entries in physical order.
pub(crate) type Entries<'a> = dyn DoubleEndedIterator<Item = &'a IndexEntry> + 'a;

enum Backend {
    Reader(ArchiveReader),
    ReadWriter(ArchiveReadWriter),
}

/// The lazily opened archive behind a filesystem, plus the single write slot.
pub(crate) struct Session {
    path: PathBuf,
    read_only: bool,
    offset: u64,
    backend: Option<Backend>,
    /// Bumped on every open, so handles from an earlier session can tell.
    generation: u64,
    write_open: bool,
}

impl Session {
    pub(crate) fn new(path: PathBuf, options: &FsOptions) -> Session {
        Session {
            path,
            read_only: options.read_only,
            offset: options.snapshot_offset,
            backend: None,
            generation: 0,
            write_open: false,
        }
    }

    #[inline(always)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    #[inline(always)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn ensure_open(&mut self) -> FsResult<()> {
        if self.backend.is_some() {
            return Ok(());
        }

        let backend = if self.read_only {
            Backend::Reader(ArchiveReader::open_at(&self.path, self.offset).map_err(surface)?)
        } else {
            Backend::ReadWriter(ArchiveReadWriter::open(&self.path).map_err(surface)?)
        };

        self.backend = Some(backend);
        self.generation += 1;

        tracing::trace!(
            path = %self.path.display(),
            read_only = self.read_only,
            generation = self.generation,
            "session opened"
        );

        Ok(())
    }

    /// Seals any pending entry, writes the index block and releases the archive.
    /// Does nothing on a closed session.
    pub(crate) fn ensure_closed(&mut self) -> FsResult<()> {
        self.write_open = false;

        match self.backend.take() {
            Some(Backend::ReadWriter(writer)) => {
                let offset = writer.close()?;
                tracing::trace!(path = %self.path.display(), offset, "session closed");
            }
            Some(Backend::Reader(_)) => {
                tracing::trace!(path = %self.path.display(), "session closed");
            }
            None => {}
        }

        Ok(())
    }

    /// Runs `f` over the full entry list, tombstones and superseded entries included.
    pub(crate) fn with_index<T, F>(&mut self, f: F) -> FsResult<T>
    where
        F: for<'a> FnOnce(&mut Entries<'a>) -> T,
    {
        self.ensure_open()?;

        match self.backend.as_ref() {
            Some(Backend::Reader(reader)) => Ok(f(&mut reader.index().iter() as &mut Entries<'_>)),
            Some(Backend::ReadWriter(writer)) => Ok(f(&mut writer.entries() as &mut Entries<'_>)),
            None => Err(FsError::AlreadyClosed),
        }
    }

    pub(crate) fn snapshots(&mut self) -> FsResult<Vec<Snapshot>> {
        self.ensure_open()?;

        match self.backend.as_ref() {
            Some(Backend::Reader(reader)) => Ok(reader.snapshots().to_vec()),
            Some(Backend::ReadWriter(writer)) => Ok(writer.snapshots().to_vec()),
            None => Err(FsError::AlreadyClosed),
        }
    }

    pub(crate) fn get(&mut self, entry: &IndexEntry) -> FsResult<EntryReader> {
        self.ensure_open()?;

        let reader = match self.backend.as_ref() {
            Some(Backend::Reader(reader)) => reader.get(entry)?,
            Some(Backend::ReadWriter(writer)) => writer.get(entry)?,
            None => return Err(FsError::AlreadyClosed),
        };

        Ok(reader)
    }

    fn writer(&mut self) -> FsResult<&mut ArchiveReadWriter> {
        self.ensure_open()?;

        match self.backend.as_mut() {
            Some(Backend::ReadWriter(writer)) => Ok(writer),
            Some(Backend::Reader(_)) => Err(FsError::ReadOnlyFilesystem),
            None => Err(FsError::AlreadyClosed),
        }
    }

    /// Claims the write slot and starts a new entry. Returns the generation the
    /// resulting handle belongs to.
    pub(crate) fn begin_write(&mut self, header: Header) -> FsResult<u64> {
        if self.read_only {
            return Err(FsError::ReadOnlyFilesystem);
        }

        if self.write_open {
            return Err(FsError::WriteConflict);
        }

        let name = header.name.clone();
        self.writer()?.write_header(header)?;
        self.write_open = true;

        tracing::trace!(name = %name, generation = self.generation, "write slot claimed");

        Ok(self.generation)
    }

    fn check_generation(&self, generation: u64) -> FsResult<()> {
        if !self.write_open || generation != self.generation || self.backend.is_none() {
            return Err(FsError::AlreadyClosed);
        }
        Ok(())
    }

    pub(crate) fn write(&mut self, generation: u64, buf: &[u8]) -> FsResult<usize> {
        use std::io::Write;

        self.check_generation(generation)?;
        Ok(self.writer()?.write(buf)?)
    }

    /// Seals the entry of the handle belonging to `generation`, commits it in its
    /// own index block and frees the slot.
    /// A handle whose session was already synced has nothing left to seal.
    pub(crate) fn end_write(&mut self, generation: u64) -> FsResult<()> {
        if self.check_generation(generation).is_err() {
            return Ok(());
        }

        self.write_open = false;
        let offset = self.writer()?.commit()?;

        tracing::trace!(generation, offset, "write slot released");

        Ok(())
    }

    /// Appends a tombstone for `name`.
    pub(crate) fn tombstone(&mut self, name: &str) -> FsResult<()> {
        if self.read_only {
            return Err(FsError::ReadOnlyFilesystem);
        }

        if self.write_open {
            return Err(FsError::WriteConflict);
        }

        let writer = self.writer()?;
        writer.write_header(Header::tombstone(name))?;
        writer.commit()?;

        Ok(())
    }
}

/// State shared between a filesystem and the handles it opened.
pub(crate) struct Core {
    pub(crate) session: Mutex<Session>,
    pub(crate) options: FsOptions,
}

impl Core {
    pub(crate) fn new(path: PathBuf, options: FsOptions) -> Core {
        Core {
            session: Mutex::new(Session::new(path, &options)),
            options,
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        let session = self.session.get_mut();
        if let Err(e) = session.ensure_closed() {
            tracing::warn!(path = %session.path().display(), error = %e, "failed to close archive on drop");
        }
    }
}
