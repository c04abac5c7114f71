use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use strata_format::{EntryReader, FileMode};

use crate::session::Core;
use crate::{util, ArchiveFs, File, Filesystem, FsError, FsResult, OpenFlags};

enum State {
    Reading(EntryReader),
    /// Appending to the entry started when the handle was opened.
    Writing { generation: u64 },
    Closed,
}

/// A handle on an archive entry. Read handles stream a sealed entry; write
/// handles append to a freshly started one and hold the archive's write slot
/// until closed.
pub struct ArchiveFile {
    name: String,
    flags: OpenFlags,
    mode: FileMode,
    core: Arc<Core>,
    state: State,
}

impl fmt::Debug for ArchiveFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Reading(_) => "reading",
            State::Writing { .. } => "writing",
            State::Closed => "closed",
        };
        f.debug_struct("ArchiveFile")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("mode", &self.mode)
            .field("state", &state)
            .finish()
    }
}

impl Drop for ArchiveFile {
    fn drop(&mut self) {
        if let State::Writing { .. } = self.state {
            if let Err(e) = File::close(self) {
                tracing::warn!(name = %self.name, error = %e, "failed to close file on drop");
            }
        }
    }
}

impl ArchiveFile {
    pub(crate) fn reading(
        name: String,
        flags: OpenFlags,
        mode: FileMode,
        core: Arc<Core>,
        reader: EntryReader,
    ) -> ArchiveFile {
        ArchiveFile {
            name,
            flags,
            mode,
            core,
            state: State::Reading(reader),
        }
    }

    pub(crate) fn writing(
        name: String,
        flags: OpenFlags,
        mode: FileMode,
        core: Arc<Core>,
        generation: u64,
    ) -> ArchiveFile {
        ArchiveFile {
            name,
            flags,
            mode,
            core,
            state: State::Writing { generation },
        }
    }

    #[inline(always)]
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    #[inline(always)]
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    #[inline(always)]
    pub fn is_writing(&self) -> bool {
        matches!(self.state, State::Writing { .. })
    }

    /// Shortens or zero-extends the entry to `size` bytes.
    ///
    /// Archives cannot change an entry in place, so this closes the handle,
    /// reads back the first `size` bytes, starts a new entry of the same name
    /// holding them, and carries on from there. It is **not atomic**: an error
    /// part way through can leave the old entry closed and the new one
    /// partially written, and this handle closed.
    ///
    /// A write handle continues appending after the preserved bytes. A read
    /// handle is reopened on the new entry at its previous position. Sizes past
    /// `i64::MAX` are rejected before anything is closed.
    pub fn truncate_by_rewrite(&mut self, size: u64) -> FsResult<()> {
        if self.core.options.read_only {
            return Err(FsError::ReadOnlyFilesystem);
        }

        if size > i64::MAX as u64 {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "truncate size out of range",
            )));
        }

        let position = match &self.state {
            State::Reading(reader) => Some(reader.position()),
            State::Writing { .. } => None,
            State::Closed => return Err(FsError::AlreadyClosed),
        };

        File::close(self)?;

        let fs = ArchiveFs::from_core(self.core.clone());

        let kept = size.min(fs.stat(&self.name)?.size);
        let mut prefix = vec![0u8; kept as usize];
        {
            let mut old = fs.open_archive_file(&self.name, OpenFlags::READ_ONLY, FileMode::default())?;
            util::read_full(&mut old, &mut prefix)?;
            old.close()?;
        }

        let mut new = fs.open_archive_file(
            &self.name,
            OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE_ONLY,
            self.mode,
        )?;
        util::write_all(&mut new, &prefix)?;
        util::write_zeros(&mut new, size - kept)?;

        let mut replacement = match position {
            None => new,
            Some(position) => {
                new.close()?;
                let mut reopened = fs.open_archive_file(&self.name, self.flags, self.mode)?;
                File::seek(&mut reopened, SeekFrom::Start(position))?;
                reopened
            }
        };

        tracing::trace!(name = %self.name, size, "entry rewritten");

        self.state = std::mem::replace(&mut replacement.state, State::Closed);
        Ok(())
    }
}

impl File for ArchiveFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        match &mut self.state {
            State::Reading(reader) => Ok(reader.read(buf)?),
            State::Writing { .. } => Err(FsError::WriteOnlyFile),
            State::Closed => Err(FsError::AlreadyClosed),
        }
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        match &mut self.state {
            State::Reading(reader) => Ok(reader.read_at(buf, offset)?),
            State::Writing { .. } => Err(FsError::WriteOnlyFile),
            State::Closed => Err(FsError::AlreadyClosed),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        match &mut self.state {
            State::Reading(reader) => Ok(reader.seek(pos)?),
            State::Writing { .. } => Err(FsError::NotSeekable),
            State::Closed => Err(FsError::AlreadyClosed),
        }
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        match self.state {
            State::Reading(_) => Err(FsError::ReadOnlyFile),
            State::Writing { generation } => self.core.session.lock().write(generation, buf),
            State::Closed => Err(FsError::AlreadyClosed),
        }
    }

    fn close(&mut self) -> FsResult<()> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Reading(_) => Ok(()),
            State::Writing { generation } => self.core.session.lock().end_write(generation),
            State::Closed => Err(FsError::AlreadyClosed),
        }
    }

    fn truncate(&mut self, size: u64) -> FsResult<()> {
        self.truncate_by_rewrite(size)
    }
}

impl Read for ArchiveFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(File::read(self, buf)?)
    }
}

impl io::Write for ArchiveFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(File::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.state {
            State::Closed => Err(FsError::AlreadyClosed.into()),
            _ => Ok(()),
        }
    }
}

impl Seek for ArchiveFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(File::seek(self, pos)?)
    }
}
