use std::path::Path;

use strata_format::FileMode;

use crate::{ArchiveFs, Capabilities, File, FileInfo, Filesystem, FsError, FsOptions, FsResult, OpenFlags};

/// Rejects every mutation of the wrapped filesystem.
#[derive(Debug, Clone)]
pub struct ReadOnlyFs<F> {
    inner: F,
}

impl<F: Filesystem> ReadOnlyFs<F> {
    pub fn new(inner: F) -> ReadOnlyFs<F> {
        ReadOnlyFs { inner }
    }

    #[inline(always)]
    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl ReadOnlyFs<ArchiveFs> {
    /// Opens `path` read-only as it was at snapshot `offset` (0 for the latest).
    /// Entries appended after that snapshot are never visible.
    pub fn open_archive<P: AsRef<Path>>(path: P, offset: u64) -> FsResult<ReadOnlyFs<ArchiveFs>> {
        let options = FsOptions::new()
            .with_read_only(true)
            .with_snapshot_offset(offset);
        Ok(ReadOnlyFs::new(ArchiveFs::with_options(path, options)?))
    }
}

impl<F: Filesystem> Filesystem for ReadOnlyFs<F> {
    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>> {
        let mutating = OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::APPEND | OpenFlags::EXCLUSIVE;
        if !flags.is_read_only() || flags.bits() & mutating.bits() != 0 {
            return Err(FsError::ReadOnlyFilesystem);
        }

        self.inner.open_file(path, flags, mode)
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        self.inner.stat(path)
    }

    fn lstat(&self, path: &str) -> FsResult<FileInfo> {
        self.inner.lstat(path)
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        self.inner.read_dir(path)
    }

    fn mkdir_all(&self, _path: &str, _mode: FileMode) -> FsResult<()> {
        Err(FsError::ReadOnlyFilesystem)
    }

    fn remove(&self, _path: &str) -> FsResult<()> {
        Err(FsError::ReadOnlyFilesystem)
    }

    fn rename(&self, _from: &str, _to: &str) -> FsResult<()> {
        Err(FsError::ReadOnlyFilesystem)
    }

    fn temp_file(&self, _dir: &str, _prefix: &str) -> FsResult<Box<dyn File>> {
        Err(FsError::Unsupported("temp_file"))
    }

    fn symlink(&self, _target: &str, _link: &str) -> FsResult<()> {
        Err(FsError::ReadOnlyFilesystem)
    }

    fn readlink(&self, link: &str) -> FsResult<String> {
        self.inner.readlink(link)
    }

    fn join(&self, elems: &[&str]) -> String {
        self.inner.join(elems)
    }

    fn root(&self) -> &str {
        self.inner.root()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner
            .capabilities()
            .without(Capabilities::WRITE | Capabilities::READ_AND_WRITE | Capabilities::TRUNCATE)
    }

    fn sync(&self) -> FsResult<()> {
        self.inner.sync()
    }
}
