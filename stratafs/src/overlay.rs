use strata_format::FileMode;

use crate::{path, ArchiveFs, Capabilities, File, FileInfo, Filesystem, FsResult, MountFs, OpenFlags};

/// Where scratch files live unless told otherwise.
pub const DEFAULT_TEMP_DIR: &str = ".tmp";

/// An archive filesystem with a scratch store mounted at a temp directory.
///
/// Archives cannot allocate temporary files, so [`temp_file`](Filesystem::temp_file)
/// requests are served from the store, whatever directory they name. Every
/// other path goes to the archive unchanged, except those below the temp
/// directory.
#[derive(Debug)]
pub struct TempOverlayFs<S> {
    inner: MountFs<ArchiveFs, S>,
}

impl<S: Filesystem> TempOverlayFs<S> {
    pub fn new(archive: ArchiveFs, store: S) -> FsResult<TempOverlayFs<S>> {
        Self::with_temp_dir(archive, store, DEFAULT_TEMP_DIR)
    }

    pub fn with_temp_dir(archive: ArchiveFs, store: S, temp_dir: &str) -> FsResult<TempOverlayFs<S>> {
        Ok(TempOverlayFs {
            inner: MountFs::new(archive, temp_dir, store)?,
        })
    }

    #[inline(always)]
    pub fn temp_dir(&self) -> &str {
        self.inner.mount_point()
    }

    #[inline(always)]
    pub fn archive(&self) -> &ArchiveFs {
        self.inner.base()
    }

    #[inline(always)]
    pub fn store(&self) -> &S {
        self.inner.mounted()
    }
}

impl<S: Filesystem> Filesystem for TempOverlayFs<S> {
    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>> {
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

    fn mkdir_all(&self, path: &str, mode: FileMode) -> FsResult<()> {
        self.inner.mkdir_all(path, mode)
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        self.inner.remove(path)
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        self.inner.rename(from, to)
    }

    fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<Box<dyn File>> {
        let dir = path::normalize(dir);
        let temp_dir = self.temp_dir();

        let target = if dir == temp_dir || path::strip_dir(&dir, temp_dir).is_some() {
            dir
        } else {
            path::normalize(&path::join(&[temp_dir, dir.as_str()]))
        };

        tracing::trace!(dir = %target, prefix, "temp file redirected to store");
        self.inner.temp_file(&target, prefix)
    }

    fn symlink(&self, target: &str, link: &str) -> FsResult<()> {
        self.inner.symlink(target, link)
    }

    fn readlink(&self, link: &str) -> FsResult<String> {
        self.inner.readlink(link)
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn sync(&self) -> FsResult<()> {
        self.inner.sync()
    }
}
