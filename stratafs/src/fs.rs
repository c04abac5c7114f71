use std::io::SeekFrom;
use std::ops::BitOr;
use std::sync::Arc;
use std::time::SystemTime;

use strata_format::FileMode;

use crate::{path, ChrootFs, FsError, FsResult};

/// What a filesystem implementation can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const WRITE: Capabilities = Capabilities(1 << 0);
    pub const READ: Capabilities = Capabilities(1 << 1);
    pub const READ_AND_WRITE: Capabilities = Capabilities(1 << 2);
    pub const SEEK: Capabilities = Capabilities(1 << 3);
    pub const TRUNCATE: Capabilities = Capabilities(1 << 4);
    pub const LOCK: Capabilities = Capabilities(1 << 5);

    pub const DEFAULT: Capabilities = Capabilities(
        Self::WRITE.0 | Self::READ.0 | Self::READ_AND_WRITE.0 | Self::SEEK.0 | Self::TRUNCATE.0 | Self::LOCK.0,
    );

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub const fn without(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 & !other.0)
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

/// Flags accepted by [`Filesystem::open_file`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct OpenFlags(u32);

impl OpenFlags {
    pub const READ_ONLY: OpenFlags = OpenFlags(0x0);
    pub const WRITE_ONLY: OpenFlags = OpenFlags(0x1);
    pub const READ_WRITE: OpenFlags = OpenFlags(0x2);
    pub const APPEND: OpenFlags = OpenFlags(0x8);
    pub const CREATE: OpenFlags = OpenFlags(0x40);
    pub const EXCLUSIVE: OpenFlags = OpenFlags(0x80);
    pub const TRUNCATE: OpenFlags = OpenFlags(0x200);

    const ACCESS_MASK: u32 = 0x3;

    #[inline(always)]
    pub const fn from_bits(bits: u32) -> OpenFlags {
        OpenFlags(bits)
    }

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every non-access bit of `other` is set. Access modes are compared
    /// with [`OpenFlags::is_read_only`] and friends instead.
    #[inline(always)]
    pub const fn contains(self, other: OpenFlags) -> bool {
        let other = other.0 & !Self::ACCESS_MASK;
        self.0 & other == other
    }

    #[inline(always)]
    pub const fn is_read_only(self) -> bool {
        self.0 & Self::ACCESS_MASK == Self::READ_ONLY.0
    }

    #[inline(always)]
    pub const fn is_write_only(self) -> bool {
        self.0 & Self::ACCESS_MASK == Self::WRITE_ONLY.0
    }

    #[inline(always)]
    pub const fn is_read_write(self) -> bool {
        self.0 & Self::ACCESS_MASK == Self::READ_WRITE.0
    }
}

impl BitOr for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlags) -> OpenFlags {
        OpenFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mode: FileMode,
    pub mod_time: SystemTime,
}

impl FileInfo {
    pub fn dir<S: Into<String>>(name: S, mod_time: SystemTime) -> FileInfo {
        FileInfo {
            name: name.into(),
            size: 0,
            mode: FileMode::DIR | 0o755,
            mod_time,
        }
    }

    #[inline(always)]
    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    #[inline(always)]
    pub fn is_symlink(&self) -> bool {
        self.mode.is_symlink()
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> FileInfo {
        self.name = name.into();
        self
    }
}

/// An open file.
pub trait File: Send {
    /// The path the file was opened with.
    fn name(&self) -> &str;

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;

    /// Reads at `offset` without moving the file position.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> FsResult<usize>;

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64>;

    fn write(&mut self, buf: &[u8]) -> FsResult<usize>;

    /// Releases the file. Every later call, `close` included, fails.
    fn close(&mut self) -> FsResult<()>;

    fn truncate(&mut self, size: u64) -> FsResult<()>;
}

pub trait Filesystem: Send + Sync {
    /// Creates or replaces `path` and opens it for writing.
    fn create(&self, path: &str) -> FsResult<Box<dyn File>> {
        self.open_file(
            path,
            OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE_ONLY,
            FileMode::new(0o666),
        )
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn File>> {
        self.open_file(path, OpenFlags::READ_ONLY, FileMode::default())
    }

    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>>;

    fn stat(&self, path: &str) -> FsResult<FileInfo>;

    /// Like [`Filesystem::stat`] but describes a symlink itself rather than its target.
    fn lstat(&self, path: &str) -> FsResult<FileInfo> {
        self.stat(path)
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>>;

    fn mkdir_all(&self, path: &str, mode: FileMode) -> FsResult<()>;

    fn remove(&self, path: &str) -> FsResult<()>;

    fn rename(&self, from: &str, to: &str) -> FsResult<()>;

    /// Creates a new uniquely named file in `dir` and opens it for writing.
    fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<Box<dyn File>>;

    fn symlink(&self, _target: &str, _link: &str) -> FsResult<()> {
        Err(FsError::Unsupported("symlink"))
    }

    fn readlink(&self, _link: &str) -> FsResult<String> {
        Err(FsError::Unsupported("readlink"))
    }

    fn join(&self, elems: &[&str]) -> String {
        path::join(elems)
    }

    fn root(&self) -> &str {
        "/"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DEFAULT
    }

    /// Persists pending state. Implementations without any keep the default.
    fn sync(&self) -> FsResult<()> {
        Ok(())
    }

    /// Jails the filesystem below `base`.
    fn chroot(self, base: &str) -> ChrootFs<Self>
    where
        Self: Sized,
    {
        ChrootFs::new(self, base)
    }
}

impl<F: Filesystem + ?Sized> Filesystem for Arc<F> {
    fn create(&self, path: &str) -> FsResult<Box<dyn File>> {
        (**self).create(path)
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn File>> {
        (**self).open(path)
    }

    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>> {
        (**self).open_file(path, flags, mode)
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        (**self).stat(path)
    }

    fn lstat(&self, path: &str) -> FsResult<FileInfo> {
        (**self).lstat(path)
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        (**self).read_dir(path)
    }

    fn mkdir_all(&self, path: &str, mode: FileMode) -> FsResult<()> {
        (**self).mkdir_all(path, mode)
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        (**self).remove(path)
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        (**self).rename(from, to)
    }

    fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<Box<dyn File>> {
        (**self).temp_file(dir, prefix)
    }

    fn symlink(&self, target: &str, link: &str) -> FsResult<()> {
        (**self).symlink(target, link)
    }

    fn readlink(&self, link: &str) -> FsResult<String> {
        (**self).readlink(link)
    }

    fn join(&self, elems: &[&str]) -> String {
        (**self).join(elems)
    }

    fn root(&self) -> &str {
        (**self).root()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn sync(&self) -> FsResult<()> {
        (**self).sync()
    }
}

/// A file reported under a different name than its backend knows it by.
pub(crate) struct RenamedFile {
    inner: Box<dyn File>,
    name: String,
}

impl RenamedFile {
    pub(crate) fn wrap(inner: Box<dyn File>, name: String) -> Box<dyn File> {
        Box::new(RenamedFile { inner, name })
    }
}

impl File for RenamedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.inner.read(buf)
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        self.inner.read_at(buf, offset)
    }

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        self.inner.seek(pos)
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        self.inner.write(buf)
    }

    fn close(&mut self) -> FsResult<()> {
        self.inner.close()
    }

    fn truncate(&mut self, size: u64) -> FsResult<()> {
        self.inner.truncate(size)
    }
}
