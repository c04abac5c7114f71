use strata_format::FileMode;

use crate::fs::RenamedFile;
use crate::{path, Capabilities, File, FileInfo, Filesystem, FsResult, OpenFlags};

/// Confines a filesystem to one of its subdirectories. Paths are resolved
/// against the new root before being joined onto `base`, so `..` cannot climb
/// out of it.
#[derive(Debug, Clone)]
pub struct ChrootFs<F> {
    inner: F,
    base: String,
}

impl<F: Filesystem> ChrootFs<F> {
    pub fn new(inner: F, base: &str) -> ChrootFs<F> {
        ChrootFs {
            inner,
            base: path::normalize(base),
        }
    }

    #[inline(always)]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[inline(always)]
    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    fn underlying(&self, path: &str) -> String {
        path::normalize(&path::join(&[self.base.as_str(), &path::normalize(path)]))
    }

    fn relative<'a>(&self, name: &'a str) -> &'a str {
        path::strip_dir(name, &self.base).unwrap_or(name)
    }

    fn rename_info(&self, path: &str, info: FileInfo) -> FileInfo {
        info.with_name(path::base(&path::normalize(path)))
    }
}

impl<F: Filesystem> Filesystem for ChrootFs<F> {
    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>> {
        let file = self.inner.open_file(&self.underlying(path), flags, mode)?;
        Ok(RenamedFile::wrap(file, path::normalize(path)))
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let info = self.inner.stat(&self.underlying(path))?;
        Ok(self.rename_info(path, info))
    }

    fn lstat(&self, path: &str) -> FsResult<FileInfo> {
        let info = self.inner.lstat(&self.underlying(path))?;
        Ok(self.rename_info(path, info))
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        self.inner.read_dir(&self.underlying(path))
    }

    fn mkdir_all(&self, path: &str, mode: FileMode) -> FsResult<()> {
        self.inner.mkdir_all(&self.underlying(path), mode)
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        self.inner.remove(&self.underlying(path))
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        self.inner.rename(&self.underlying(from), &self.underlying(to))
    }

    fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<Box<dyn File>> {
        let file = self.inner.temp_file(&self.underlying(dir), prefix)?;
        let name = self.relative(&path::normalize(file.name())).to_string();
        Ok(RenamedFile::wrap(file, name))
    }

    fn symlink(&self, target: &str, link: &str) -> FsResult<()> {
        let target = if target.starts_with(path::SEPARATOR) {
            format!("/{}", self.underlying(target))
        } else {
            target.to_string()
        };
        self.inner.symlink(&target, &self.underlying(link))
    }

    fn readlink(&self, link: &str) -> FsResult<String> {
        let target = self.inner.readlink(&self.underlying(link))?;
        if target.starts_with(path::SEPARATOR) {
            let name = path::normalize(&target);
            return Ok(format!("/{}", self.relative(&name)));
        }
        Ok(target)
    }

    fn root(&self) -> &str {
        &self.base
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn sync(&self) -> FsResult<()> {
        self.inner.sync()
    }
}
