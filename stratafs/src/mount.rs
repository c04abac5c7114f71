use std::time::UNIX_EPOCH;

use strata_format::FileMode;

use crate::fs::RenamedFile;
use crate::{path, Capabilities, File, FileInfo, Filesystem, FsError, FsResult, OpenFlags};

enum Route {
    Base(String),
    /// Path relative to the mounted filesystem's root.
    Mounted(String),
}

/// Serves everything below `mount_point` from a second filesystem.
#[derive(Debug)]
pub struct MountFs<B, M> {
    base: B,
    mount_point: String,
    mounted: M,
}

impl<B: Filesystem, M: Filesystem> MountFs<B, M> {
    pub fn new(base: B, at: &str, mounted: M) -> FsResult<MountFs<B, M>> {
        let mount_point = path::normalize(at);
        if mount_point.is_empty() {
            return Err(FsError::InvalidPath(at.to_string()));
        }

        Ok(MountFs {
            base,
            mount_point,
            mounted,
        })
    }

    #[inline(always)]
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    #[inline(always)]
    pub fn base(&self) -> &B {
        &self.base
    }

    #[inline(always)]
    pub fn mounted(&self) -> &M {
        &self.mounted
    }

    fn route(&self, path: &str) -> Route {
        let name = path::normalize(path);
        if name == self.mount_point {
            return Route::Mounted(String::new());
        }

        match path::strip_dir(&name, &self.mount_point) {
            Some(rest) => Route::Mounted(rest.to_string()),
            None => Route::Base(name),
        }
    }

    fn mounted_name(&self, name: &str) -> String {
        path::normalize(&path::join(&[self.mount_point.as_str(), name]))
    }

    /// The child of `dir` leading towards the mount point, if the mount point is below `dir`.
    fn mount_child(&self, dir: &str) -> Option<&str> {
        path::strip_dir(&self.mount_point, dir).map(|rest| match rest.find(path::SEPARATOR) {
            Some(i) => &rest[..i],
            None => rest,
        })
    }
}

impl<B: Filesystem, M: Filesystem> Filesystem for MountFs<B, M> {
    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>> {
        match self.route(path) {
            Route::Base(name) => self.base.open_file(&name, flags, mode),
            Route::Mounted(rest) => {
                let file = self.mounted.open_file(&rest, flags, mode)?;
                Ok(RenamedFile::wrap(file, self.mounted_name(&rest)))
            }
        }
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        match self.route(path) {
            Route::Base(name) => match self.base.stat(&name) {
                Err(e) if e.is_not_found() && self.mount_child(&name).is_some() => {
                    Ok(FileInfo::dir(path::base(&name), UNIX_EPOCH))
                }
                result => result,
            },
            Route::Mounted(rest) => {
                let info = self.mounted.stat(&rest)?;
                Ok(info.with_name(path::base(&self.mounted_name(&rest))))
            }
        }
    }

    fn lstat(&self, path: &str) -> FsResult<FileInfo> {
        match self.route(path) {
            Route::Base(name) => match self.base.lstat(&name) {
                Err(e) if e.is_not_found() && self.mount_child(&name).is_some() => {
                    Ok(FileInfo::dir(path::base(&name), UNIX_EPOCH))
                }
                result => result,
            },
            Route::Mounted(rest) => {
                let info = self.mounted.lstat(&rest)?;
                Ok(info.with_name(path::base(&self.mounted_name(&rest))))
            }
        }
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        let name = match self.route(path) {
            Route::Base(name) => name,
            Route::Mounted(rest) => return self.mounted.read_dir(&rest),
        };

        let mut entries = match self.base.read_dir(&name) {
            Err(e) if e.is_not_found() && self.mount_child(&name).is_some() => vec![],
            result => result?,
        };

        if let Some(child) = self.mount_child(&name) {
            entries.retain(|e| e.name != child);
            let info = match self.mounted.stat("") {
                Ok(info) => info.with_name(child),
                Err(_) => FileInfo::dir(child, UNIX_EPOCH),
            };
            let at = entries.iter().take_while(|e| e.is_dir()).count();
            entries.insert(at, info);
        }

        Ok(entries)
    }

    fn mkdir_all(&self, path: &str, mode: FileMode) -> FsResult<()> {
        match self.route(path) {
            Route::Base(name) => self.base.mkdir_all(&name, mode),
            Route::Mounted(rest) => self.mounted.mkdir_all(&rest, mode),
        }
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        match self.route(path) {
            Route::Base(name) => self.base.remove(&name),
            Route::Mounted(rest) if rest.is_empty() => Err(FsError::Unsupported("remove mount point")),
            Route::Mounted(rest) => self.mounted.remove(&rest),
        }
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        match (self.route(from), self.route(to)) {
            (Route::Base(from), Route::Base(to)) => self.base.rename(&from, &to),
            (Route::Mounted(from), Route::Mounted(to)) => self.mounted.rename(&from, &to),
            _ => Err(FsError::Unsupported("rename across mount point")),
        }
    }

    fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<Box<dyn File>> {
        match self.route(dir) {
            Route::Base(name) => self.base.temp_file(&name, prefix),
            Route::Mounted(rest) => {
                let file = self.mounted.temp_file(&rest, prefix)?;
                let name = self.mounted_name(file.name());
                Ok(RenamedFile::wrap(file, name))
            }
        }
    }

    fn symlink(&self, target: &str, link: &str) -> FsResult<()> {
        match self.route(link) {
            Route::Base(name) => self.base.symlink(target, &name),
            Route::Mounted(rest) => self.mounted.symlink(target, &rest),
        }
    }

    fn readlink(&self, link: &str) -> FsResult<String> {
        match self.route(link) {
            Route::Base(name) => self.base.readlink(&name),
            Route::Mounted(rest) => self.mounted.readlink(&rest),
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.base.capabilities()
    }

    fn sync(&self) -> FsResult<()> {
        let base = self.base.sync();
        let mounted = self.mounted.sync();
        base.and(mounted)
    }
}
