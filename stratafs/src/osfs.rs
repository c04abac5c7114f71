use std::fs::{self, Metadata, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use strata_format::FileMode;

use crate::{path, Capabilities, File, FileInfo, Filesystem, FsError, FsResult, OpenFlags};

fn map_err(err: io::Error, path: &str) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_string()),
        _ => FsError::Io(err),
    }
}

#[cfg(unix)]
fn mode_of(meta: &Metadata) -> FileMode {
    use std::os::unix::fs::MetadataExt;
    FileMode::new(meta.mode())
}

#[cfg(not(unix))]
fn mode_of(meta: &Metadata) -> FileMode {
    let ty = meta.file_type();
    if ty.is_dir() {
        FileMode::DIR | 0o755
    } else if ty.is_symlink() {
        FileMode::SYMLINK | 0o777
    } else if meta.permissions().readonly() {
        FileMode::REGULAR | 0o444
    } else {
        FileMode::REGULAR | 0o644
    }
}

fn info(name: &str, meta: &Metadata) -> FileInfo {
    FileInfo {
        name: path::base(name).to_string(),
        size: if meta.is_dir() { 0 } else { meta.len() },
        mode: mode_of(meta),
        mod_time: meta.modified().unwrap_or(UNIX_EPOCH),
    }
}

/// A directory on the host, used as a filesystem. Paths are normalized before
/// being joined onto the root, so nothing outside it is reachable.
#[derive(Debug, Clone)]
pub struct OsFs {
    root: PathBuf,
}

impl OsFs {
    pub fn new<P: Into<PathBuf>>(root: P) -> OsFs {
        OsFs { root: root.into() }
    }

    #[inline(always)]
    pub fn host_root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, name: &str) -> PathBuf {
        if name.is_empty() {
            self.root.clone()
        } else {
            self.root.join(name)
        }
    }

    fn create_parent(&self, name: &str) -> FsResult<()> {
        let parent = self.host_path(path::dir(name));
        fs::create_dir_all(&parent).map_err(|e| map_err(e, name))
    }
}

impl Filesystem for OsFs {
    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>> {
        let name = path::normalize(path);

        if flags.contains(OpenFlags::CREATE) {
            self.create_parent(&name)?;
        }

        let mut options = OpenOptions::new();
        options
            .read(!flags.is_write_only())
            .write(!flags.is_read_only())
            .append(flags.contains(OpenFlags::APPEND))
            .truncate(flags.contains(OpenFlags::TRUNCATE));

        if flags.contains(OpenFlags::CREATE | OpenFlags::EXCLUSIVE) {
            options.create_new(true);
        } else if flags.contains(OpenFlags::CREATE) {
            options.create(true);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode.perm());
        }
        #[cfg(not(unix))]
        let _ = mode;

        let file = options
            .open(self.host_path(&name))
            .map_err(|e| map_err(e, path))?;

        Ok(Box::new(OsFile {
            name,
            flags,
            file: Some(file),
        }))
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let name = path::normalize(path);
        let meta = fs::metadata(self.host_path(&name)).map_err(|e| map_err(e, path))?;
        Ok(info(&name, &meta))
    }

    fn lstat(&self, path: &str) -> FsResult<FileInfo> {
        let name = path::normalize(path);
        let meta = fs::symlink_metadata(self.host_path(&name)).map_err(|e| map_err(e, path))?;
        Ok(info(&name, &meta))
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        let name = path::normalize(path);
        let mut out = vec![];

        for entry in fs::read_dir(self.host_path(&name)).map_err(|e| map_err(e, path))? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            out.push(info(&entry_name, &meta));
        }

        out.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name)));
        Ok(out)
    }

    fn mkdir_all(&self, path: &str, _mode: FileMode) -> FsResult<()> {
        let name = path::normalize(path);
        fs::create_dir_all(self.host_path(&name)).map_err(|e| map_err(e, path))
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        let name = path::normalize(path);
        let host = self.host_path(&name);
        let meta = fs::symlink_metadata(&host).map_err(|e| map_err(e, path))?;

        if meta.is_dir() {
            if fs::read_dir(&host)?.next().is_some() {
                return Err(FsError::NotEmpty(path.to_string()));
            }
            fs::remove_dir(&host).map_err(|e| map_err(e, path))
        } else {
            fs::remove_file(&host).map_err(|e| map_err(e, path))
        }
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let from_name = path::normalize(from);
        let to_name = path::normalize(to);
        self.create_parent(&to_name)?;
        fs::rename(self.host_path(&from_name), self.host_path(&to_name)).map_err(|e| map_err(e, from))
    }

    fn temp_file(&self, dir: &str, prefix: &str) -> FsResult<Box<dyn File>> {
        let dir = path::normalize(dir);
        let host_dir = self.host_path(&dir);
        fs::create_dir_all(&host_dir)?;

        let (file, host) = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(&host_dir)?
            .keep()
            .map_err(|e| FsError::Io(e.error))?;

        let file_name = host
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Box::new(OsFile {
            name: path::join(&[dir.as_str(), file_name.as_str()]),
            flags: OpenFlags::READ_WRITE | OpenFlags::CREATE | OpenFlags::EXCLUSIVE,
            file: Some(file),
        }))
    }

    #[cfg(unix)]
    fn symlink(&self, target: &str, link: &str) -> FsResult<()> {
        let name = path::normalize(link);
        self.create_parent(&name)?;
        std::os::unix::fs::symlink(target, self.host_path(&name)).map_err(|e| map_err(e, link))
    }

    fn readlink(&self, link: &str) -> FsResult<String> {
        let name = path::normalize(link);
        let target = fs::read_link(self.host_path(&name)).map_err(|e| map_err(e, link))?;
        Ok(target.to_string_lossy().into_owned())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::DEFAULT
    }
}

#[derive(Debug)]
pub struct OsFile {
    name: String,
    flags: OpenFlags,
    file: Option<fs::File>,
}

impl OsFile {
    fn file(&mut self) -> FsResult<&mut fs::File> {
        self.file.as_mut().ok_or(FsError::AlreadyClosed)
    }
}

impl File for OsFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        if self.flags.is_write_only() {
            return Err(FsError::WriteOnlyFile);
        }
        Ok(self.file()?.read(buf)?)
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        if self.flags.is_write_only() {
            return Err(FsError::WriteOnlyFile);
        }
        let file = self.file()?;
        let pos = file.seek(SeekFrom::Current(0))?;
        file.seek(SeekFrom::Start(offset))?;
        let read = file.read(buf);
        file.seek(SeekFrom::Start(pos))?;
        Ok(read?)
    }

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        Ok(self.file()?.seek(pos)?)
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        if self.flags.is_read_only() {
            return Err(FsError::ReadOnlyFile);
        }
        Ok(self.file()?.write(buf)?)
    }

    fn close(&mut self) -> FsResult<()> {
        match self.file.take() {
            Some(file) => Ok(file.sync_all()?),
            None => Err(FsError::AlreadyClosed),
        }
    }

    fn truncate(&mut self, size: u64) -> FsResult<()> {
        if self.flags.is_read_only() {
            return Err(FsError::ReadOnlyFile);
        }
        Ok(self.file()?.set_len(size)?)
    }
}
