use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_format::{FileMode, Header, Snapshot};

use crate::dir;
use crate::index::IndexView;
use crate::session::{Core, Session};
use crate::symlink;
use crate::{
    path, util, ArchiveFile, Capabilities, File, FileInfo, Filesystem, FsError, FsOptions,
    FsResult, OpenFlags,
};

/// A filesystem stored in a single append-only archive.
///
/// The archive is opened on first use and stays open until [`sync`](Filesystem::sync),
/// which seals and indexes everything written so far. Dropping the last clone
/// of an `ArchiveFs` (and the last handle it opened) does the same, but can only
/// log failures; call `sync` to see them.
///
/// Only one file may be open for writing at a time.
#[derive(Clone)]
pub struct ArchiveFs {
    core: Arc<Core>,
}

impl std::fmt::Debug for ArchiveFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFs")
            .field("path", &self.path())
            .field("options", &self.core.options)
            .finish()
    }
}

impl ArchiveFs {
    pub fn new<P: AsRef<Path>>(path: P) -> FsResult<ArchiveFs> {
        Self::with_options(path, FsOptions::default())
    }

    pub fn with_options<P: AsRef<Path>>(path: P, options: FsOptions) -> FsResult<ArchiveFs> {
        options.validate()?;

        Ok(ArchiveFs {
            core: Arc::new(Core::new(path.as_ref().to_path_buf(), options)),
        })
    }

    pub(crate) fn from_core(core: Arc<Core>) -> ArchiveFs {
        ArchiveFs { core }
    }

    #[inline(always)]
    pub fn options(&self) -> &FsOptions {
        &self.core.options
    }

    pub fn path(&self) -> PathBuf {
        self.core.session.lock().path().to_path_buf()
    }

    /// Index blocks visible to this filesystem, oldest first.
    pub fn snapshots(&self) -> FsResult<Vec<Snapshot>> {
        self.core.session.lock().snapshots()
    }

    /// Full names of live entries matching a shell pattern. `*` and `?` do not
    /// match `/`.
    pub fn glob(&self, pattern: &str) -> FsResult<Vec<String>> {
        let mut session = self.core.session.lock();
        let view = self.view(&mut session)?;
        let names = view.glob(pattern)?.into_iter().map(|e| e.name().to_string()).collect();
        Ok(names)
    }

    fn view(&self, session: &mut Session) -> FsResult<IndexView> {
        let unsafe_paths = self.core.options.unsafe_paths;
        session.with_index(|raw| IndexView::new(raw, unsafe_paths))
    }

    fn follow(&self, session: &mut Session, view: &IndexView, name: &str) -> FsResult<String> {
        if self.core.options.symlinks {
            symlink::follow(session, view, name)
        } else {
            Ok(name.to_string())
        }
    }

    /// [`Filesystem::open_file`] without the boxing.
    pub fn open_archive_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<ArchiveFile> {
        if flags.contains(OpenFlags::CREATE) && !flags.contains(OpenFlags::TRUNCATE) {
            return Err(FsError::Unsupported("create without truncate"));
        }

        if flags.contains(OpenFlags::APPEND) && !flags.contains(OpenFlags::TRUNCATE) {
            return Err(FsError::Unsupported("append without truncate"));
        }

        if flags.is_read_write() {
            return Err(FsError::Unsupported("read-write mode"));
        }

        let name = path::normalize(path);
        let mut session = self.core.session.lock();

        if flags.contains(OpenFlags::CREATE) {
            if name.is_empty() {
                return Err(FsError::InvalidPath(path.to_string()));
            }

            let generation = session.begin_write(Header::new(name.clone(), mode))?;
            tracing::trace!(name = %name, "opened for writing");
            return Ok(ArchiveFile::writing(name, flags, mode, self.core.clone(), generation));
        }

        if flags.is_write_only() {
            return Err(FsError::Unsupported("write-only without create"));
        }

        let view = self.view(&mut session)?;
        let resolved = self.follow(&mut session, &view, &name)?;
        let entry = view
            .find(&resolved)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        let reader = session.get(entry)?;

        tracing::trace!(name = %name, resolved = %resolved, size = entry.size, "opened for reading");

        Ok(ArchiveFile::reading(
            name,
            flags,
            entry.header.mode,
            self.core.clone(),
            reader,
        ))
    }
}

impl Filesystem for ArchiveFs {
    fn open_file(&self, path: &str, flags: OpenFlags, mode: FileMode) -> FsResult<Box<dyn File>> {
        Ok(Box::new(self.open_archive_file(path, flags, mode)?))
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let name = path::normalize(path);
        let mut session = self.core.session.lock();
        let view = self.view(&mut session)?;
        let resolved = self.follow(&mut session, &view, &name)?;

        if let Some(entry) = view.find(&resolved) {
            return Ok(dir::file_info(entry, path::base(&name)));
        }

        dir::dir_info(&view, &resolved)
            .map(|info| info.with_name(path::base(&name)))
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn lstat(&self, path: &str) -> FsResult<FileInfo> {
        let name = path::normalize(path);
        let mut session = self.core.session.lock();
        let view = self.view(&mut session)?;

        if let Some(entry) = view.find(&name) {
            return Ok(dir::file_info(entry, path::base(&name)));
        }

        dir::dir_info(&view, &name).ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn read_dir(&self, path: &str) -> FsResult<Vec<FileInfo>> {
        let name = path::normalize(path);
        let mut session = self.core.session.lock();
        let view = self.view(&mut session)?;
        let resolved = self.follow(&mut session, &view, &name)?;

        Ok(dir::read_dir(&view, &resolved))
    }

    fn mkdir_all(&self, path: &str, _mode: FileMode) -> FsResult<()> {
        if self.core.options.read_only {
            return Err(FsError::ReadOnlyFilesystem);
        }

        let name = path::normalize(path);
        let mut session = self.core.session.lock();
        let view = self.view(&mut session)?;

        if view.find(&name).is_some() {
            return Err(FsError::NotADirectory(path.to_string()));
        }

        Ok(())
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        if self.core.options.read_only {
            return Err(FsError::ReadOnlyFilesystem);
        }

        let name = path::normalize(path);
        let mut session = self.core.session.lock();
        let view = self.view(&mut session)?;

        if view.find(&name).is_some() {
            session.tombstone(&name)?;
            tracing::trace!(name = %name, "removed");
            return Ok(());
        }

        if dir::has_descendants(&view, &name) {
            return Err(FsError::NotEmpty(path.to_string()));
        }

        Err(FsError::NotFound(path.to_string()))
    }

    fn rename(&self, _from: &str, _to: &str) -> FsResult<()> {
        Err(FsError::Unsupported("rename"))
    }

    fn temp_file(&self, _dir: &str, _prefix: &str) -> FsResult<Box<dyn File>> {
        Err(FsError::Unsupported("temp_file"))
    }

    fn symlink(&self, target: &str, link: &str) -> FsResult<()> {
        if !self.core.options.symlinks {
            return Err(FsError::Unsupported("symlink"));
        }

        match self.stat(link) {
            Ok(_) => return Err(FsError::AlreadyExists(link.to_string())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        util::write_file(self, link, target.as_bytes(), FileMode::SYMLINK | 0o777)
    }

    fn readlink(&self, link: &str) -> FsResult<String> {
        if !self.core.options.symlinks {
            return Err(FsError::Unsupported("readlink"));
        }

        let name = path::normalize(link);
        let mut session = self.core.session.lock();
        let view = self.view(&mut session)?;
        let entry = view
            .find(&name)
            .ok_or_else(|| FsError::NotFound(link.to_string()))?;

        symlink::read_target(&mut session, entry)
    }

    fn capabilities(&self) -> Capabilities {
        if self.core.options.read_only {
            Capabilities::READ | Capabilities::SEEK
        } else {
            Capabilities::WRITE | Capabilities::READ | Capabilities::SEEK | Capabilities::TRUNCATE
        }
    }

    fn sync(&self) -> FsResult<()> {
        self.core.session.lock().ensure_closed()
    }
}
