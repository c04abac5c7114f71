use crate::{FsError, FsResult};

/// Configuration for an [`ArchiveFs`](crate::ArchiveFs).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsOptions {
    /// Open the archive for reading only. Required for a non-zero snapshot offset.
    pub read_only: bool,
    /// Expose entry names exactly as stored, including ones that do not
    /// normalize to themselves (`a/../b`, `/abs`, `./x`).
    pub unsafe_paths: bool,
    /// Snapshot to read from. 0 is the latest.
    pub snapshot_offset: u64,
    /// Treat entries carrying the symlink mode bits as links.
    pub symlinks: bool,
}

impl FsOptions {
    pub fn new() -> FsOptions {
        FsOptions::default()
    }

    /// Symlink-aware, raw-name configuration used by older archives.
    pub fn legacy() -> FsOptions {
        FsOptions {
            symlinks: true,
            unsafe_paths: true,
            ..FsOptions::default()
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> FsOptions {
        self.read_only = read_only;
        self
    }

    pub fn with_unsafe_paths(mut self, unsafe_paths: bool) -> FsOptions {
        self.unsafe_paths = unsafe_paths;
        self
    }

    pub fn with_snapshot_offset(mut self, offset: u64) -> FsOptions {
        self.snapshot_offset = offset;
        self
    }

    pub fn with_symlinks(mut self, symlinks: bool) -> FsOptions {
        self.symlinks = symlinks;
        self
    }

    pub fn validate(&self) -> FsResult<()> {
        if !self.read_only && self.snapshot_offset != 0 {
            return Err(FsError::OffsetReadWriteConflict(self.snapshot_offset));
        }
        Ok(())
    }
}
