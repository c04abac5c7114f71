use std::path::Path;
use std::time::SystemTime;

use stratafs::{ArchiveFs, FileInfo, FileMode, FsOptions, ReadOnlyFs};

use crate::cli::SnapshotArgs;
use crate::error::{Error, Result};

/// Opens `path` for reading as selected by `--at` and `--legacy`.
pub fn open_snapshot(path: &Path, args: &SnapshotArgs) -> Result<ReadOnlyFs<ArchiveFs>> {
    let options = if args.legacy {
        FsOptions::legacy()
    } else {
        FsOptions::new()
    };
    let options = options
        .with_read_only(true)
        .with_snapshot_offset(args.at.unwrap_or(0));

    tracing::debug!(path = %path.display(), ?options, "opening archive");

    ArchiveFs::with_options(path, options)
        .map(ReadOnlyFs::new)
        .map_err(|source| Error::OpenArchive {
            path: path.to_path_buf(),
            source,
        })
}

macro_rules! add {
    ($mode:ident, $bit:expr, $value:tt => $s:ident) => {
        if $mode & $bit > 0 {
            $s.push($value);
        } else {
            $s.push('-');
        }
    };
}

/// `ls -l` style rendering of a mode.
pub fn format_mode(mode: FileMode) -> String {
    let mut s = String::with_capacity(10);

    s.push(if mode.is_dir() {
        'd'
    } else if mode.is_symlink() {
        'l'
    } else {
        '-'
    });

    let perm = mode.perm();
    add!(perm, 0o400, 'r' => s);
    add!(perm, 0o200, 'w' => s);
    add!(perm, 0o100, 'x' => s);
    add!(perm, 0o040, 'r' => s);
    add!(perm, 0o020, 'w' => s);
    add!(perm, 0o010, 'x' => s);
    add!(perm, 0o004, 'r' => s);
    add!(perm, 0o002, 'w' => s);
    add!(perm, 0o001, 'x' => s);

    s
}

#[inline(always)]
pub fn format_time(time: SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[inline(always)]
pub fn format_size(bytes: u64) -> String {
    use humansize::{file_size_opts as options, FileSize};
    bytes
        .file_size(options::BINARY)
        .unwrap_or_else(|_| bytes.to_string())
}

pub fn info_json(path: &str, info: &FileInfo) -> serde_json::Value {
    let kind = if info.is_dir() {
        "directory"
    } else if info.is_symlink() {
        "link"
    } else {
        "file"
    };

    serde_json::json!({
        "path": path,
        "type": kind,
        "size": info.size,
        "mode": info.mode.bits(),
        "modified": format_time(info.mod_time),
    })
}
