use std::path::PathBuf;

use stratafs::FsError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open archive `{}`", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("Cannot read snapshots of `{}`", .path.display())]
    ReadSnapshots {
        path: PathBuf,
        #[source]
        source: strata_format::Error,
    },

    #[error("Cannot read `{path}` from archive")]
    ReadEntry {
        path: String,
        #[source]
        source: FsError,
    },

    #[error("Cannot add file to archive `{}`", .path.display())]
    AddFile {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("Cannot remove `{path}` from archive")]
    RemoveEntry {
        path: String,
        #[source]
        source: FsError,
    },

    #[error("Cannot finish archive `{}`", .path.display())]
    FinishArchive {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("Cannot process file `{}`", .path.display())]
    ProcessFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot process directory entry")]
    ProcessDirEntry {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create link `{}`", .path.display())]
    CreateLink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write output")]
    Output {
        #[source]
        source: std::io::Error,
    },

    #[error("Checksum mismatch in {0} of {1} entries")]
    ChecksumFailures(usize, usize),

    #[error("Cowardly refusing to add the archive to itself")]
    AddSelf,
}
