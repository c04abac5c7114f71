use std::io;

pub type FsResult<T> = std::result::Result<T, FsError>;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("file does not exist: {0}")]
    NotFound(String),

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("file is write-only")]
    WriteOnlyFile,

    #[error("file is read-only")]
    ReadOnlyFile,

    #[error("file is not seekable")]
    NotSeekable,

    #[error("file is already closed")]
    AlreadyClosed,

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("a file is already open in write mode")]
    WriteConflict,

    #[error("directory not empty: {0}")]
    NotEmpty(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a symlink: {0}")]
    NotASymlink(String),

    #[error("read-only filesystem")]
    ReadOnlyFilesystem,

    #[error("snapshot offset {0} requires a read-only filesystem")]
    OffsetReadWriteConflict(u64),

    #[error("too many levels of symbolic links: {0}")]
    TooManyLinks(String),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error(transparent)]
    Archive(#[from] strata_format::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FsError {
    pub fn is_not_found(&self) -> bool {
        match self {
            FsError::NotFound(_) => true,
            FsError::Archive(e) => e.is_not_found(),
            FsError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// A handle was used against its direction: reading or seeking a write
    /// handle, or writing a read handle.
    pub fn is_wrong_direction(&self) -> bool {
        matches!(
            self,
            FsError::WriteOnlyFile | FsError::ReadOnlyFile | FsError::NotSeekable
        )
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, FsError::Unsupported(_))
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> io::Error {
        let kind = match &err {
            FsError::Io(e) => return io::Error::new(e.kind(), err),
            FsError::NotFound(_) => io::ErrorKind::NotFound,
            FsError::AlreadyExists(_) => io::ErrorKind::AlreadyExists,
            FsError::WriteOnlyFile
            | FsError::ReadOnlyFile
            | FsError::ReadOnlyFilesystem
            | FsError::WriteConflict => io::ErrorKind::PermissionDenied,
            FsError::NotSeekable | FsError::Unsupported(_) => io::ErrorKind::Unsupported,
            FsError::InvalidPath(_) | FsError::OffsetReadWriteConflict(_) => {
                io::ErrorKind::InvalidInput
            }
            FsError::Archive(e) if e.is_not_found() => io::ErrorKind::NotFound,
            FsError::Archive(_) => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
