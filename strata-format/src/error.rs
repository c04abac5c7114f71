pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no block footer found ending at offset {offset:#x}")]
    InvalidFooter { offset: u64 },

    #[error("index signature invalid for block ending at offset {offset:#x}")]
    InvalidSignature { offset: u64 },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch at offset {offset:#x} (expected {expected:#010x}, found {actual:#010x})")]
    ChecksumMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    #[error("offset {offset:#x} is not a snapshot boundary (archive length {length:#x})")]
    InvalidOffset { offset: u64, length: u64 },

    #[error("block ending at offset {offset:#x} has inconsistent lengths")]
    InvalidBlock { offset: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
