use std::fmt;
use std::ops::BitOr;
use std::time::SystemTime;

/// Per-entry flags stored in the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);

    /// The entry is a tombstone: the name is logically removed as of this point in the log.
    pub const DELETED: Flags = Flags(0x1);

    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Flags {
        Flags(bits)
    }

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Unix-style permission and type bits.
///
/// A mode without any type bits set describes a regular file.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileMode(u32);

impl FileMode {
    pub const TYPE_MASK: u32 = 0o170_000;
    pub const PERM_MASK: u32 = 0o7777;

    pub const SYMLINK: FileMode = FileMode(0o120_000);
    pub const REGULAR: FileMode = FileMode(0o100_000);
    pub const DIR: FileMode = FileMode(0o040_000);

    #[inline(always)]
    pub const fn new(bits: u32) -> FileMode {
        FileMode(bits)
    }

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn perm(self) -> u32 {
        self.0 & Self::PERM_MASK
    }

    #[inline(always)]
    pub const fn file_type(self) -> u32 {
        self.0 & Self::TYPE_MASK
    }

    #[inline(always)]
    pub const fn is_symlink(self) -> bool {
        self.file_type() == Self::SYMLINK.0
    }

    #[inline(always)]
    pub const fn is_dir(self) -> bool {
        self.file_type() == Self::DIR.0
    }

    #[inline(always)]
    pub const fn is_regular(self) -> bool {
        let ty = self.file_type();
        ty == 0 || ty == Self::REGULAR.0
    }
}

impl BitOr<u32> for FileMode {
    type Output = FileMode;

    fn bitor(self, rhs: u32) -> FileMode {
        FileMode(self.0 | rhs)
    }
}

impl From<u32> for FileMode {
    fn from(bits: u32) -> FileMode {
        FileMode(bits)
    }
}

impl fmt::Debug for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileMode({:#o})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Slash-separated name, relative to the archive root.
    pub name: String,
    pub mode: FileMode,
    pub mod_time: SystemTime,
    pub flags: Flags,
}

impl Header {
    pub fn new<S: Into<String>>(name: S, mode: FileMode) -> Header {
        Header {
            name: name.into(),
            mode,
            mod_time: SystemTime::now(),
            flags: Flags::NONE,
        }
    }

    pub fn tombstone<S: Into<String>>(name: S) -> Header {
        Header {
            name: name.into(),
            mode: FileMode::default(),
            mod_time: SystemTime::now(),
            flags: Flags::DELETED,
        }
    }

    #[inline(always)]
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(Flags::DELETED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_types() {
        assert!(FileMode::new(0o644).is_regular());
        assert!(!FileMode::new(0o644).is_symlink());
        assert!((FileMode::SYMLINK | 0o777).is_symlink());
        assert_eq!((FileMode::SYMLINK | 0o777).perm(), 0o777);
        assert!((FileMode::DIR | 0o755).is_dir());
    }

    #[test]
    fn tombstone_is_deleted() {
        assert!(Header::tombstone("a.txt").is_deleted());
        assert!(!Header::new("a.txt", FileMode::new(0o644)).is_deleted());
    }
}
