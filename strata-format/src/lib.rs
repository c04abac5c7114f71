mod de;
mod error;
mod file;
mod footer;
mod header;
mod index;
mod ser;

pub use error::{Error, Result};
pub use file::{ArchiveReadWriter, ArchiveReader, EntryReader, Snapshot};
pub use header::{FileMode, Flags, Header};
pub use index::{Index, IndexEntry};

#[doc(hidden)]
pub use glob;
