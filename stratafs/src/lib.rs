//! A POSIX-like filesystem over a strata archive.
//!
//! Archives are append-only: files can be created and read back, and removed
//! by appending a tombstone, but never changed in place. Directories are not
//! stored at all; they exist wherever some entry's name implies them.
//!
//! ```no_run
//! use stratafs::{util, ArchiveFs, FileMode, Filesystem};
//!
//! # fn main() -> stratafs::FsResult<()> {
//! let fs = ArchiveFs::new("data.strata")?;
//! util::write_file(&fs, "a/b.txt", b"hi", FileMode::new(0o644))?;
//! fs.sync()?;
//!
//! for info in fs.read_dir("a")? {
//!     println!("{} {}", info.name, info.size);
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod chroot;
mod dir;
mod error;
mod file;
mod fs;
mod index;
mod mount;
mod options;
mod osfs;
mod overlay;
mod readonly;
mod session;
mod symlink;

pub mod path;
pub mod util;

pub use archive::ArchiveFs;
pub use chroot::ChrootFs;
pub use error::{FsError, FsResult};
pub use file::ArchiveFile;
pub use fs::{Capabilities, File, FileInfo, Filesystem, OpenFlags};
pub use mount::MountFs;
pub use options::FsOptions;
pub use osfs::{OsFile, OsFs};
pub use overlay::{TempOverlayFs, DEFAULT_TEMP_DIR};
pub use readonly::ReadOnlyFs;

pub use strata_format::{FileMode, Snapshot};
