//! Tests for symlink handling in legacy-mode archives.
//!
//! Links are plain entries whose mode carries the symlink bits and whose
//! content is the target path.

use stratafs::{util, ArchiveFs, FileMode, Filesystem, FsError, FsOptions};
use tempfile::TempDir;

fn create_legacy_fs() -> (TempDir, ArchiveFs) {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("links.strata");
    let fs = ArchiveFs::with_options(&archive_path, FsOptions::legacy()).unwrap();
    (temp_dir, fs)
}

fn write(fs: &ArchiveFs, path: &str, data: &[u8]) {
    util::write_file(fs, path, data, FileMode::new(0o644)).unwrap();
}

/// Test basic symlink: link and target in same directory
#[test]
fn test_symlink_same_directory() {
    let (_dir, fs) = create_legacy_fs();

    write(&fs, "dir/target.txt", b"hello world");
    fs.symlink("target.txt", "dir/link.txt").unwrap();

    assert_eq!(fs.readlink("dir/link.txt").unwrap(), "target.txt");
    assert_eq!(util::read_file(&fs, "dir/link.txt").unwrap(), b"hello world");

    let info = fs.stat("dir/link.txt").unwrap();
    assert_eq!(info.name, "link.txt");
    assert_eq!(info.size, 11);
    assert!(!info.is_symlink());

    let info = fs.lstat("dir/link.txt").unwrap();
    assert!(info.is_symlink());
    assert_eq!(info.mode.perm(), 0o777);
    assert_eq!(info.size, "target.txt".len() as u64);
}

/// Relative targets climb from the link's own directory.
#[test]
fn test_symlink_parent_directory() {
    let (_dir, fs) = create_legacy_fs();

    write(&fs, "shared/data.bin", b"\x00\x01");
    fs.symlink("../../shared/data.bin", "a/b/link").unwrap();

    assert_eq!(util::read_file(&fs, "a/b/link").unwrap(), b"\x00\x01");
}

#[test]
fn test_symlink_absolute_target() {
    let (_dir, fs) = create_legacy_fs();

    write(&fs, "root.txt", b"root");
    fs.symlink("/root.txt", "deep/in/link").unwrap();

    assert_eq!(util::read_file(&fs, "deep/in/link").unwrap(), b"root");
}

#[test]
fn test_symlink_chain() {
    let (_dir, fs) = create_legacy_fs();

    write(&fs, "end.txt", b"end");
    fs.symlink("end.txt", "one").unwrap();
    fs.symlink("one", "two").unwrap();
    fs.symlink("two", "three").unwrap();

    assert_eq!(util::read_file(&fs, "three").unwrap(), b"end");
    assert_eq!(fs.readlink("three").unwrap(), "two");
}

/// A link to a directory lists the directory.
#[test]
fn test_symlink_to_directory() {
    let (_dir, fs) = create_legacy_fs();

    write(&fs, "real/a.txt", b"a");
    write(&fs, "real/sub/b.txt", b"b");
    fs.symlink("real", "alias").unwrap();

    let names = fs
        .read_dir("alias")
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["sub", "a.txt"]);

    let info = fs.stat("alias").unwrap();
    assert!(info.is_dir());
    assert_eq!(info.name, "alias");
}

#[test]
fn test_symlink_loop() {
    let (_dir, fs) = create_legacy_fs();

    fs.symlink("self", "self").unwrap();
    assert!(matches!(fs.stat("self"), Err(FsError::TooManyLinks(_))));
    assert!(matches!(fs.open("self"), Err(FsError::TooManyLinks(_))));

    fs.symlink("ping", "pong").unwrap();
    fs.symlink("pong", "ping").unwrap();
    assert!(matches!(fs.read_dir("ping"), Err(FsError::TooManyLinks(_))));

    assert!(fs.lstat("self").unwrap().is_symlink());
    assert_eq!(fs.readlink("self").unwrap(), "self");
}

#[test]
fn test_symlink_existing_path() {
    let (_dir, fs) = create_legacy_fs();

    write(&fs, "taken.txt", b"x");
    write(&fs, "dir/file", b"y");

    assert!(matches!(fs.symlink("x", "taken.txt"), Err(FsError::AlreadyExists(_))));
    assert!(matches!(fs.symlink("x", "dir"), Err(FsError::AlreadyExists(_))));
}

#[test]
fn test_dangling_symlink() {
    let (_dir, fs) = create_legacy_fs();

    fs.symlink("nowhere", "dangling").unwrap();
    assert!(fs.stat("dangling").unwrap_err().is_not_found());
    assert!(fs.lstat("dangling").unwrap().is_symlink());
}

#[test]
fn test_readlink_regular_file() {
    let (_dir, fs) = create_legacy_fs();

    write(&fs, "plain.txt", b"plain");
    assert!(matches!(fs.readlink("plain.txt"), Err(FsError::NotASymlink(_))));
    assert!(matches!(fs.readlink("missing"), Err(FsError::NotFound(_))));
}

/// Without the legacy option, link entries are ordinary files.
#[test]
fn test_symlinks_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plain.strata");

    {
        let fs = ArchiveFs::with_options(&path, FsOptions::legacy()).unwrap();
        write(&fs, "target", b"content");
        fs.symlink("target", "link").unwrap();
        fs.sync().unwrap();
    }

    let fs = ArchiveFs::new(&path).unwrap();
    assert!(matches!(fs.symlink("target", "other"), Err(FsError::Unsupported(_))));
    assert!(matches!(fs.readlink("link"), Err(FsError::Unsupported(_))));
    assert_eq!(util::read_file(&fs, "link").unwrap(), b"target");
}
