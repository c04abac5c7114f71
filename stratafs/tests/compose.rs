//! Wrappers around an archive filesystem: read-only, temp overlay, mounts
//! and chroot.

use std::sync::Arc;

use stratafs::{
    util, ArchiveFs, Capabilities, FileMode, Filesystem, FsError, MountFs, OsFs, ReadOnlyFs,
    TempOverlayFs, DEFAULT_TEMP_DIR,
};
use tempfile::TempDir;

fn write<F: Filesystem>(fs: &F, path: &str, data: &[u8]) {
    util::write_file(fs, path, data, FileMode::new(0o644)).unwrap();
}

fn names<F: Filesystem>(fs: &F, dir: &str) -> Vec<String> {
    fs.read_dir(dir).unwrap().into_iter().map(|i| i.name).collect()
}

#[test]
fn test_read_only_rejects_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ro.strata");

    {
        let fs = ArchiveFs::new(&path).unwrap();
        write(&fs, "a/b.txt", b"b");
        fs.sync().unwrap();
    }

    let fs = ReadOnlyFs::open_archive(&path, 0).unwrap();
    assert_eq!(util::read_file(&fs, "a/b.txt").unwrap(), b"b");
    assert_eq!(names(&fs, "a"), vec!["b.txt"]);

    assert!(matches!(fs.create("new.txt"), Err(FsError::ReadOnlyFilesystem)));
    assert!(matches!(fs.remove("a/b.txt"), Err(FsError::ReadOnlyFilesystem)));
    assert!(matches!(fs.rename("a/b.txt", "c"), Err(FsError::ReadOnlyFilesystem)));
    assert!(matches!(
        fs.mkdir_all("d", FileMode::new(0o755)),
        Err(FsError::ReadOnlyFilesystem)
    ));
    assert!(matches!(fs.symlink("a", "l"), Err(FsError::ReadOnlyFilesystem)));
    assert!(matches!(fs.temp_file("", "x"), Err(FsError::Unsupported(_))));

    let caps = fs.capabilities();
    assert!(caps.contains(Capabilities::READ));
    assert!(!caps.contains(Capabilities::WRITE));
    assert!(!caps.contains(Capabilities::TRUNCATE));
}

/// Each snapshot of a growing archive can be opened on its own.
#[test]
fn test_read_only_snapshots() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("versions.strata");

    let fs = ArchiveFs::new(&path).unwrap();
    for version in 1..=3u8 {
        write(&fs, "file.txt", &[version]);
        fs.sync().unwrap();
    }

    let snapshots = fs.snapshots().unwrap();
    assert_eq!(snapshots.len(), 3);

    for (i, snapshot) in snapshots.iter().enumerate() {
        let old = ReadOnlyFs::open_archive(&path, snapshot.offset).unwrap();
        assert_eq!(util::read_file(&old, "file.txt").unwrap(), vec![i as u8 + 1]);
    }
}

#[test]
fn test_read_only_over_host_directory() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("host.txt"), b"host").unwrap();

    let fs = ReadOnlyFs::new(OsFs::new(temp_dir.path()));
    assert_eq!(util::read_file(&fs, "host.txt").unwrap(), b"host");
    assert!(matches!(fs.create("x"), Err(FsError::ReadOnlyFilesystem)));
}

/// Temp files land in the scratch store and never in the archive.
#[test]
fn test_temp_overlay() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("overlay.strata");
    let scratch = TempDir::new().unwrap();

    let archive = ArchiveFs::new(&path).unwrap();
    let store = Arc::new(OsFs::new(scratch.path()));
    let fs = TempOverlayFs::new(archive.clone(), store.clone()).unwrap();
    assert_eq!(fs.temp_dir(), DEFAULT_TEMP_DIR);

    write(&fs, "kept.txt", b"kept");

    let mut tmp = fs.temp_file("work", "pack").unwrap();
    assert!(tmp.name().starts_with(".tmp/work/pack"));
    util::write_all(&mut *tmp, b"scratch").unwrap();
    let name = tmp.name().to_string();
    tmp.close().unwrap();

    assert_eq!(util::read_file(&fs, &name).unwrap(), b"scratch");
    assert_eq!(store.read_dir("work").unwrap().len(), 1);

    assert_eq!(names(&fs, ""), vec![".tmp", "kept.txt"]);
    assert!(fs.stat(".tmp").unwrap().is_dir());

    fs.sync().unwrap();
    assert_eq!(names(&archive, ""), vec!["kept.txt"]);
    assert!(archive.glob(".tmp/*").unwrap().is_empty());
}

#[test]
fn test_temp_overlay_inside_temp_dir() {
    let temp_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();

    let archive = ArchiveFs::new(temp_dir.path().join("a.strata")).unwrap();
    let fs = TempOverlayFs::new(archive, OsFs::new(scratch.path())).unwrap();

    let mut tmp = fs.temp_file(".tmp/x", "t").unwrap();
    assert!(tmp.name().starts_with(".tmp/x/t"));
    tmp.close().unwrap();

    let mut tmp = fs.temp_file("", "t").unwrap();
    assert!(tmp.name().starts_with(".tmp/t"));
    tmp.close().unwrap();
}

#[test]
fn test_mount_routing() {
    let temp_dir = TempDir::new().unwrap();
    let host = TempDir::new().unwrap();

    let archive = ArchiveFs::new(temp_dir.path().join("m.strata")).unwrap();
    write(&archive, "docs/readme.md", b"readme");
    write(&archive, "docs/guide.md", b"guide");

    let fs = MountFs::new(archive, "docs/host", OsFs::new(host.path())).unwrap();
    write(&fs, "docs/host/local.txt", b"local");

    assert!(host.path().join("local.txt").exists());
    assert_eq!(util::read_file(&fs, "docs/host/local.txt").unwrap(), b"local");
    assert_eq!(util::read_file(&fs, "docs/readme.md").unwrap(), b"readme");

    assert_eq!(names(&fs, "docs"), vec!["host", "readme.md", "guide.md"]);
    assert_eq!(names(&fs, "docs/host"), vec!["local.txt"]);
    assert_eq!(fs.stat("docs/host/local.txt").unwrap().name, "local.txt");

    assert!(matches!(
        fs.rename("docs/readme.md", "docs/host/readme.md"),
        Err(FsError::Unsupported(_))
    ));

    let mut file = fs.open("docs/host/local.txt").unwrap();
    assert_eq!(file.name(), "docs/host/local.txt");
    file.close().unwrap();
}

#[test]
fn test_chroot() {
    let temp_dir = TempDir::new().unwrap();
    let archive = ArchiveFs::new(temp_dir.path().join("c.strata")).unwrap();

    write(&archive, "outside.txt", b"out");
    write(&archive, "jail/inside.txt", b"in");

    let fs = archive.clone().chroot("jail");
    assert_eq!(fs.root(), "jail");
    assert_eq!(names(&fs, "/"), vec!["inside.txt"]);
    assert_eq!(util::read_file(&fs, "inside.txt").unwrap(), b"in");
    assert!(fs.stat("../outside.txt").unwrap_err().is_not_found());
    assert_eq!(fs.stat("").unwrap().name, "/");

    write(&fs, "new.txt", b"new");
    assert_eq!(util::read_file(&archive, "jail/new.txt").unwrap(), b"new");

    let mut file = fs.open("new.txt").unwrap();
    assert_eq!(file.name(), "new.txt");
    file.close().unwrap();
}
