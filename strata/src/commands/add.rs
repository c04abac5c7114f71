use std::path::{Path, PathBuf};

use stratafs::{path, ArchiveFs, FileMode, OpenFlags};

use crate::cli::AddArgs;
use crate::error::{Error, Result};

#[cfg(unix)]
fn host_mode(meta: &std::fs::Metadata) -> FileMode {
    use std::os::unix::fs::PermissionsExt;
    FileMode::REGULAR | (meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn host_mode(meta: &std::fs::Metadata) -> FileMode {
    if meta.permissions().readonly() {
        FileMode::REGULAR | 0o444
    } else {
        FileMode::REGULAR | 0o644
    }
}

fn archive_name(prefix: &str, host: &Path) -> String {
    let host = host.to_string_lossy();
    path::normalize(&path::join(&[prefix, host.as_ref()]))
}

fn add_file(fs: &ArchiveFs, name: &str, host: &Path, verbose: bool) -> Result<()> {
    let process_err = |source| Error::ProcessFile {
        path: host.to_path_buf(),
        source,
    };
    let add_err = |source| Error::AddFile {
        path: host.to_path_buf(),
        source,
    };

    let meta = std::fs::metadata(host).map_err(process_err)?;
    let mut input = std::fs::File::open(host).map_err(process_err)?;

    let flags = OpenFlags::WRITE_ONLY | OpenFlags::CREATE | OpenFlags::TRUNCATE;
    let mut file = fs.open_archive_file(name, flags, host_mode(&meta)).map_err(add_err)?;
    let written = std::io::copy(&mut input, &mut file).map_err(process_err)?;
    stratafs::File::close(&mut file).map_err(add_err)?;

    tracing::debug!(name, size = written, "added");
    if verbose {
        println!("{}", name);
    }

    Ok(())
}

fn add_dir(fs: &ArchiveFs, args: &AddArgs, dir: &Path, skip: &Path, verbose: bool) -> Result<()> {
    for entry in jwalk::WalkDir::new(dir).skip_hidden(false).sort(true) {
        let entry = entry.map_err(|e| Error::ProcessDirEntry { source: e.into() })?;
        let host: PathBuf = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }

        if file_type.is_symlink() {
            tracing::warn!(path = %host.display(), "skipping symlink");
            continue;
        }

        if host.canonicalize().ok().as_deref() == Some(skip) {
            continue;
        }

        add_file(fs, &archive_name(&args.prefix, &host), &host, verbose)?;
    }

    Ok(())
}

pub fn run(args: AddArgs, verbose: bool) -> Result<()> {
    let fs = ArchiveFs::new(&args.archive).map_err(|source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    })?;

    let archive = args
        .archive
        .canonicalize()
        .unwrap_or_else(|_| args.archive.clone());

    for host in args.files.iter() {
        let meta = std::fs::symlink_metadata(host).map_err(|source| Error::ProcessFile {
            path: host.clone(),
            source,
        })?;

        if meta.is_dir() {
            if !args.recursive {
                tracing::warn!(path = %host.display(), "skipping directory without --recursive");
                continue;
            }
            add_dir(&fs, &args, host, &archive, verbose)?;
        } else if meta.file_type().is_symlink() {
            tracing::warn!(path = %host.display(), "skipping symlink");
        } else {
            if host.canonicalize().ok().as_deref() == Some(archive.as_path()) {
                return Err(Error::AddSelf);
            }
            add_file(&fs, &archive_name(&args.prefix, host), host, verbose)?;
        }
    }

    stratafs::Filesystem::sync(&fs).map_err(|source| Error::FinishArchive {
        path: args.archive.clone(),
        source,
    })
}
