use std::path::{Path, PathBuf};

use stratafs::{path, util, ArchiveFs, FileInfo, Filesystem, ReadOnlyFs};

use crate::cli::ExtractArgs;
use crate::error::{Error, Result};
use crate::util::open_snapshot;

struct Extractor<'a> {
    fs: &'a ReadOnlyFs<ArchiveFs>,
    output: &'a Path,
    links: bool,
    verbose: bool,
}

impl Extractor<'_> {
    fn host_path(&self, name: &str) -> PathBuf {
        name.split(path::SEPARATOR)
            .fold(self.output.to_path_buf(), |acc, part| acc.join(part))
    }

    fn extract_dir(&self, dir: &str) -> Result<()> {
        let entries = self.fs.read_dir(dir).map_err(|source| Error::ReadEntry {
            path: dir.to_string(),
            source,
        })?;

        for info in entries {
            if !path::is_canonical(&info.name) || info.name.contains(path::SEPARATOR) {
                tracing::warn!(dir, name = %info.name, "skipping entry with unsafe name");
                continue;
            }

            let name = path::join(&[dir, info.name.as_str()]);

            if self.verbose {
                println!("{}", name);
            }

            if info.is_dir() {
                let host = self.host_path(&name);
                std::fs::create_dir_all(&host).map_err(|source| Error::ProcessFile { path: host, source })?;
                self.extract_dir(&name)?;
            } else if info.is_symlink() && self.links {
                self.extract_link(&name)?;
            } else {
                self.extract_file(&name, &info)?;
            }
        }

        Ok(())
    }

    fn extract_file(&self, name: &str, info: &FileInfo) -> Result<()> {
        let read_err = |source| Error::ReadEntry {
            path: name.to_string(),
            source,
        };

        let host = self.host_path(name);
        let out = std::fs::File::create(&host).map_err(|source| Error::ProcessFile {
            path: host.clone(),
            source,
        })?;

        let mut file = self.fs.open(name).map_err(read_err)?;
        let copied = util::copy_to(&mut *file, out).map_err(read_err)?;
        file.close().map_err(read_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(info.mode.perm());
            std::fs::set_permissions(&host, perms).map_err(|source| Error::ProcessFile { path: host, source })?;
        }
        #[cfg(not(unix))]
        let _ = info;

        tracing::debug!(name, size = copied, "extracted");
        Ok(())
    }

    #[cfg(unix)]
    fn extract_link(&self, name: &str) -> Result<()> {
        let target = self.fs.readlink(name).map_err(|source| Error::ReadEntry {
            path: name.to_string(),
            source,
        })?;

        let host = self.host_path(name);
        std::os::unix::fs::symlink(&target, &host).map_err(|source| Error::CreateLink { path: host, source })
    }

    #[cfg(not(unix))]
    fn extract_link(&self, name: &str) -> Result<()> {
        tracing::warn!(name, "symlinks are not supported on this platform; skipping");
        Ok(())
    }
}

pub fn run(args: ExtractArgs, verbose: bool) -> Result<()> {
    let fs = open_snapshot(&args.archive, &args.snapshot)?;

    let output = match args.output {
        Some(output) => output,
        None => std::env::current_dir().map_err(|source| Error::Output { source })?,
    };

    std::fs::create_dir_all(&output).map_err(|source| Error::ProcessFile {
        path: output.clone(),
        source,
    })?;

    let extractor = Extractor {
        fs: &fs,
        output: &output,
        links: args.snapshot.legacy,
        verbose,
    };

    extractor.extract_dir("")
}
