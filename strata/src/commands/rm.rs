use stratafs::{ArchiveFs, Filesystem};

use crate::cli::RemoveArgs;
use crate::error::{Error, Result};

pub fn run(args: RemoveArgs, verbose: bool) -> Result<()> {
    let fs = ArchiveFs::new(&args.archive).map_err(|source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    })?;

    for path in args.paths.iter() {
        fs.remove(path).map_err(|source| Error::RemoveEntry {
            path: path.clone(),
            source,
        })?;

        if verbose {
            println!("{}", path);
        }
    }

    fs.sync().map_err(|source| Error::FinishArchive {
        path: args.archive.clone(),
        source,
    })
}
