use std::io::Write;

use stratafs::{util, Filesystem};

use crate::cli::CatArgs;
use crate::error::{Error, Result};
use crate::util::open_snapshot;

pub fn run(args: CatArgs) -> Result<()> {
    let fs = open_snapshot(&args.archive, &args.snapshot)?;

    let read_err = |source| Error::ReadEntry {
        path: args.path.clone(),
        source,
    };

    let mut file = fs.open(&args.path).map_err(read_err)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    util::copy_to(&mut *file, &mut out).map_err(read_err)?;
    out.flush().map_err(|source| Error::Output { source })?;

    file.close().map_err(read_err)
}
