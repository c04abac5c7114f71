use strata_format::ArchiveReader;

use crate::cli::CheckArgs;
use crate::error::{Error, Result};

pub fn run(args: CheckArgs, verbose: bool) -> Result<()> {
    let reader = ArchiveReader::open_at(&args.archive, args.at.unwrap_or(0)).map_err(|source| {
        Error::ReadSnapshots {
            path: args.archive.clone(),
            source,
        }
    })?;

    let index = reader.index().live();
    let mut failures = 0;

    for entry in index.iter() {
        match reader.verify(entry) {
            Ok(()) => {
                if verbose {
                    println!("ok      {}", entry.name());
                }
            }
            Err(e) => {
                tracing::debug!(name = entry.name(), error = %e, "verification failed");
                println!("FAILED  {}", entry.name());
                failures += 1;
            }
        }
    }

    println!(
        "Checked {} entries in {} snapshots ({} failures)",
        index.len(),
        reader.snapshots().len(),
        failures
    );

    if failures > 0 {
        return Err(Error::ChecksumFailures(failures, index.len()));
    }

    Ok(())
}
