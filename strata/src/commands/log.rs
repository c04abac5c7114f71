use strata_format::ArchiveReader;

use crate::cli::LogArgs;
use crate::error::{Error, Result};

pub fn run(args: LogArgs) -> Result<()> {
    let snapshots = ArchiveReader::list_snapshots(&args.archive).map_err(|source| Error::ReadSnapshots {
        path: args.archive.clone(),
        source,
    })?;

    if args.json {
        let values = snapshots
            .iter()
            .map(|s| {
                serde_json::json!({
                    "offset": s.offset,
                    "block_start": s.block_start,
                    "entries": s.entry_count,
                })
            })
            .collect::<Vec<_>>();
        let json = serde_json::to_string_pretty(&values).map_err(|e| Error::Output { source: e.into() })?;
        println!("{}", json);
        return Ok(());
    }

    println!("Offset          Block start     Entries");
    println!("--------------  --------------  -------");
    for snapshot in snapshots.iter() {
        println!(
            "{:>14}  {:>14}  {:>7}",
            snapshot.offset, snapshot.block_start, snapshot.entry_count
        );
    }

    Ok(())
}
