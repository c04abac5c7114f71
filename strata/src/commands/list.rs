use stratafs::{path, FileInfo, Filesystem};

use crate::cli::ListArgs;
use crate::error::{Error, Result};
use crate::util::{format_mode, format_size, format_time, info_json, open_snapshot};

/// Full paths and infos under `dir`, directories before files at every level.
fn collect<F: Filesystem>(fs: &F, dir: &str, recursive: bool, out: &mut Vec<(String, FileInfo)>) -> Result<()> {
    let entries = fs.read_dir(dir).map_err(|source| Error::ReadEntry {
        path: dir.to_string(),
        source,
    })?;

    for info in entries {
        let full = path::join(&[dir, info.name.as_str()]);
        let descend = recursive && info.is_dir();
        out.push((full.clone(), info));

        if descend {
            collect(fs, &full, recursive, out)?;
        }
    }

    Ok(())
}

pub fn run(args: ListArgs, verbose: bool) -> Result<()> {
    let fs = open_snapshot(&args.archive, &args.snapshot)?;

    let mut entries = vec![];
    collect(&fs, &args.dir, args.recursive, &mut entries)?;

    if args.json {
        let values = entries
            .iter()
            .map(|(name, info)| info_json(name, info))
            .collect::<Vec<_>>();
        let json = serde_json::to_string_pretty(&values).map_err(|e| Error::Output { source: e.into() })?;
        println!("{}", json);
        return Ok(());
    }

    if verbose {
        println!("Mode        Size           Modified               Path");
        println!("----------  -------------  ---------------------  --------");
    }

    for (name, info) in entries.iter() {
        let display = if info.is_dir() {
            format!("{}/", name)
        } else {
            name.to_string()
        };

        if !verbose {
            println!("{}", display);
            continue;
        }

        let size = if info.is_dir() {
            "-".to_string()
        } else {
            format_size(info.size)
        };

        println!(
            "{:10}  {:>12}   {:<20}   {}",
            format_mode(info.mode),
            size,
            format_time(info.mod_time),
            display,
        );
    }

    Ok(())
}
