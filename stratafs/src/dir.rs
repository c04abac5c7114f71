//! Directories are never stored. They are inferred from entry names: `a` is a
//! directory as long as some live entry is named `a/...`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use strata_format::IndexEntry;

use crate::index::IndexView;
use crate::{path, FileInfo};

pub(crate) fn file_info(entry: &IndexEntry, name: &str) -> FileInfo {
    FileInfo {
        name: name.to_string(),
        size: entry.size,
        mode: entry.header.mode,
        mod_time: entry.header.mod_time,
    }
}

/// Entries directly inside `dir`.
pub(crate) fn list_files(view: &IndexView, dir: &str) -> Vec<FileInfo> {
    view.under(dir)
        .filter(|(rest, _)| !rest.contains(path::SEPARATOR))
        .map(|(rest, e)| file_info(e, rest))
        .collect()
}

/// Subdirectories of `dir`, first-seen order, each stamped with the newest
/// modification time found below it.
pub(crate) fn list_dirs(view: &IndexView, dir: &str) -> Vec<FileInfo> {
    let mut order = vec![];
    let mut times: HashMap<&str, SystemTime> = HashMap::new();

    for (rest, e) in view.under(dir) {
        let name = match rest.find(path::SEPARATOR) {
            Some(i) => &rest[..i],
            None => continue,
        };

        match times.get_mut(name) {
            Some(time) => {
                if e.header.mod_time > *time {
                    *time = e.header.mod_time;
                }
            }
            None => {
                order.push(name);
                times.insert(name, e.header.mod_time);
            }
        }
    }

    order
        .into_iter()
        .map(|name| FileInfo::dir(name, times[name]))
        .collect()
}

/// The directory at `dir`, if anything lives under it. The root always exists.
pub(crate) fn dir_info(view: &IndexView, dir: &str) -> Option<FileInfo> {
    let newest = view.under(dir).map(|(_, e)| e.header.mod_time).max();

    match newest {
        Some(time) => Some(FileInfo::dir(path::base(dir), time)),
        None if dir.is_empty() => Some(FileInfo::dir(path::base(dir), UNIX_EPOCH)),
        None => None,
    }
}

/// Directories first, then files.
pub(crate) fn read_dir(view: &IndexView, dir: &str) -> Vec<FileInfo> {
    let mut out = list_dirs(view, dir);
    out.extend(list_files(view, dir));
    out
}

pub(crate) fn has_descendants(view: &IndexView, dir: &str) -> bool {
    view.under(dir).next().is_some()
}
