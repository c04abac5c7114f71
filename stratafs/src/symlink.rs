use std::io::Read;

use strata_format::IndexEntry;

use crate::index::IndexView;
use crate::session::Session;
use crate::{path, FsError, FsResult};

/// Hops followed before resolution gives up.
pub(crate) const MAX_LINK_DEPTH: usize = 40;

#[inline(always)]
pub(crate) fn is_symlink(entry: &IndexEntry) -> bool {
    entry.header.mode.is_symlink()
}

/// The raw target stored as the link's content.
pub(crate) fn read_target(session: &mut Session, entry: &IndexEntry) -> FsResult<String> {
    if !is_symlink(entry) {
        return Err(FsError::NotASymlink(entry.name().to_string()));
    }

    let mut buf = Vec::with_capacity(entry.size as usize);
    session.get(entry)?.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Where a link named `link` pointing at `target` leads, as a normalized name.
/// Relative targets are taken from the link's own directory.
pub(crate) fn resolve_target(link: &str, target: &str) -> String {
    if target.starts_with(path::SEPARATOR) {
        path::normalize(target)
    } else {
        path::normalize(&path::join(&[path::dir(link), target]))
    }
}

/// Follows `name` through links until it names something that is not a link,
/// or nothing at all.
pub(crate) fn follow(session: &mut Session, view: &IndexView, name: &str) -> FsResult<String> {
    let mut current = name.to_string();

    for _ in 0..=MAX_LINK_DEPTH {
        let entry = match view.find(&current) {
            Some(entry) if is_symlink(entry) => entry,
            _ => return Ok(current),
        };

        let target = read_target(session, entry)?;
        let next = resolve_target(&current, &target);
        tracing::trace!(link = %current, target = %next, "following symlink");
        current = next;
    }

    Err(FsError::TooManyLinks(name.to_string()))
}
