use strata_format::{Index, IndexEntry};

use crate::{path, FsError, FsResult};

/// The live entries of an archive: one per name, tombstones dropped, in the
/// order they were appended.
pub(crate) struct IndexView {
    live: Index,
}

impl IndexView {
    /// Unless `unsafe_paths` is set, entries whose names would not survive
    /// normalization are hidden.
    pub(crate) fn new<'a, I>(raw: I, unsafe_paths: bool) -> IndexView
    where
        I: DoubleEndedIterator<Item = &'a IndexEntry>,
    {
        let live = Index::live_of(raw)
            .into_iter()
            .filter(|e| {
                let keep = unsafe_paths || path::is_canonical(e.name());
                if !keep {
                    tracing::trace!(name = %e.name(), "skipping non-canonical entry");
                }
                keep
            })
            .collect();

        IndexView { live }
    }

    pub(crate) fn find(&self, name: &str) -> Option<&IndexEntry> {
        self.live.iter().find(|e| e.name() == name)
    }

    /// Entries strictly inside `dir`, paired with their name relative to it.
    pub(crate) fn under<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = (&'a str, &'a IndexEntry)> + 'a {
        self.live
            .iter()
            .filter_map(move |e| path::strip_dir(e.name(), dir).map(|rest| (rest, e)))
    }

    pub(crate) fn glob(&self, pattern: &str) -> FsResult<Vec<&IndexEntry>> {
        self.live
            .glob(pattern)
            .map_err(|_| FsError::InvalidPath(pattern.to_string()))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.live.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_format::{FileMode, Header};

    fn entry(name: &str) -> IndexEntry {
        IndexEntry {
            header: Header::new(name, FileMode::new(0o644)),
            start: 0,
            size: 0,
            crc32: 0,
        }
    }

    #[test]
    fn unsafe_names_hidden_by_default() {
        let raw = Index::new(vec![entry("a/../../etc/passwd"), entry("/abs"), entry("ok.txt")]);

        let view = IndexView::new(raw.iter(), false);
        assert_eq!(view.iter().count(), 1);
        assert!(view.find("ok.txt").is_some());

        let view = IndexView::new(raw.iter(), true);
        assert_eq!(view.iter().count(), 3);
        assert!(view.find("/abs").is_some());
    }

    #[test]
    fn under_dir() {
        let raw = Index::new(vec![entry("a/x"), entry("ab/y"), entry("a/b/z")]);
        let view = IndexView::new(raw.iter(), false);
        let names = view.under("a").map(|(rest, _)| rest).collect::<Vec<_>>();
        assert_eq!(names, vec!["x", "b/z"]);
    }

    #[test]
    fn pending_entries_supersede_persisted() {
        let persisted = Index::new(vec![entry("a.txt"), entry("b.txt")]);
        let mut gone = entry("b.txt");
        gone.header = Header::tombstone("b.txt");
        let pending = vec![gone, entry("c.txt"), entry("a.txt")];

        let view = IndexView::new(persisted.iter().chain(pending.iter()), false);
        let names = view.iter().map(|e| e.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["c.txt", "a.txt"]);
    }
}
