use std::collections::HashSet;

use glob::{MatchOptions, Pattern, PatternError};

use crate::Header;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub header: Header,
    /// Absolute position of the entry's first byte in the archive.
    pub start: u64,
    pub size: u64,
    pub crc32: u32,
}

impl IndexEntry {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    #[inline(always)]
    pub fn is_deleted(&self) -> bool {
        self.header.is_deleted()
    }

    #[inline(always)]
    pub fn end(&self) -> u64 {
        self.start + self.size
    }
}

/// Entries in the order they were appended. Names may repeat; the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index(Vec<IndexEntry>);

impl Index {
    pub fn new(entries: Vec<IndexEntry>) -> Index {
        Index(entries)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline(always)]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<IndexEntry> {
        self.0
    }

    /// The most recent entry for `name`, unless that entry is a tombstone.
    pub fn find(&self, name: &str) -> Option<&IndexEntry> {
        self.0
            .iter()
            .rev()
            .find(|e| e.name() == name)
            .filter(|e| !e.is_deleted())
    }

    /// One entry per live name, keeping physical order.
    pub fn live(&self) -> Index {
        Index::live_of(self.0.iter())
    }

    /// Like [`Index::live`], over entries that need not sit in one index.
    pub fn live_of<'a, I>(entries: I) -> Index
    where
        I: DoubleEndedIterator<Item = &'a IndexEntry>,
    {
        let mut seen = HashSet::new();
        let mut entries = entries
            .rev()
            .filter(|e| seen.insert(e.name()))
            .filter(|e| !e.is_deleted())
            .cloned()
            .collect::<Vec<_>>();
        entries.reverse();
        Index(entries)
    }

    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.0.iter().filter(move |e| e.name().starts_with(prefix))
    }

    /// Entries whose names match a shell pattern. `*` and `?` never cross a `/`.
    pub fn glob(&self, pattern: &str) -> Result<Vec<&IndexEntry>, PatternError> {
        let pattern = Pattern::new(pattern)?;
        Ok(self
            .0
            .iter()
            .filter(|e| pattern.matches_with(e.name(), GLOB_OPTIONS))
            .collect())
    }
}

impl From<Vec<IndexEntry>> for Index {
    fn from(entries: Vec<IndexEntry>) -> Index {
        Index(entries)
    }
}

impl std::iter::FromIterator<IndexEntry> for Index {
    fn from_iter<I: IntoIterator<Item = IndexEntry>>(iter: I) -> Index {
        Index(iter.into_iter().collect())
    }
}

impl Extend<IndexEntry> for Index {
    fn extend<I: IntoIterator<Item = IndexEntry>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Index {
    type Item = IndexEntry;
    type IntoIter = std::vec::IntoIter<IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileMode;

    fn entry(header: Header, start: u64) -> IndexEntry {
        IndexEntry {
            header,
            start,
            size: 1,
            crc32: 0,
        }
    }

    fn file(name: &str, start: u64) -> IndexEntry {
        entry(Header::new(name, FileMode::new(0o644)), start)
    }

    #[test]
    fn last_entry_wins() {
        let index = Index::new(vec![file("a", 0), file("b", 1), file("a", 2)]);
        assert_eq!(index.find("a").unwrap().start, 2);

        let live = index.live();
        let names = live.iter().map(|e| e.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn tombstones_hide_names() {
        let index = Index::new(vec![
            file("a", 0),
            file("b", 1),
            entry(Header::tombstone("a"), 2),
        ]);
        assert!(index.find("a").is_none());
        assert_eq!(index.live().len(), 1);
    }

    #[test]
    fn rewritten_after_tombstone() {
        let index = Index::new(vec![
            file("a", 0),
            entry(Header::tombstone("a"), 1),
            file("a", 2),
        ]);
        assert_eq!(index.find("a").unwrap().start, 2);
    }

    #[test]
    fn glob_stays_in_directory() {
        let index = Index::new(vec![file("a/x.txt", 0), file("a/b/y.txt", 1), file("z.txt", 2)]);
        let hits = index.glob("a/*.txt").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "a/x.txt");

        assert_eq!(index.glob("*.txt").unwrap().len(), 1);
        assert_eq!(index.glob("a/*/*.txt").unwrap().len(), 1);
        assert!(index.glob("a/[").is_err());
    }
}
