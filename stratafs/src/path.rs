//! Archive path handling.
//!
//! Entry names are stored slash-separated, relative to the archive root, with
//! no leading slash and no `.` or `..` segments. [`normalize`] turns any user
//! supplied path into that form.

use std::borrow::Cow;

use relative_path::{Component, RelativePath};

pub const SEPARATOR: char = '/';

#[cfg(windows)]
fn to_slash(path: &str) -> Cow<'_, str> {
    Cow::Owned(path.replace('\\', "/"))
}

#[cfg(not(windows))]
fn to_slash(path: &str) -> Cow<'_, str> {
    Cow::Borrowed(path)
}

fn segments(path: &str) -> Vec<&str> {
    let mut out = vec![];

    for component in RelativePath::new(path.trim_start_matches(SEPARATOR)).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }

    out
}

/// Resolves `path` against the archive root: `.` and `..` are collapsed, repeated
/// separators removed and the leading slash stripped. The root itself is `""`.
pub fn normalize(path: &str) -> String {
    let path = to_slash(path);
    segments(&path).join("/")
}

/// Whether a stored entry name is already in normalized form.
pub fn is_canonical(name: &str) -> bool {
    normalize(name) == name
}

/// Like [`normalize`] but keeps a leading slash.
pub fn clean(path: &str) -> String {
    let normalized = normalize(path);
    if to_slash(path).starts_with(SEPARATOR) {
        format!("/{}", normalized)
    } else {
        normalized
    }
}

/// Joins path elements, skipping empty ones, and cleans the result.
pub fn join<I, S>(elems: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = elems
        .into_iter()
        .filter(|e| !e.as_ref().is_empty())
        .map(|e| e.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        return joined;
    }

    clean(&joined)
}

/// Parent of a normalized name; `""` for top-level names.
pub fn dir(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Last segment of a normalized name. The root is named `/`.
pub fn base(path: &str) -> &str {
    if path.is_empty() {
        return "/";
    }

    match path.rfind(SEPARATOR) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// The part of `name` below `dir`, if `name` lies strictly inside it.
pub(crate) fn strip_dir<'a>(name: &'a str, dir: &str) -> Option<&'a str> {
    if dir.is_empty() {
        return Some(name).filter(|n| !n.is_empty());
    }

    name.strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .filter(|rest| !rest.is_empty())
}
