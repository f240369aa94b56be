//! Flat, collision-free filenames for assets stored in the gist repository.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Characters that are replaced with `-` in stored names
const REPLACED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Flatten a reference path to a gist-safe filename.
///
/// Keeps only the basename, replaces whitespace and path-hostile characters
/// with `-`, and prefixes `_` so assets sort after the markdown file.
///
/// ```
/// use gist_publish::document::sanitize_filename;
///
/// assert_eq!(sanitize_filename("img/flow chart.png"), "_flow-chart.png");
/// ```
pub fn sanitize_filename(path: &str) -> String {
    let base = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "asset".to_string());

    let flat: String = base
        .chars()
        .map(|c| {
            if c.is_whitespace() || REPLACED.contains(&c) {
                '-'
            } else {
                c
            }
        })
        .collect();

    format!("_{}", flat)
}

/// Hands out stored names that are unique within one publish run.
///
/// Two different source files never share a name, even when their basenames
/// match (`img/a.png` and `assets/a.png` become `_a.png` and `_a-2.png`).
/// The same source file always gets the same name. Comparison is
/// case-insensitive so the names survive case-folding filesystems.
#[derive(Debug, Default)]
pub struct FilenameAllocator {
    taken: HashSet<String>,
    by_source: HashMap<PathBuf, String>,
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator that never hands out any of `names`.
    pub fn with_reserved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allocator = Self::new();
        for name in names {
            allocator.taken.insert(name.as_ref().to_lowercase());
        }
        allocator
    }

    /// Stored name for `source`, derived from the path as `written`.
    pub fn allocate(&mut self, source: &Path, written: &str) -> String {
        if let Some(existing) = self.by_source.get(source) {
            return existing.clone();
        }

        let base = sanitize_filename(written);
        let name = if self.taken.contains(&base.to_lowercase()) {
            let (stem, ext) = split_extension(&base);
            let mut counter = 2;
            loop {
                let candidate = format!("{}-{}{}", stem, counter, ext);
                if !self.taken.contains(&candidate.to_lowercase()) {
                    break candidate;
                }
                counter += 1;
            }
        } else {
            base
        };

        self.taken.insert(name.to_lowercase());
        self.by_source.insert(source.to_path_buf(), name.clone());
        name
    }
}

/// Split `name.ext` into (`name`, `.ext`); dotfiles keep their leading dot in the stem.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 1 => name.split_at(pos),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basename_only() {
        assert_eq!(sanitize_filename("./img/flow.png"), "_flow.png");
        assert_eq!(sanitize_filename("flow.png"), "_flow.png");
    }

    #[test]
    fn test_sanitize_replaces_whitespace_and_hostile_chars() {
        assert_eq!(sanitize_filename("my shot 1.gif"), "_my-shot-1.gif");
        assert_eq!(sanitize_filename("a:b|c.png"), "_a-b-c.png");
    }

    #[test]
    fn test_sanitize_empty_basename() {
        assert_eq!(sanitize_filename(".."), "_asset");
    }

    #[test]
    fn test_allocator_disambiguates_shared_basenames() {
        let mut alloc = FilenameAllocator::new();
        let first = alloc.allocate(Path::new("/doc/img/a.png"), "img/a.png");
        let second = alloc.allocate(Path::new("/doc/assets/a.png"), "assets/a.png");
        let third = alloc.allocate(Path::new("/doc/more/a.png"), "more/a.png");

        assert_eq!(first, "_a.png");
        assert_eq!(second, "_a-2.png");
        assert_eq!(third, "_a-3.png");
    }

    #[test]
    fn test_allocator_same_source_same_name() {
        let mut alloc = FilenameAllocator::new();
        let first = alloc.allocate(Path::new("/doc/a.png"), "./a.png");
        let again = alloc.allocate(Path::new("/doc/a.png"), "a.png");
        assert_eq!(first, again);
    }

    #[test]
    fn test_allocator_is_case_insensitive() {
        let mut alloc = FilenameAllocator::new();
        alloc.allocate(Path::new("/doc/x/Logo.png"), "x/Logo.png");
        let second = alloc.allocate(Path::new("/doc/y/logo.png"), "y/logo.png");
        assert_eq!(second, "_logo-2.png");
    }

    #[test]
    fn test_allocator_respects_reserved_names() {
        let mut alloc = FilenameAllocator::with_reserved(["_notes.md"]);
        let name = alloc.allocate(Path::new("/doc/notes.md"), "notes.md");
        assert_eq!(name, "_notes-2.md");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("_a.png"), ("_a", ".png"));
        assert_eq!(split_extension("_archive.tar.gz"), ("_archive.tar", ".gz"));
        assert_eq!(split_extension("_noext"), ("_noext", ""));
        assert_eq!(split_extension("_.hidden"), ("_.hidden", ""));
    }
}
