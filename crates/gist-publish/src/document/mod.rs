//! Markdown documents and their image references.
//!
//! A publish run scans the document for image references, resolves the
//! local ones against the document's directory, gives each resolved file a
//! flat stored name, and finally rewrites the reference paths to hosted URLs.

mod naming;
mod resolve;
mod rewrite;
mod scan;

pub use naming::{sanitize_filename, FilenameAllocator};
pub use resolve::{resolve_local, MissingAsset, MissingReason, Resolution, ResolvedAsset};
pub use rewrite::{rewrite, HostedUrls};
pub use scan::{is_remote, scan_references, AssetReference, Locality, References, ReferenceSyntax};

use crate::errors::PublishError;
use std::fs;
use std::path::{Path, PathBuf};

/// Markdown source text plus the directory relative paths resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    base_dir: PathBuf,
}

impl Document {
    pub fn new(text: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Read a markdown file from disk.
    ///
    /// The base directory is the absolute directory containing the file.
    pub fn load(path: &Path) -> Result<Self, PublishError> {
        if !path.is_file() {
            return Err(PublishError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let absolute = std::path::absolute(path)?;
        let base_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        Ok(Self { text, base_dir })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Lazily iterate every image reference in document order.
    ///
    /// Each call starts a fresh scan.
    pub fn references(&self) -> References<'_> {
        scan_references(&self.text)
    }

    pub(crate) fn with_text(&self, text: String) -> Self {
        Self {
            text,
            base_dir: self.base_dir.clone(),
        }
    }
}

/// Normalize a path by resolving `.` and `..` components lexically
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => match components.last() {
                Some(std::path::Component::Normal(_)) => {
                    components.pop();
                }
                Some(std::path::Component::RootDir) | Some(std::path::Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }
    components.iter().collect()
}
