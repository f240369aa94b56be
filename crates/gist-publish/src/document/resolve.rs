//! Resolution of local references to files on disk.

use super::naming::FilenameAllocator;
use super::normalize_path;
use super::scan::AssetReference;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A local reference backed by a readable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ResolvedAsset {
    /// Path exactly as written in the document
    pub reference: String,
    /// Absolute, normalized path of the file
    pub source: PathBuf,
    /// Flat name the file is stored under in the gist
    pub stored_name: String,
}

/// A local reference that will not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct MissingAsset {
    /// Path exactly as written in the document
    pub reference: String,
    pub reason: MissingReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingReason {
    /// No regular file at the resolved location
    NotFound { resolved: PathBuf },
    /// Absolute filesystem paths are not rebased under the document directory
    AbsolutePath,
    /// Resolved location lies outside the document directory
    OutsideBaseDir { resolved: PathBuf },
    /// File exists but could not be opened
    Unreadable { message: String },
}

impl fmt::Display for MissingAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MissingReason::NotFound { .. } => {
                write!(f, "Referenced image not found, skipping: {}", self.reference)
            }
            MissingReason::AbsolutePath => write!(
                f,
                "Referenced image uses an absolute path, skipping: {} (use a path relative to the markdown file)",
                self.reference
            ),
            MissingReason::OutsideBaseDir { .. } => write!(
                f,
                "Referenced image outside markdown directory, skipping: {}",
                self.reference
            ),
            MissingReason::Unreadable { message } => write!(
                f,
                "Referenced image could not be read, skipping: {} ({})",
                self.reference, message
            ),
        }
    }
}

/// Outcome of resolving a document's local references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Unique resolved references, in first-occurrence order
    pub assets: Vec<ResolvedAsset>,
    /// Unique unresolvable references, in first-occurrence order
    pub missing: Vec<MissingAsset>,
}

/// Resolve local references against `base_dir`.
///
/// Remote references are ignored. Each distinct written path is resolved
/// once. Failures are collected per reference and never abort the run.
/// Percent-encoded paths (`my%20shot.png`) are decoded for the lookup.
pub fn resolve_local<'r, I>(
    references: I,
    base_dir: &Path,
    allocator: &mut FilenameAllocator,
) -> Resolution
where
    I: IntoIterator<Item = &'r AssetReference>,
{
    let base = normalize_path(base_dir);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut resolution = Resolution::default();

    for reference in references {
        if !reference.is_local() || !seen.insert(reference.path.as_str()) {
            continue;
        }

        match locate(&reference.path, &base) {
            Ok(source) => {
                let stored_name = allocator.allocate(&source, &decode(&reference.path));
                tracing::debug!(
                    reference = %reference.path,
                    source = %source.display(),
                    stored_name = %stored_name,
                    "resolved image reference"
                );
                resolution.assets.push(ResolvedAsset {
                    reference: reference.path.clone(),
                    source,
                    stored_name,
                });
            }
            Err(reason) => resolution.missing.push(MissingAsset {
                reference: reference.path.clone(),
                reason,
            }),
        }
    }

    resolution
}

fn decode(path: &str) -> String {
    urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn locate(written: &str, base: &Path) -> Result<PathBuf, MissingReason> {
    let decoded = decode(written);
    let candidate = Path::new(&decoded);

    if candidate.is_absolute() || decoded.starts_with('/') || decoded.starts_with('\\') {
        return Err(MissingReason::AbsolutePath);
    }

    let resolved = normalize_path(&base.join(candidate));
    if !resolved.starts_with(base) {
        return Err(MissingReason::OutsideBaseDir { resolved });
    }

    if !resolved.is_file() {
        return Err(MissingReason::NotFound { resolved });
    }

    if let Err(e) = fs::File::open(&resolved) {
        return Err(MissingReason::Unreadable {
            message: e.to_string(),
        });
    }

    Ok(resolved)
}
