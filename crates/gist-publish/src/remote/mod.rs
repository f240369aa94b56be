//! Collaborator capabilities consumed by the publisher.
//!
//! `GistHost` abstracts the hosted-document service and its backing git
//! repository; `Browser` abstracts opening a URL. Each has one adapter over
//! real tools (`gh` + `git`, the platform opener) and an in-memory fake for
//! tests.

pub mod browser;
pub mod exec;
pub mod gh;
pub mod memory;

pub use browser::SystemBrowser;
pub use gh::GhCli;
pub use memory::{MemoryHost, PushOutcome, RecordingBrowser};

use crate::errors::PublishError;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Identity of a created gist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct HostedDocument {
    pub id: String,
    pub url: String,
    pub owner: String,
}

/// Request to create a gist holding a single markdown file
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub file_name: &'a str,
    pub content: &'a str,
    pub public: bool,
    pub description: Option<&'a str>,
}

/// Local clone of a gist's backing repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    root: PathBuf,
}

impl WorkingCopy {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Hosted-document service with a git side channel.
///
/// Implementations block until each call completes.
pub trait GistHost {
    /// Verify tools and credentials before anything is created.
    fn check_ready(&self) -> Result<(), PublishError> {
        Ok(())
    }

    /// Create a gist containing exactly one file.
    fn create_document(&self, document: &NewDocument<'_>) -> Result<HostedDocument, PublishError>;

    /// Clone the gist's backing repository into `dest`, which must not exist yet.
    fn clone_backing_repository(
        &self,
        document: &HostedDocument,
        dest: &Path,
    ) -> Result<WorkingCopy, PublishError>;

    /// Commit everything in the working copy and push it; returns the pushed revision.
    ///
    /// Must be safe to call again after a failed push: already-committed
    /// changes are not committed a second time.
    fn commit_and_push(
        &self,
        working_copy: &WorkingCopy,
        message: &str,
    ) -> Result<String, PublishError>;

    /// Overwrite the content of one file of the gist.
    fn replace_document(
        &self,
        document: &HostedDocument,
        file_name: &str,
        content: &str,
    ) -> Result<(), PublishError>;
}

/// Opens URLs for the user. Best effort.
pub trait Browser {
    fn open(&self, url: &str) -> Result<(), PublishError>;
}
