//! Gist Publishing Library
//!
//! Publishes markdown documents as GitHub gists, uploading the local images
//! they reference and rewriting the references to hosted URLs. The binary is
//! a thin wrapper; the pipeline can be driven from tests through the
//! in-memory [`remote::MemoryHost`].

pub mod cli;
pub mod config;
pub mod document;
pub mod errors;
pub mod output;
pub mod publisher;
pub mod remote;
pub mod report;

// Re-export commonly used types
pub use config::PublishConfig;
pub use document::{AssetReference, Document};
pub use errors::{ActionableError, PublishError};
pub use output::{ExitCode, JsonError, JsonOutput};
pub use publisher::{PublishRequest, PublishResult, PublishSettings, Publisher};
pub use remote::{GhCli, GistHost, MemoryHost};
