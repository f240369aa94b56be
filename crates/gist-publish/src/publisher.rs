//! The publish pipeline.
//!
//! Scan → Resolve → Create gist → Stage assets → Push → Rewrite → Finalize.
//!
//! Everything before gist creation is local and side-effect free. Once the
//! gist exists, any later failure is reported as
//! [`PublishError::RemoteStateInconsistent`] carrying the gist identity so
//! the user can finish or delete it by hand.

use crate::config::PublishConfig;
use crate::document::{
    resolve_local, rewrite, AssetReference, Document, FilenameAllocator, HostedUrls, MissingAsset,
    Resolution, ResolvedAsset,
};
use crate::errors::PublishError;
use crate::remote::{GistHost, HostedDocument, NewDocument, WorkingCopy};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded retry for the push step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Knobs of a publish run that come from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    pub timestamp_prefix: bool,
    pub commit_message: String,
    pub retry: RetryPolicy,
    pub raw_base_url: String,
    pub pin_revision: bool,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self::from_config(&PublishConfig::default())
    }
}

impl PublishSettings {
    pub fn from_config(config: &PublishConfig) -> Self {
        Self {
            timestamp_prefix: config.timestamp_prefix(),
            commit_message: config.commit_message(),
            retry: RetryPolicy {
                max_attempts: config.max_attempts(),
                delay: config.retry_delay(),
            },
            raw_base_url: config.raw_base_url(),
            pin_revision: config.pin_revision(),
        }
    }
}

/// What the user asked to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub markdown_file: PathBuf,
    /// Override for the gist's markdown filename
    pub name: Option<String>,
    pub public: bool,
    pub description: Option<String>,
}

impl PublishRequest {
    pub fn new(markdown_file: impl Into<PathBuf>) -> Self {
        Self {
            markdown_file: markdown_file.into(),
            name: None,
            public: false,
            description: None,
        }
    }
}

/// A loaded document with its references resolved, ready to upload.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub document: Document,
    /// Name of the markdown file inside the gist
    pub file_name: String,
    pub references: Vec<AssetReference>,
    pub resolution: Resolution,
    pub public: bool,
    pub description: Option<String>,
}

impl Prepared {
    pub fn local_reference_count(&self) -> usize {
        self.references.iter().filter(|r| r.is_local()).count()
    }
}

/// An uploaded asset and the URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct HostedAsset {
    /// Path exactly as written in the document
    pub reference: String,
    pub stored_name: String,
    pub url: String,
}

/// A created gist whose assets, if any, have been pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPublication {
    pub document: HostedDocument,
    pub file_name: String,
    /// Pushed revision, `None` when there was nothing to push
    pub revision: Option<String>,
    pub assets: Vec<HostedAsset>,
}

impl StagedPublication {
    /// Reference path to hosted URL, for rewriting.
    pub fn hosted_urls(&self) -> HostedUrls {
        self.assets
            .iter()
            .map(|a| (a.reference.clone(), a.url.clone()))
            .collect()
    }
}

/// Final state of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PublishResult {
    pub id: String,
    pub url: String,
    pub owner: String,
    /// Name of the markdown file inside the gist
    pub file_name: String,
    /// Revision the asset URLs point at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub assets: Vec<HostedAsset>,
    /// References left untouched because their file could not be used
    pub missing: Vec<MissingAsset>,
}

/// Runs the publish pipeline against a [`GistHost`].
pub struct Publisher<'h, H: GistHost> {
    host: &'h H,
    settings: PublishSettings,
}

impl<'h, H: GistHost> Publisher<'h, H> {
    pub fn new(host: &'h H, settings: PublishSettings) -> Self {
        Self { host, settings }
    }

    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    /// Load the markdown file and resolve its local references.
    ///
    /// Touches only the local filesystem.
    pub fn prepare(&self, request: &PublishRequest) -> Result<Prepared, PublishError> {
        let document = Document::load(&request.markdown_file)?;
        let timestamp = self.settings.timestamp_prefix.then(Utc::now);
        let file_name = gist_file_name(&request.markdown_file, request.name.as_deref(), timestamp);

        let references: Vec<AssetReference> = document.references().collect();
        let mut allocator = FilenameAllocator::with_reserved([file_name.as_str()]);
        let resolution = resolve_local(&references, document.base_dir(), &mut allocator);
        info!(
            file = %request.markdown_file.display(),
            references = references.len(),
            resolved = resolution.assets.len(),
            missing = resolution.missing.len(),
            "prepared document"
        );

        Ok(Prepared {
            document,
            file_name,
            references,
            resolution,
            public: request.public,
            description: request.description.clone(),
        })
    }

    /// Run the whole pipeline.
    pub fn publish(&self, request: &PublishRequest) -> Result<PublishResult, PublishError> {
        let prepared = self.prepare(request)?;
        self.publish_prepared(&prepared, |_| {})
    }

    /// Run everything after [`prepare`](Self::prepare).
    ///
    /// `on_created` is called once the gist exists, before any asset is
    /// uploaded, so callers can show its URL even if a later step fails.
    pub fn publish_prepared(
        &self,
        prepared: &Prepared,
        on_created: impl FnOnce(&HostedDocument),
    ) -> Result<PublishResult, PublishError> {
        self.host.check_ready()?;

        let staged = self.stage_and_publish(prepared, on_created)?;
        if !staged.assets.is_empty() {
            let rewritten = rewrite(&prepared.document, &staged.hosted_urls());
            self.finalize_publish(&staged.document, &staged.file_name, &rewritten)?;
        }

        Ok(PublishResult {
            id: staged.document.id,
            url: staged.document.url,
            owner: staged.document.owner,
            file_name: staged.file_name,
            revision: staged.revision,
            assets: staged.assets,
            missing: prepared.resolution.missing.clone(),
        })
    }

    /// Create the gist with the original text and push the resolved assets.
    ///
    /// With no resolved assets the gist is created and nothing else
    /// happens: its content is already final.
    pub fn stage_and_publish(
        &self,
        prepared: &Prepared,
        on_created: impl FnOnce(&HostedDocument),
    ) -> Result<StagedPublication, PublishError> {
        let hosted = self.host.create_document(&NewDocument {
            file_name: &prepared.file_name,
            content: prepared.document.text(),
            public: prepared.public,
            description: prepared.description.as_deref(),
        })?;
        info!(id = %hosted.id, url = %hosted.url, "gist created");
        on_created(&hosted);

        if prepared.resolution.assets.is_empty() {
            return Ok(StagedPublication {
                document: hosted,
                file_name: prepared.file_name.clone(),
                revision: None,
                assets: Vec::new(),
            });
        }

        match self.upload_assets(&hosted, &prepared.resolution.assets) {
            Ok((revision, assets)) => Ok(StagedPublication {
                document: hosted,
                file_name: prepared.file_name.clone(),
                revision: Some(revision),
                assets,
            }),
            Err(source) => Err(not_finalized(&hosted, "upload", source)),
        }
    }

    /// Overwrite the gist's markdown with the rewritten text.
    pub fn finalize_publish(
        &self,
        hosted: &HostedDocument,
        file_name: &str,
        rewritten: &Document,
    ) -> Result<(), PublishError> {
        self.host
            .replace_document(hosted, file_name, rewritten.text())
            .map_err(|source| not_finalized(hosted, "finalize", source))?;
        info!(id = %hosted.id, "gist finalized");
        Ok(())
    }

    fn upload_assets(
        &self,
        hosted: &HostedDocument,
        assets: &[ResolvedAsset],
    ) -> Result<(String, Vec<HostedAsset>), PublishError> {
        // Removed on drop, whichever way this returns
        let workspace = tempfile::Builder::new()
            .prefix("gist-publish-")
            .tempdir()?;
        let working_copy = self
            .host
            .clone_backing_repository(hosted, &workspace.path().join("gist"))?;

        for asset in assets {
            let dest = working_copy.root().join(&asset.stored_name);
            debug!(source = %asset.source.display(), dest = %dest.display(), "staging asset");
            fs::copy(&asset.source, &dest)?;
        }

        let revision = push_with_retry(
            self.host,
            &working_copy,
            &self.settings.commit_message,
            self.settings.retry,
        )?;

        let pinned = self.settings.pin_revision.then_some(revision.as_str());
        let hosted_assets = assets
            .iter()
            .map(|asset| HostedAsset {
                reference: asset.reference.clone(),
                stored_name: asset.stored_name.clone(),
                url: hosted_url(
                    &self.settings.raw_base_url,
                    &hosted.owner,
                    &hosted.id,
                    pinned,
                    &asset.stored_name,
                ),
            })
            .collect();

        Ok((revision, hosted_assets))
    }
}

fn not_finalized(hosted: &HostedDocument, stage: &'static str, source: PublishError) -> PublishError {
    PublishError::RemoteStateInconsistent {
        id: hosted.id.clone(),
        url: hosted.url.clone(),
        stage,
        source: Box::new(source),
    }
}

/// Commit and push, retrying transient failures up to `policy.max_attempts` times.
///
/// Any other failure is returned at once without retrying.
pub fn push_with_retry<H: GistHost + ?Sized>(
    host: &H,
    working_copy: &WorkingCopy,
    message: &str,
    policy: RetryPolicy,
) -> Result<String, PublishError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match host.commit_and_push(working_copy, message) {
            Ok(revision) => {
                debug!(attempt, revision = %revision, "push succeeded");
                return Ok(revision);
            }
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if attempt >= max_attempts => {
                return Err(PublishError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                })
            }
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "push failed, retrying"
                );
                thread::sleep(policy.delay);
                attempt += 1;
            }
        }
    }
}

/// Name of the markdown file inside the gist.
///
/// `name` (or the source file name) with `.md` appended if absent, prefixed
/// with a UTC timestamp when given so it sorts before the `_`-prefixed
/// assets and becomes the gist title.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use gist_publish::publisher::gist_file_name;
/// use std::path::Path;
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
/// assert_eq!(
///     gist_file_name(Path::new("docs/post.md"), None, Some(at)),
///     "2026-03-01T090507Z-post.md"
/// );
/// assert_eq!(gist_file_name(Path::new("post.md"), Some("Release notes"), None), "Release notes.md");
/// ```
pub fn gist_file_name(source: &Path, name: Option<&str>, timestamp: Option<DateTime<Utc>>) -> String {
    let mut base = match name {
        Some(name) => name.replace(['/', '\\'], "-"),
        None => source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.md".to_string()),
    };
    if !base.ends_with(".md") {
        base.push_str(".md");
    }

    match timestamp {
        Some(at) => format!("{}-{}", at.format("%Y-%m-%dT%H%M%SZ"), base),
        None => base,
    }
}

/// Raw URL of a file stored in a gist.
///
/// Pinning a revision keeps the URL stable when the gist is later edited.
pub fn hosted_url(
    raw_base_url: &str,
    owner: &str,
    id: &str,
    revision: Option<&str>,
    stored_name: &str,
) -> String {
    let name = urlencoding::encode(stored_name);
    match revision {
        Some(revision) => format!("{raw_base_url}/{owner}/{id}/raw/{revision}/{name}"),
        None => format!("{raw_base_url}/{owner}/{id}/raw/{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MissingReason;
    use crate::output::ExitCode;
    use crate::remote::{MemoryHost, PushOutcome};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn settings() -> PublishSettings {
        PublishSettings {
            timestamp_prefix: false,
            retry: RetryPolicy {
                max_attempts: 3,
                delay: Duration::ZERO,
            },
            ..PublishSettings::default()
        }
    }

    /// Write `post.md` plus the given asset files under a temp dir.
    fn fixture(markdown: &str, assets: &[&str]) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        for asset in assets {
            let path = temp.path().join(asset);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("bytes of {asset}")).unwrap();
        }
        let md = temp.path().join("post.md");
        fs::write(&md, markdown).unwrap();
        (temp, md)
    }

    fn gist_text(host: &MemoryHost, result: &PublishResult) -> String {
        String::from_utf8(host.file(&result.id, &result.file_name).unwrap()).unwrap()
    }

    #[test]
    fn test_rewrites_local_and_keeps_remote() {
        let (_temp, md) = fixture(
            "![diagram](./img/flow.png) and ![ext](https://x.com/y.png)",
            &["img/flow.png"],
        );
        let host = MemoryHost::new("octo");

        let result = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap();

        let revision = result.revision.clone().unwrap();
        let url = format!(
            "https://gist.githubusercontent.com/octo/{}/raw/{}/_flow.png",
            result.id, revision
        );
        assert_eq!(
            gist_text(&host, &result),
            format!("![diagram]({url}) and ![ext](https://x.com/y.png)")
        );
        assert_eq!(result.assets.len(), 1);
        assert_eq!(result.assets[0].url, url);
        assert_eq!(host.file(&result.id, "_flow.png").unwrap(), b"bytes of img/flow.png");
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_missing_asset_is_reported_and_left_untouched() {
        let (_temp, md) = fixture("see ![m](./missing.gif) here", &[]);
        let host = MemoryHost::new("octo");

        let result = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap();

        assert_eq!(gist_text(&host, &result), "see ![m](./missing.gif) here");
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].reference, "./missing.gif");
        assert!(matches!(result.missing[0].reason, MissingReason::NotFound { .. }));
        assert!(result.missing[0].to_string().contains("missing.gif"));
        // Nothing resolved: no clone, no push, no finalize
        assert_eq!(host.calls(), vec!["check_ready", "create_document"]);
        assert_eq!(result.revision, None);
    }

    #[test]
    fn test_transient_push_failures_are_retried_without_duplicate_commits() {
        let (_temp, md) = fixture("![a](a.png) ![b](b.png)", &["a.png", "b.png"]);
        let host = MemoryHost::new("octo");
        host.script_pushes([PushOutcome::Transient, PushOutcome::Transient]);

        let result = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap();

        assert_eq!(host.push_attempts(), 3);
        assert_eq!(
            host.commits(),
            vec![vec!["_a.png".to_string(), "_b.png".to_string()]]
        );
        assert_eq!(result.assets.len(), 2);
        assert_eq!(host.replaced().len(), 1);
    }

    #[test]
    fn test_auth_failure_aborts_without_retry_or_finalize() {
        let (_temp, md) = fixture("![a](a.png)", &["a.png"]);
        let host = MemoryHost::new("octo");
        host.script_pushes([PushOutcome::Auth]);

        let err = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap_err();

        assert_eq!(host.push_attempts(), 1);
        assert!(!host.calls().contains(&"replace_document".to_string()));
        assert!(err.is_auth());
        assert_eq!(err.exit_code(), ExitCode::PermissionDenied);
        match err {
            PublishError::RemoteStateInconsistent { id, stage, .. } => {
                assert_eq!(id, "gist0001");
                assert_eq!(stage, "upload");
            }
            other => panic!("expected RemoteStateInconsistent, got {other:?}"),
        }
    }

    #[test]
    fn test_retries_exhausted() {
        let (_temp, md) = fixture("![a](a.png)", &["a.png"]);
        let host = MemoryHost::new("octo");
        host.script_pushes([PushOutcome::Transient; 5]);

        let err = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap_err();

        assert_eq!(host.push_attempts(), 3);
        assert_eq!(err.exit_code(), ExitCode::ExternalError);
        match err {
            PublishError::RemoteStateInconsistent { source, .. } => {
                assert!(matches!(*source, PublishError::RetriesExhausted { attempts: 3, .. }));
            }
            other => panic!("expected RemoteStateInconsistent, got {other:?}"),
        }
    }

    #[test]
    fn test_finalize_failure_names_the_gist() {
        let (_temp, md) = fixture("![a](a.png)", &["a.png"]);
        let host = MemoryHost::new("octo");
        host.fail_replace();

        let err = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("gist0001"));
        match err {
            PublishError::RemoteStateInconsistent { url, stage, .. } => {
                assert_eq!(url, "https://gist.github.com/octo/gist0001");
                assert_eq!(stage, "finalize");
            }
            other => panic!("expected RemoteStateInconsistent, got {other:?}"),
        }
    }

    #[test]
    fn test_created_callback_runs_before_finalize_failure() {
        let (_temp, md) = fixture("![a](a.png)", &["a.png"]);
        let host = MemoryHost::new("octo");
        host.fail_replace();
        let publisher = Publisher::new(&host, settings());
        let prepared = publisher.prepare(&PublishRequest::new(&md)).unwrap();

        let mut created = Vec::new();
        let err = publisher
            .publish_prepared(&prepared, |hosted| {
                created.push((hosted.url.clone(), host.calls().len()));
            })
            .unwrap_err();

        assert!(matches!(err, PublishError::RemoteStateInconsistent { .. }));
        // Seen right after check_ready and create_document
        assert_eq!(
            created,
            vec![("https://gist.github.com/octo/gist0001".to_string(), 2)]
        );
    }

    #[test]
    fn test_create_failure_is_not_wrapped() {
        let (_temp, md) = fixture("![a](a.png)", &["a.png"]);
        let host = MemoryHost::new("octo");
        host.fail_create();

        let err = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap_err();

        assert!(matches!(err, PublishError::CommandFailed { .. }));
        assert_eq!(host.gist_count(), 0);
    }

    #[test]
    fn test_not_ready_creates_nothing() {
        let (_temp, md) = fixture("![a](a.png)", &["a.png"]);
        let host = MemoryHost::new("octo");
        host.set_not_ready("You are not logged into any GitHub hosts");

        let err = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap_err();

        assert!(err.is_auth());
        assert_eq!(host.gist_count(), 0);
    }

    #[test]
    fn test_missing_markdown_file() {
        let temp = TempDir::new().unwrap();
        let host = MemoryHost::new("octo");

        let err = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(temp.path().join("nope.md")))
            .unwrap_err();

        assert!(matches!(err, PublishError::InputNotFound { .. }));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_same_basename_in_different_directories() {
        let (_temp, md) = fixture(
            "![1](img/a.png)\n![2](assets/a.png)\n![3](./img/a.png)",
            &["img/a.png", "assets/a.png"],
        );
        let host = MemoryHost::new("octo");

        let result = Publisher::new(&host, settings())
            .publish(&PublishRequest::new(&md))
            .unwrap();

        let names: Vec<&str> = result.assets.iter().map(|a| a.stored_name.as_str()).collect();
        assert_eq!(names, vec!["_a.png", "_a-2.png", "_a.png"]);
        assert_eq!(host.file(&result.id, "_a.png").unwrap(), b"bytes of img/a.png");
        assert_eq!(host.file(&result.id, "_a-2.png").unwrap(), b"bytes of assets/a.png");
        assert!(!gist_text(&host, &result).contains("](img/a.png)"));
    }

    #[test]
    fn test_request_metadata_reaches_host() {
        let (_temp, md) = fixture("# Title", &[]);
        let host = MemoryHost::new("octo");
        let request = PublishRequest {
            name: Some("release".to_string()),
            public: true,
            description: Some("Release notes".to_string()),
            ..PublishRequest::new(&md)
        };

        let result = Publisher::new(&host, settings()).publish(&request).unwrap();

        assert_eq!(result.file_name, "release.md");
        assert_eq!(host.is_public(&result.id), Some(true));
        assert_eq!(host.description(&result.id).as_deref(), Some("Release notes"));
    }

    #[test]
    fn test_unpinned_urls() {
        let (_temp, md) = fixture("![s](my%20shot.png)", &["my shot.png"]);
        let host = MemoryHost::new("octo");
        let settings = PublishSettings {
            pin_revision: false,
            ..settings()
        };

        let result = Publisher::new(&host, settings)
            .publish(&PublishRequest::new(&md))
            .unwrap();

        assert_eq!(result.assets[0].stored_name, "_my-shot.png");
        assert_eq!(
            result.assets[0].url,
            format!(
                "https://gist.githubusercontent.com/octo/{}/raw/_my-shot.png",
                result.id
            )
        );
    }

    #[test]
    fn test_prepare_counts_local_references() {
        let (_temp, md) = fixture(
            "![a](a.png) ![r](https://x.com/r.png) <img src=\"b.png\">",
            &["a.png"],
        );
        let host = MemoryHost::new("octo");

        let prepared = Publisher::new(&host, settings())
            .prepare(&PublishRequest::new(&md))
            .unwrap();

        assert_eq!(prepared.references.len(), 3);
        assert_eq!(prepared.local_reference_count(), 2);
        assert_eq!(prepared.resolution.assets.len(), 1);
        assert_eq!(prepared.resolution.missing.len(), 1);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_prepare_adds_timestamp_prefix() {
        let (_temp, md) = fixture("# Title", &[]);
        let host = MemoryHost::new("octo");
        let settings = PublishSettings {
            timestamp_prefix: true,
            ..settings()
        };

        let prepared = Publisher::new(&host, settings)
            .prepare(&PublishRequest::new(&md))
            .unwrap();

        let re = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{6}Z-post\.md$").unwrap();
        assert!(re.is_match(&prepared.file_name), "{}", prepared.file_name);
    }

    #[test]
    fn test_push_with_retry_zero_attempts_still_tries_once() {
        let temp = TempDir::new().unwrap();
        let host = MemoryHost::new("octo");
        let doc = host
            .create_document(&NewDocument {
                file_name: "a.md",
                content: "",
                public: false,
                description: None,
            })
            .unwrap();
        let copy = host
            .clone_backing_repository(&doc, &temp.path().join("gist"))
            .unwrap();

        let policy = RetryPolicy {
            max_attempts: 0,
            delay: Duration::ZERO,
        };
        push_with_retry(&host, &copy, "Add images", policy).unwrap();
        assert_eq!(host.push_attempts(), 1);
    }

    #[test]
    fn test_gist_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap();
        assert_eq!(
            gist_file_name(Path::new("/x/notes.md"), None, Some(at)),
            "2026-10-16T083000Z-notes.md"
        );
        assert_eq!(gist_file_name(Path::new("notes.txt"), None, None), "notes.txt.md");
        assert_eq!(gist_file_name(Path::new("x.md"), Some("a/b"), None), "a-b.md");
    }

    #[test]
    fn test_hosted_url_encodes_name() {
        assert_eq!(
            hosted_url("https://raw.example", "octo", "abc", Some("deadbeef"), "_a b.png"),
            "https://raw.example/octo/abc/raw/deadbeef/_a%20b.png"
        );
    }
}
