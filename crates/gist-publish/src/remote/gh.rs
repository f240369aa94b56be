//! `GistHost` over the GitHub CLI and git.
//!
//! `gh gist create` cannot upload binary files, so images travel through
//! the gist's git repository: clone with `gh gist clone`, commit, push.

use super::exec::{classify_failure, CommandRunner};
use super::{GistHost, HostedDocument, NewDocument, WorkingCopy};
use crate::config::PublishConfig;
use crate::errors::PublishError;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Adapter shelling out to `gh` and `git`.
#[derive(Debug, Clone)]
pub struct GhCli {
    gh: String,
    git: String,
    runner: CommandRunner,
}

impl GhCli {
    pub fn new(gh: impl Into<String>, git: impl Into<String>, timeout: Duration) -> Self {
        Self {
            gh: gh.into(),
            git: git.into(),
            runner: CommandRunner::new(timeout),
        }
    }

    pub fn from_config(config: &PublishConfig) -> Self {
        Self::new(
            config.gh_program(),
            config.git_program(),
            config.command_timeout(),
        )
    }

    fn git(&self, working_copy: &WorkingCopy, args: &[&str]) -> Result<String, PublishError> {
        let output = self
            .runner
            .run_checked(&self.git, args, Some(working_copy.root()))?;
        Ok(output.stdout.trim().to_string())
    }

    /// Look up the gist owner through the API.
    fn fetch_owner(&self, id: &str) -> Result<String, PublishError> {
        let endpoint = format!("gists/{}", id);
        let output = self
            .runner
            .run_checked(&self.gh, &["api", endpoint.as_str(), "--jq", ".owner.login"], None)?;
        let owner = output.stdout.trim().to_string();
        if owner.is_empty() {
            return Err(PublishError::UnexpectedResponse {
                command: output.command,
                output: "gist has no owner login".to_string(),
            });
        }
        Ok(owner)
    }
}

impl GistHost for GhCli {
    fn check_ready(&self) -> Result<(), PublishError> {
        for tool in [&self.gh, &self.git] {
            if which::which(tool).is_err() {
                return Err(PublishError::ToolMissing { tool: tool.clone() });
            }
        }

        let output = self.runner.run(&self.gh, &["auth", "status"], None)?;
        if !output.success() {
            return Err(PublishError::RemoteAuth {
                command: output.command,
                message: "Not authenticated with gh. Run 'gh auth login' first.".to_string(),
            });
        }
        Ok(())
    }

    fn create_document(&self, document: &NewDocument<'_>) -> Result<HostedDocument, PublishError> {
        // The uploaded filename is taken from the local file, so stage a copy under the gist name
        let staging = tempfile::Builder::new()
            .prefix("gist-publish-")
            .tempdir()?;
        let staged = staging.path().join(document.file_name);
        fs::write(&staged, document.content)?;
        let staged = staged.to_string_lossy().into_owned();

        let mut args = vec!["gist", "create"];
        if document.public {
            args.push("--public");
        }
        if let Some(desc) = document.description {
            args.push("--desc");
            args.push(desc);
        }
        args.push(staged.as_str());

        let output = self.runner.run_checked(&self.gh, &args, None)?;
        let url = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string();

        let Some((owner, id)) = parse_gist_url(&url) else {
            return Err(PublishError::UnexpectedResponse {
                command: output.command,
                output: url,
            });
        };

        let owner = match owner {
            Some(owner) => owner,
            None => self.fetch_owner(&id)?,
        };

        Ok(HostedDocument { id, url, owner })
    }

    fn clone_backing_repository(
        &self,
        document: &HostedDocument,
        dest: &Path,
    ) -> Result<WorkingCopy, PublishError> {
        let dest_str = dest.to_string_lossy();
        self.runner
            .run_checked(&self.gh, &["gist", "clone", document.id.as_str(), dest_str.as_ref()], None)?;
        Ok(WorkingCopy::new(dest))
    }

    fn commit_and_push(
        &self,
        working_copy: &WorkingCopy,
        message: &str,
    ) -> Result<String, PublishError> {
        self.git(working_copy, &["add", "--all"])?;

        // Exit 1 means the index differs from HEAD; a retry after a failed push sees 0
        let staged = self.runner.run(
            &self.git,
            &["diff", "--cached", "--quiet"],
            Some(working_copy.root()),
        )?;
        match staged.exit_code {
            Some(0) => tracing::debug!("nothing new to commit"),
            Some(1) => {
                self.git(working_copy, &["commit", "-m", message])?;
            }
            _ => return Err(classify_failure(&staged)),
        }

        self.git(working_copy, &["push"])?;
        self.git(working_copy, &["rev-parse", "HEAD"])
    }

    fn replace_document(
        &self,
        document: &HostedDocument,
        file_name: &str,
        content: &str,
    ) -> Result<(), PublishError> {
        let staging = tempfile::Builder::new()
            .prefix("gist-publish-")
            .tempdir()?;
        let staged = staging.path().join(file_name);
        fs::write(&staged, content)?;
        let staged = staged.to_string_lossy().into_owned();

        self.runner.run_checked(
            &self.gh,
            &["gist", "edit", document.id.as_str(), "-f", file_name, staged.as_str()],
            None,
        )?;
        Ok(())
    }
}

/// Split a gist URL into (owner, id).
///
/// `https://gist.github.com/octo/abc123` yields `(Some("octo"), "abc123")`;
/// `https://gist.github.com/abc123` yields `(None, "abc123")`.
pub fn parse_gist_url(url: &str) -> Option<(Option<String>, String)> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let path = rest.split_once('/').map(|(_, path)| path)?;
    let segments: Vec<&str> = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [id] => Some((None, id.to_string())),
        [.., owner, id] => Some((Some(owner.to_string()), id.to_string())),
        [] => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gist_url_with_owner() {
        assert_eq!(
            parse_gist_url("https://gist.github.com/octo/abc123"),
            Some((Some("octo".to_string()), "abc123".to_string()))
        );
    }

    #[test]
    fn test_parse_gist_url_without_owner() {
        assert_eq!(
            parse_gist_url("https://gist.github.com/abc123/"),
            Some((None, "abc123".to_string()))
        );
    }

    #[test]
    fn test_parse_gist_url_rejects_garbage() {
        assert_eq!(parse_gist_url("- Creating gist notes.md"), None);
        assert_eq!(parse_gist_url("https://gist.github.com/"), None);
        assert_eq!(parse_gist_url("https://gist.github.com"), None);
    }

    #[test]
    fn test_check_ready_reports_missing_tool() {
        let host = GhCli::new(
            "definitely-not-gh-xyz",
            "definitely-not-git-xyz",
            Duration::from_secs(1),
        );
        let err = host.check_ready().unwrap_err();
        match err {
            PublishError::ToolMissing { tool } => assert_eq!(tool, "definitely-not-gh-xyz"),
            other => panic!("expected ToolMissing, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_commit_and_push_fails_outside_repository() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("_a.png"), b"png").unwrap();
        let host = GhCli::new("gh", "git", Duration::from_secs(10));

        if which::which("git").is_err() {
            return;
        }
        let err = host
            .commit_and_push(&WorkingCopy::new(temp.path()), "Add images")
            .unwrap_err();
        assert!(!err.is_transient());
    }
}
