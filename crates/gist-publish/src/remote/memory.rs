//! In-memory gist host for testing.
//!
//! Keeps gists in RAM and records every call so tests can assert on the
//! exact sequence of remote effects. Push outcomes can be scripted to
//! simulate flaky networks or rejected credentials.
//! Uses `Rc<RefCell<>>` for shared interior mutability - clones share the same data.

use super::{Browser, GistHost, HostedDocument, NewDocument, WorkingCopy};
use crate::errors::PublishError;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Scripted result of one push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Ok,
    Transient,
    Auth,
}

#[derive(Debug, Clone, Default)]
struct Gist {
    public: bool,
    description: Option<String>,
    files: BTreeMap<String, Vec<u8>>,
}

/// A cloned working copy
#[derive(Debug)]
struct ClonedCopy {
    gist_id: String,
    /// Files committed locally, whether or not they were pushed
    committed: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    gists: HashMap<String, Gist>,
    next_id: u32,
    working_copies: HashMap<PathBuf, ClonedCopy>,
    commits: Vec<Vec<String>>,
    push_script: VecDeque<PushOutcome>,
    push_attempts: u32,
    clones: u32,
    replaced: Vec<(String, String)>,
    calls: Vec<String>,
    not_ready: Option<String>,
    fail_create: bool,
    fail_replace: bool,
}

/// Fake `GistHost` backed by HashMaps.
///
/// # Examples
///
/// ```
/// use gist_publish::remote::{GistHost, MemoryHost, NewDocument};
///
/// let host = MemoryHost::new("octo");
/// let doc = host
///     .create_document(&NewDocument {
///         file_name: "notes.md",
///         content: "# Notes",
///         public: false,
///         description: None,
///     })
///     .unwrap();
///
/// assert_eq!(host.file(&doc.id, "notes.md").unwrap(), b"# Notes");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryHost {
    owner: String,
    state: Rc<RefCell<State>>,
}

impl MemoryHost {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Rc::new(RefCell::new(State::default())),
        }
    }

    /// Queue outcomes for upcoming pushes; once drained, pushes succeed.
    pub fn script_pushes(&self, outcomes: impl IntoIterator<Item = PushOutcome>) {
        self.state.borrow_mut().push_script.extend(outcomes);
    }

    /// Make `check_ready` fail with an authentication error.
    pub fn set_not_ready(&self, message: impl Into<String>) {
        self.state.borrow_mut().not_ready = Some(message.into());
    }

    pub fn fail_create(&self) {
        self.state.borrow_mut().fail_create = true;
    }

    pub fn fail_replace(&self) {
        self.state.borrow_mut().fail_replace = true;
    }

    pub fn gist_count(&self) -> usize {
        self.state.borrow().gists.len()
    }

    /// Current content of a gist file, if present.
    pub fn file(&self, id: &str, name: &str) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .gists
            .get(id)
            .and_then(|g| g.files.get(name).cloned())
    }

    /// Names of the files in a gist, sorted.
    pub fn file_names(&self, id: &str) -> Vec<String> {
        self.state
            .borrow()
            .gists
            .get(id)
            .map(|g| g.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_public(&self, id: &str) -> Option<bool> {
        self.state.borrow().gists.get(id).map(|g| g.public)
    }

    pub fn description(&self, id: &str) -> Option<String> {
        self.state
            .borrow()
            .gists
            .get(id)
            .and_then(|g| g.description.clone())
    }

    /// Files of each commit, in commit order.
    pub fn commits(&self) -> Vec<Vec<String>> {
        self.state.borrow().commits.clone()
    }

    pub fn push_attempts(&self) -> u32 {
        self.state.borrow().push_attempts
    }

    pub fn clone_count(&self) -> u32 {
        self.state.borrow().clones
    }

    /// `(file name, content)` of each replace call.
    pub fn replaced(&self) -> Vec<(String, String)> {
        self.state.borrow().replaced.clone()
    }

    /// Names of the trait methods called, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: &str) {
        self.state.borrow_mut().calls.push(call.to_string());
    }
}

impl GistHost for MemoryHost {
    fn check_ready(&self) -> Result<(), PublishError> {
        self.record("check_ready");
        match &self.state.borrow().not_ready {
            Some(message) => Err(PublishError::RemoteAuth {
                command: "gh auth status".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn create_document(&self, document: &NewDocument<'_>) -> Result<HostedDocument, PublishError> {
        self.record("create_document");
        let mut state = self.state.borrow_mut();
        if state.fail_create {
            return Err(PublishError::CommandFailed {
                command: "gh gist create".to_string(),
                stderr: "HTTP 422: Validation Failed".to_string(),
            });
        }

        state.next_id += 1;
        let id = format!("gist{:04}", state.next_id);
        let mut files = BTreeMap::new();
        files.insert(
            document.file_name.to_string(),
            document.content.as_bytes().to_vec(),
        );
        state.gists.insert(
            id.clone(),
            Gist {
                public: document.public,
                description: document.description.map(str::to_string),
                files,
            },
        );

        Ok(HostedDocument {
            url: format!("https://gist.github.com/{}/{}", self.owner, id),
            owner: self.owner.clone(),
            id,
        })
    }

    fn clone_backing_repository(
        &self,
        document: &HostedDocument,
        dest: &Path,
    ) -> Result<WorkingCopy, PublishError> {
        self.record("clone_backing_repository");
        let mut state = self.state.borrow_mut();
        let gist = state
            .gists
            .get(&document.id)
            .cloned()
            .ok_or_else(|| PublishError::CommandFailed {
                command: format!("gh gist clone {}", document.id),
                stderr: "HTTP 404: Not Found".to_string(),
            })?;

        fs::create_dir_all(dest)?;
        for (name, content) in &gist.files {
            fs::write(dest.join(name), content)?;
        }

        state.clones += 1;
        state.working_copies.insert(
            dest.to_path_buf(),
            ClonedCopy {
                gist_id: document.id.clone(),
                committed: gist.files.keys().cloned().collect(),
            },
        );
        Ok(WorkingCopy::new(dest))
    }

    fn commit_and_push(
        &self,
        working_copy: &WorkingCopy,
        _message: &str,
    ) -> Result<String, PublishError> {
        self.record("commit_and_push");

        let mut present = BTreeMap::new();
        for entry in fs::read_dir(working_copy.root())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                present.insert(name, fs::read(entry.path())?);
            }
        }

        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let copy = state
            .working_copies
            .get_mut(working_copy.root())
            .ok_or_else(|| PublishError::CommandFailed {
                command: "git push".to_string(),
                stderr: "fatal: not a git repository".to_string(),
            })?;

        let new_files: Vec<String> = present
            .keys()
            .filter(|name| !copy.committed.contains(*name))
            .cloned()
            .collect();
        if !new_files.is_empty() {
            copy.committed.extend(new_files.iter().cloned());
            state.commits.push(new_files);
        }

        state.push_attempts += 1;
        match state.push_script.pop_front().unwrap_or(PushOutcome::Ok) {
            PushOutcome::Ok => {}
            PushOutcome::Transient => {
                return Err(PublishError::TransientTransport {
                    command: "git push".to_string(),
                    message: "fatal: unable to access: Could not resolve host".to_string(),
                })
            }
            PushOutcome::Auth => {
                return Err(PublishError::RemoteAuth {
                    command: "git push".to_string(),
                    message: "remote: Permission denied".to_string(),
                })
            }
        }

        if let Some(gist) = state.gists.get_mut(&copy.gist_id) {
            gist.files.extend(present);
        }
        Ok(format!("{:040x}", state.commits.len()))
    }

    fn replace_document(
        &self,
        document: &HostedDocument,
        file_name: &str,
        content: &str,
    ) -> Result<(), PublishError> {
        self.record("replace_document");
        let mut state = self.state.borrow_mut();
        if state.fail_replace {
            return Err(PublishError::TransientTransport {
                command: format!("gh gist edit {}", document.id),
                message: "HTTP 502: Bad Gateway".to_string(),
            });
        }

        state
            .replaced
            .push((file_name.to_string(), content.to_string()));
        let gist = state
            .gists
            .get_mut(&document.id)
            .ok_or_else(|| PublishError::CommandFailed {
                command: format!("gh gist edit {}", document.id),
                stderr: "HTTP 404: Not Found".to_string(),
            })?;
        gist.files
            .insert(file_name.to_string(), content.as_bytes().to_vec());
        Ok(())
    }
}

/// Browser fake that records opened URLs.
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    opened: RefCell<Vec<String>>,
    fail: bool,
}

impl RecordingBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// A browser whose every `open` fails.
    pub fn failing() -> Self {
        Self {
            opened: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl Browser for RecordingBrowser {
    fn open(&self, url: &str) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::ToolMissing {
                tool: "xdg-open".to_string(),
            });
        }
        self.opened.borrow_mut().push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create(host: &MemoryHost) -> HostedDocument {
        host.create_document(&NewDocument {
            file_name: "notes.md",
            content: "# Notes",
            public: true,
            description: Some("demo"),
        })
        .unwrap()
    }

    #[test]
    fn test_create_records_metadata() {
        let host = MemoryHost::new("octo");
        let doc = create(&host);

        assert_eq!(doc.owner, "octo");
        assert_eq!(doc.url, format!("https://gist.github.com/octo/{}", doc.id));
        assert_eq!(host.is_public(&doc.id), Some(true));
        assert_eq!(host.description(&doc.id).as_deref(), Some("demo"));
        assert_eq!(host.file_names(&doc.id), vec!["notes.md"]);
    }

    #[test]
    fn test_clone_writes_existing_files() {
        let host = MemoryHost::new("octo");
        let doc = create(&host);
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("gist");

        let copy = host.clone_backing_repository(&doc, &dest).unwrap();

        assert_eq!(fs::read_to_string(copy.root().join("notes.md")).unwrap(), "# Notes");
        assert_eq!(host.clone_count(), 1);
    }

    #[test]
    fn test_failed_push_keeps_commit_and_retry_does_not_duplicate() {
        let host = MemoryHost::new("octo");
        let doc = create(&host);
        let temp = TempDir::new().unwrap();
        let copy = host
            .clone_backing_repository(&doc, &temp.path().join("gist"))
            .unwrap();
        fs::write(copy.root().join("_a.png"), b"png").unwrap();
        host.script_pushes([PushOutcome::Transient]);

        let err = host.commit_and_push(&copy, "Add images").unwrap_err();
        assert!(err.is_transient());
        assert_eq!(host.file(&doc.id, "_a.png"), None);

        host.commit_and_push(&copy, "Add images").unwrap();
        assert_eq!(host.commits(), vec![vec!["_a.png".to_string()]]);
        assert_eq!(host.push_attempts(), 2);
        assert_eq!(host.file(&doc.id, "_a.png").unwrap(), b"png");
    }

    #[test]
    fn test_push_without_clone_fails() {
        let host = MemoryHost::new("octo");
        let temp = TempDir::new().unwrap();
        let err = host
            .commit_and_push(&WorkingCopy::new(temp.path()), "Add images")
            .unwrap_err();
        assert!(matches!(err, PublishError::CommandFailed { .. }));
    }

    #[test]
    fn test_replace_overwrites_file() {
        let host = MemoryHost::new("octo");
        let doc = create(&host);

        host.replace_document(&doc, "notes.md", "# Rewritten").unwrap();

        assert_eq!(host.file(&doc.id, "notes.md").unwrap(), b"# Rewritten");
        assert_eq!(
            host.replaced(),
            vec![("notes.md".to_string(), "# Rewritten".to_string())]
        );
    }

    #[test]
    fn test_not_ready_is_auth_error() {
        let host = MemoryHost::new("octo");
        host.set_not_ready("not logged in");
        assert!(host.check_ready().unwrap_err().is_auth());
    }

    #[test]
    fn test_recording_browser() {
        let browser = RecordingBrowser::new();
        browser.open("https://gist.github.com/octo/1").unwrap();
        assert_eq!(browser.opened(), vec!["https://gist.github.com/octo/1"]);

        assert!(RecordingBrowser::failing().open("x").is_err());
    }
}
