//! Opening URLs with the platform's default handler.

use super::Browser;
use crate::errors::PublishError;
use std::process::{Command, Stdio};

/// Fire-and-forget launcher for the system browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), PublishError> {
        #[cfg(target_os = "macos")]
        let mut cmd = {
            let mut c = Command::new("open");
            c.arg(url);
            c
        };

        #[cfg(windows)]
        let mut cmd = {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", url]);
            c
        };

        #[cfg(all(unix, not(target_os = "macos")))]
        let mut cmd = {
            let mut c = Command::new("xdg-open");
            c.arg(url);
            c
        };

        let program = cmd.get_program().to_string_lossy().into_owned();
        tracing::debug!(url, program = %program, "opening browser");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => PublishError::ToolMissing { tool: program },
                _ => PublishError::Io(e),
            })?;
        Ok(())
    }
}
