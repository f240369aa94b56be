//! Bounded-time execution of external programs.
//!
//! Runs a program with captured output and kills it when it exceeds the
//! configured timeout. Failures are classified so callers can tell
//! credential rejections from network blips.

use crate::errors::PublishError;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Display form of the command line
    pub command: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external programs with a per-command timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `program` with `args`, optionally inside `working_dir`.
    ///
    /// A non-zero exit is not an error here; inspect
    /// [`CommandOutput::success`]. Errors are reserved for programs that
    /// cannot be started (`ToolMissing`, `Io`) or that time out (`Timeout`).
    pub fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput, PublishError> {
        let command_line = display_command(program, args);
        tracing::debug!(command = %command_line, "running external command");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PublishError::ToolMissing {
                tool: program.to_string(),
            },
            _ => PublishError::Io(e),
        })?;

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we poll for exit.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let timed_out = wait_with_timeout(&mut child, self.timeout)?;
        let status = child.wait()?;

        if timed_out {
            // Grandchildren may still hold the pipes open; leave the readers detached.
            tracing::warn!(command = %command_line, seconds = self.timeout.as_secs(), "command timed out");
            return Err(PublishError::Timeout {
                command: command_line,
                seconds: self.timeout.as_secs(),
            });
        }

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        let output = CommandOutput {
            exit_code: status.code(),
            stdout,
            stderr,
            command: command_line,
        };
        tracing::debug!(
            command = %output.command,
            exit_code = ?output.exit_code,
            "external command finished"
        );
        Ok(output)
    }

    /// Run and turn a non-zero exit into a classified error.
    pub fn run_checked(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput, PublishError> {
        let output = self.run(program, args, working_dir)?;
        if output.success() {
            Ok(output)
        } else {
            Err(classify_failure(&output))
        }
    }
}

fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for a child process; kill it and return `true` on timeout.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<bool, PublishError> {
    let start = Instant::now();

    loop {
        match child.try_wait()? {
            Some(_status) => return Ok(false),
            None => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    return Ok(true);
                }
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

/// Stderr fragments that mean credentials were rejected
const AUTH_MARKERS: &[&str] = &[
    "authentication failed",
    "bad credentials",
    "permission denied",
    "could not read username",
    "could not read password",
    "gh auth login",
    "not logged in",
    "http 401",
    "http 403",
    "error: 403",
    "requested url returned error: 401",
    "requested url returned error: 403",
];

/// Stderr fragments that mean the network hiccupped
const TRANSIENT_MARKERS: &[&str] = &[
    "could not resolve host",
    "connection reset",
    "connection refused",
    "connection timed out",
    "operation timed out",
    "timed out",
    "early eof",
    "the remote end hung up unexpectedly",
    "rpc failed",
    "unable to access",
    "http 500",
    "http 502",
    "http 503",
    "http 504",
    "requested url returned error: 500",
    "requested url returned error: 502",
    "requested url returned error: 503",
    "requested url returned error: 504",
    "tls handshake",
    "ssl_error",
];

/// Classify a failed command by its stderr.
///
/// Credential rejections win over transport hints because a retry can
/// never fix them.
pub fn classify_failure(output: &CommandOutput) -> PublishError {
    let stderr = output.stderr.trim().to_string();
    let haystack = stderr.to_lowercase();

    if AUTH_MARKERS.iter().any(|m| haystack.contains(m)) {
        PublishError::RemoteAuth {
            command: output.command.clone(),
            message: stderr,
        }
    } else if TRANSIENT_MARKERS.iter().any(|m| haystack.contains(m)) {
        PublishError::TransientTransport {
            command: output.command.clone(),
            message: stderr,
        }
    } else {
        PublishError::CommandFailed {
            command: output.command.clone(),
            stderr,
        }
    }
}
