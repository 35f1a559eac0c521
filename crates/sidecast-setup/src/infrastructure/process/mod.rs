//! Subprocess execution and tool resolution.
//!
//! Every external tool the orchestrator touches — the interpreter, the
//! tunnel client, the device-management tool, the streaming server — is
//! driven through the [`CommandRunner`] trait.  The production implementation
//! wraps `tokio::process::Command`; tests use
//! [`mock::MockCommandRunner`] to script exit statuses and record
//! invocations without any tools installed.
//!
//! All invocations are synchronous from the pipeline's point of view: the
//! caller awaits the child to completion before moving on.  There is no
//! retry and no concurrency between invocations.
//!
//! # Tool resolution
//!
//! Commands are resolved against a [`ToolSearchPath`]: an explicit, ordered
//! directory list built once per run.  The working directory always comes
//! first, so a tool dropped next to the orchestrator wins over a system-wide
//! install.  When a dependency is acquired into a local directory, that
//! directory is appended to the list for the remainder of the run — the
//! process environment (`PATH`) is never mutated.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

pub mod mock;

/// Error type for subprocess operations.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The child process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child started but could not be awaited.
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The user interrupted the run while this child was in the foreground.
    #[error("{program} was interrupted")]
    Interrupted { program: String },
}

impl CommandError {
    /// `true` when the underlying cause is the executable not being found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommandError::Spawn { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Captured result of a completed subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; `-1` when the child was terminated by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Trait abstracting subprocess execution.
///
/// The production implementation is [`SystemCommandRunner`]; tests use
/// [`mock::MockCommandRunner`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a command to completion, capturing stdout and stderr.
    async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput, CommandError>;

    /// Runs a command with inherited stdio, blocking until the child exits.
    ///
    /// A Ctrl-C while the child is running terminates the child and returns
    /// [`CommandError::Interrupted`].
    async fn run_foreground(&self, program: &Path, args: &[String]) -> Result<i32, CommandError>;

    /// Starts a child and deliberately does not wait for it.
    async fn spawn_detached(&self, program: &Path, args: &[String]) -> Result<(), CommandError>;
}

/// [`CommandRunner`] backed by real OS processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput, CommandError> {
        debug!(program = %program.display(), ?args, "running command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run_foreground(&self, program: &Path, args: &[String]) -> Result<i32, CommandError> {
        debug!(program = %program.display(), ?args, "running foreground command");
        let mut child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| CommandError::Wait {
                    program: program.display().to_string(),
                    source,
                })?;
                Ok(status.code().unwrap_or(-1))
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(program = %program.display(), "interrupt received — terminating child");
                let _ = child.kill().await;
                Err(CommandError::Interrupted {
                    program: program.display().to_string(),
                })
            }
        }
    }

    async fn spawn_detached(&self, program: &Path, args: &[String]) -> Result<(), CommandError> {
        debug!(program = %program.display(), ?args, "spawning detached command");
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.display().to_string(),
                source,
            })?;
        Ok(())
    }
}

// ── Tool resolution ───────────────────────────────────────────────────────────

/// Explicit, ordered list of directories tools are resolved against.
#[derive(Debug, Clone)]
pub struct ToolSearchPath {
    dirs: Vec<PathBuf>,
}

impl ToolSearchPath {
    /// Builds a search path from an explicit directory list, tried in order.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// The standard per-run search path: the working directory first, then
    /// every `PATH` entry.
    pub fn from_environment(workdir: &Path) -> Self {
        let mut dirs = vec![workdir.to_path_buf()];
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
        Self { dirs }
    }

    /// Appends a directory to the end of the search order.
    pub fn push_dir(&mut self, dir: PathBuf) {
        self.dirs.push(dir);
    }

    /// Resolves a tool name to the first matching executable file.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        for dir in &self.dirs {
            for candidate in candidate_names(name) {
                let path = dir.join(&candidate);
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }
}

#[cfg(windows)]
fn candidate_names(name: &str) -> Vec<String> {
    vec![
        format!("{name}.exe"),
        format!("{name}.bat"),
        format!("{name}.cmd"),
        name.to_string(),
    ]
}

#[cfg(not(windows))]
fn candidate_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
