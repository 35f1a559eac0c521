//! Scripted command runner for tests.
//!
//! Lets pipeline tests run without any external tools installed: responses
//! are scripted per program, every invocation is recorded, and a program
//! with no matching script behaves like a missing tool (spawn fails with
//! `NotFound`).

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CommandError, CommandOutput, CommandRunner};

/// How a recorded invocation was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Output-capturing run.
    Capture,
    /// Blocking foreground run with inherited stdio.
    Foreground,
    /// Fire-and-forget detached spawn.
    Detached,
}

/// One invocation observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Full program path or bare name, exactly as invoked.
    pub program: String,
    pub args: Vec<String>,
    pub mode: CallMode,
}

#[derive(Debug, Clone)]
struct MockRule {
    program: String,
    args_prefix: Vec<String>,
    code: i32,
    stdout: String,
}

/// A mock implementation of [`CommandRunner`] with scripted responses.
#[derive(Default, Clone)]
pub struct MockCommandRunner {
    rules: Arc<Mutex<Vec<MockRule>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `code`/`stdout` for invocations of `program` whose arguments
    /// start with `args_prefix`.  Rules are matched in insertion order, so
    /// register specific prefixes before catch-alls.  `program` is matched
    /// against the invoked file name, extension and case ignored.
    pub fn script(&self, program: &str, args_prefix: &[&str], code: i32, stdout: &str) {
        self.rules.lock().expect("lock poisoned").push(MockRule {
            program: program.to_ascii_lowercase(),
            args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
            code,
            stdout: stdout.to_string(),
        });
    }

    /// Scripts exit 0 with empty output for any invocation of `program`.
    pub fn script_success(&self, program: &str) {
        self.script(program, &[], 0, "");
    }

    /// All invocations observed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Invocations of a specific program, matched by file name.
    pub fn calls_to(&self, program: &str) -> Vec<RecordedCall> {
        let wanted = program.to_ascii_lowercase();
        self.calls()
            .into_iter()
            .filter(|c| program_name(Path::new(&c.program)) == wanted)
            .collect()
    }

    fn record(&self, program: &Path, args: &[String], mode: CallMode) {
        self.calls.lock().expect("lock poisoned").push(RecordedCall {
            program: program.display().to_string(),
            args: args.to_vec(),
            mode,
        });
    }

    fn lookup(&self, program: &Path, args: &[String]) -> Option<(i32, String)> {
        let name = program_name(program);
        self.rules
            .lock()
            .expect("lock poisoned")
            .iter()
            .find(|rule| {
                rule.program == name
                    && args.len() >= rule.args_prefix.len()
                    && rule
                        .args_prefix
                        .iter()
                        .zip(args.iter())
                        .all(|(want, got)| want == got)
            })
            .map(|rule| (rule.code, rule.stdout.clone()))
    }

    fn not_found(program: &Path) -> CommandError {
        CommandError::Spawn {
            program: program.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no script registered"),
        }
    }
}

/// File name of the invoked program, lowercased, extension stripped.
fn program_name(program: &Path) -> String {
    program
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput, CommandError> {
        self.record(program, args, CallMode::Capture);
        match self.lookup(program, args) {
            Some((code, stdout)) => Ok(CommandOutput {
                code,
                stdout,
                stderr: String::new(),
            }),
            None => Err(Self::not_found(program)),
        }
    }

    async fn run_foreground(&self, program: &Path, args: &[String]) -> Result<i32, CommandError> {
        self.record(program, args, CallMode::Foreground);
        match self.lookup(program, args) {
            Some((code, _)) => Ok(code),
            None => Err(Self::not_found(program)),
        }
    }

    async fn spawn_detached(&self, program: &Path, args: &[String]) -> Result<(), CommandError> {
        self.record(program, args, CallMode::Detached);
        match self.lookup(program, args) {
            Some(_) => Ok(()),
            None => Err(Self::not_found(program)),
        }
    }
}
