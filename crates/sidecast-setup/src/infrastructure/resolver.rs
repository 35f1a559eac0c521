//! Dependency verification and acquisition.
//!
//! For each declared dependency the resolver runs the detection probe; if
//! the probe fails it falls back to the bundled archive (when one is
//! declared), appends the unpacked directory to the run's tool-search list,
//! and re-runs the probe to confirm.  The search-list extension is the only
//! side effect — the process environment is never touched.

use std::path::PathBuf;

use tracing::{info, warn};

use sidecast_core::{Severity, StageOutcome};

use super::extract::PackageExtractor;
use super::process::{CommandRunner, ToolSearchPath};
use super::SetupError;

/// Static description of one required external tool.
#[derive(Debug, Clone)]
pub struct DependencyDescriptor {
    /// Tool name, resolved through the search list.
    pub name: String,
    /// Arguments of the cheap detection probe (e.g. `--version`).
    pub probe_args: Vec<String>,
    /// Bundled archive to fall back to; `None` means the dependency cannot
    /// be acquired locally.
    pub bundled_archive: Option<PathBuf>,
    /// Directory the bundled archive unpacks into; appended to the search
    /// list on acquisition.  Required when `bundled_archive` is set.
    pub extract_dir: Option<PathBuf>,
    /// How a definitively missing dependency is classified.
    pub severity_if_missing: Severity,
    /// Actionable hint shown when the dependency cannot be satisfied.
    pub remediation: String,
}

/// Verifies and, where possible, acquires the declared dependencies.
pub struct DependencyResolver<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Ensures one dependency is usable, acquiring it from its bundled
    /// archive if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::ToolMissing`] when the dependency (or its
    /// bundled source) is absent and its severity is fatal, and
    /// [`SetupError::Extract`] when a present bundled archive fails to
    /// unpack.
    pub async fn ensure(
        &self,
        desc: &DependencyDescriptor,
        search: &mut ToolSearchPath,
    ) -> Result<StageOutcome, SetupError> {
        if self.probe(desc, search).await {
            info!(dependency = %desc.name, "dependency present");
            return Ok(StageOutcome::Pass);
        }

        let (Some(archive), Some(target)) = (&desc.bundled_archive, &desc.extract_dir) else {
            return self.missing(desc);
        };
        if !archive.is_file() {
            warn!(
                dependency = %desc.name,
                archive = %archive.display(),
                "probe failed and the bundled acquisition source is missing"
            );
            return self.missing(desc);
        }

        PackageExtractor.extract(archive, target)?;
        search.push_dir(target.clone());
        info!(
            dependency = %desc.name,
            dir = %target.display(),
            "acquired from bundled archive — tool search path extended for this run"
        );

        if self.probe(desc, search).await {
            Ok(StageOutcome::Pass)
        } else {
            self.missing(desc)
        }
    }

    /// Runs the detection probe through the current search list.
    async fn probe(&self, desc: &DependencyDescriptor, search: &ToolSearchPath) -> bool {
        let Some(path) = search.resolve(&desc.name) else {
            return false;
        };
        match self.runner.run(&path, &desc.probe_args).await {
            Ok(out) => out.success(),
            Err(_) => false,
        }
    }

    fn missing(&self, desc: &DependencyDescriptor) -> Result<StageOutcome, SetupError> {
        let message = format!("{} is not available — {}", desc.name, desc.remediation);
        match desc.severity_if_missing {
            Severity::Fatal => Err(SetupError::ToolMissing(message)),
            Severity::Warning => {
                warn!(dependency = %desc.name, "optional dependency missing");
                Ok(StageOutcome::Warning(message))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::mock::MockCommandRunner;
    use std::io::Write;
    use std::path::Path;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").expect("write tool stub");
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        for (name, body) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(body).expect("write entry");
        }
        writer.finish().expect("finish archive");
    }

    fn descriptor(name: &str) -> DependencyDescriptor {
        DependencyDescriptor {
            name: name.to_string(),
            probe_args: vec!["--version".to_string()],
            bundled_archive: None,
            extract_dir: None,
            severity_if_missing: Severity::Fatal,
            remediation: format!("install {name} and re-run"),
        }
    }

    #[tokio::test]
    async fn test_present_dependency_passes_on_first_probe() {
        // Arrange
        let bin = tempfile::tempdir().unwrap();
        touch(bin.path(), "python");
        let runner = MockCommandRunner::new();
        runner.script("python", &["--version"], 0, "Python 3.12.1");
        let mut search = ToolSearchPath::new(vec![bin.path().to_path_buf()]);

        // Act
        let outcome = DependencyResolver::new(&runner)
            .ensure(&descriptor("python"), &mut search)
            .await
            .expect("present dependency resolves");

        // Assert
        assert_eq!(outcome, StageOutcome::Pass);
        assert_eq!(runner.calls_to("python").len(), 1);
    }

    #[tokio::test]
    async fn test_missing_dependency_without_bundle_is_fatal() {
        let empty = tempfile::tempdir().unwrap();
        let runner = MockCommandRunner::new();
        let mut search = ToolSearchPath::new(vec![empty.path().to_path_buf()]);

        let err = DependencyResolver::new(&runner)
            .ensure(&descriptor("python"), &mut search)
            .await
            .expect_err("missing interpreter is fatal");

        assert!(matches!(err, SetupError::ToolMissing(_)));
        assert!(err.to_string().contains("install python"));
    }

    #[tokio::test]
    async fn test_acquisition_extracts_and_extends_search_path() {
        // Arrange: no adb anywhere, but a bundled platform-tools archive.
        let work = tempfile::tempdir().unwrap();
        let archive = work.path().join("platform-tools.zip");
        write_zip(&archive, &[("adb", b"stub")]);
        let tools_dir = work.path().join("platform-tools");

        let runner = MockCommandRunner::new();
        runner.script("adb", &["version"], 0, "Android Debug Bridge version 35");

        let mut desc = descriptor("adb");
        desc.probe_args = vec!["version".to_string()];
        desc.bundled_archive = Some(archive);
        desc.extract_dir = Some(tools_dir.clone());

        let mut search = ToolSearchPath::new(vec![work.path().to_path_buf()]);

        // Act
        let outcome = DependencyResolver::new(&runner)
            .ensure(&desc, &mut search)
            .await
            .expect("acquisition succeeds");

        // Assert: unpacked, probed through the extended list, and resolvable.
        assert_eq!(outcome, StageOutcome::Pass);
        assert!(tools_dir.join("adb").is_file());
        assert_eq!(search.resolve("adb"), Some(tools_dir.join("adb")));
    }

    #[tokio::test]
    async fn test_missing_bundled_archive_is_fatal() {
        let work = tempfile::tempdir().unwrap();
        let runner = MockCommandRunner::new();

        let mut desc = descriptor("adb");
        desc.bundled_archive = Some(work.path().join("platform-tools.zip"));
        desc.extract_dir = Some(work.path().join("platform-tools"));

        let mut search = ToolSearchPath::new(vec![work.path().to_path_buf()]);
        let err = DependencyResolver::new(&runner)
            .ensure(&desc, &mut search)
            .await
            .expect_err("missing bundled source is fatal");
        assert!(matches!(err, SetupError::ToolMissing(_)));
    }

    #[tokio::test]
    async fn test_failed_probe_after_acquisition_is_fatal() {
        // Arrange: the archive unpacks but the probe keeps exiting non-zero.
        let work = tempfile::tempdir().unwrap();
        let archive = work.path().join("platform-tools.zip");
        write_zip(&archive, &[("adb", b"stub")]);

        let runner = MockCommandRunner::new();
        runner.script("adb", &["version"], 1, "");

        let mut desc = descriptor("adb");
        desc.probe_args = vec!["version".to_string()];
        desc.bundled_archive = Some(archive);
        desc.extract_dir = Some(work.path().join("platform-tools"));

        let mut search = ToolSearchPath::new(vec![work.path().to_path_buf()]);
        let err = DependencyResolver::new(&runner)
            .ensure(&desc, &mut search)
            .await
            .expect_err("broken acquisition is fatal");
        assert!(matches!(err, SetupError::ToolMissing(_)));
    }

    #[tokio::test]
    async fn test_warning_severity_degrades_instead_of_failing() {
        let empty = tempfile::tempdir().unwrap();
        let runner = MockCommandRunner::new();
        let mut desc = descriptor("scrcpy");
        desc.severity_if_missing = Severity::Warning;

        let mut search = ToolSearchPath::new(vec![empty.path().to_path_buf()]);
        let outcome = DependencyResolver::new(&runner)
            .ensure(&desc, &mut search)
            .await
            .expect("warning severity never errors");
        assert!(matches!(outcome, StageOutcome::Warning(_)));
    }
}
