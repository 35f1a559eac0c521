//! Client application deployment onto the attached phone.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use sidecast_core::StageOutcome;

use super::process::CommandRunner;
use super::SetupError;

/// What gets installed, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Packaged client application in the working directory.
    pub package_path: PathBuf,
    /// Replace an already-installed copy instead of failing (`install -r`).
    pub replace_existing: bool,
}

/// Installs the packaged client application on the attached device.
pub struct AppDeployer<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> AppDeployer<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Installs the package if it is bundled; every failure mode degrades
    /// to a warning.
    ///
    /// # Errors
    ///
    /// None in practice; the signature matches the other stage actions.
    pub async fn deploy(
        &self,
        tunnel_client: &Path,
        target: &DeploymentTarget,
    ) -> Result<StageOutcome, SetupError> {
        if !target.package_path.is_file() {
            return Ok(StageOutcome::Warning(format!(
                "client app package {} not found — skipping install",
                target.package_path.display()
            )));
        }

        let mut args = vec!["install".to_string()];
        if target.replace_existing {
            args.push("-r".to_string());
        }
        args.push(target.package_path.display().to_string());

        match self.runner.run(tunnel_client, &args).await {
            Ok(out) if out.success() => {
                info!(
                    package = %target.package_path.display(),
                    "client app installed on the attached device"
                );
                Ok(StageOutcome::Pass)
            }
            Ok(out) => {
                warn!(code = out.code, "client app install failed");
                Ok(StageOutcome::Warning(format!(
                    "client app install exited with status {} — check that the phone is \
                     attached and USB debugging is authorized",
                    out.code
                )))
            }
            Err(err) => Ok(StageOutcome::Warning(format!(
                "client app install could not run: {err}"
            ))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
