//! The bootstrap pipeline: a fixed, ordered stage list interpreted by one
//! driver loop.
//!
//! # Stage table
//!
//! | # | stage            | severity | action                                       |
//! |---|------------------|----------|----------------------------------------------|
//! | 1 | dependencies     | fatal    | verify/acquire interpreter and tunnel client |
//! | 2 | driver-package   | fatal    | unpack driver archive, launch control panel  |
//! | 3 | python-packages  | fatal    | install the server's package manifest        |
//! | 4 | display-cleanup  | fatal    | remove stale virtual display nodes           |
//! | 5 | tunnel           | warning  | two reverse port mappings to the phone       |
//! | 6 | deploy-app       | warning  | install the client app package               |
//! | 7 | server           | fatal    | blocking streaming-server launch             |
//!
//! Stages run strictly in order, one at a time.  A fatal status halts the
//! run immediately; a warning is logged and the run continues.  The run is
//! complete when the server process exits (stage 7 blocks until then).
//!
//! There is no rollback and no retry: a mapping established before a later
//! fatal stage stays established, and recovery is a full manual re-run.

use std::path::PathBuf;

use tracing::{error, info, warn};

use sidecast_core::{RunReport, Severity, StageOutcome, StageStatus};

use crate::infrastructure::deploy::{AppDeployer, DeploymentTarget};
use crate::infrastructure::display::DeviceLifecycleManager;
use crate::infrastructure::extract::{Extraction, PackageExtractor};
use crate::infrastructure::process::{CommandRunner, ToolSearchPath};
use crate::infrastructure::resolver::{DependencyDescriptor, DependencyResolver};
use crate::infrastructure::storage::config::SetupConfig;
use crate::infrastructure::tunnel::TunnelProvisioner;
use crate::infrastructure::SetupError;

/// Which of the fixed stage actions a descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Dependencies,
    DriverPackage,
    PythonPackages,
    DisplayCleanup,
    Tunnel,
    DeployApp,
    Server,
}

/// One entry of the fixed stage list: name, declared severity, action.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub name: &'static str,
    pub severity: Severity,
    pub kind: StageKind,
}

/// The fixed, totally ordered stage list.
pub fn stage_plan() -> Vec<StageSpec> {
    vec![
        StageSpec {
            name: "dependencies",
            severity: Severity::Fatal,
            kind: StageKind::Dependencies,
        },
        StageSpec {
            name: "driver-package",
            severity: Severity::Fatal,
            kind: StageKind::DriverPackage,
        },
        StageSpec {
            name: "python-packages",
            severity: Severity::Fatal,
            kind: StageKind::PythonPackages,
        },
        StageSpec {
            name: "display-cleanup",
            severity: Severity::Fatal,
            kind: StageKind::DisplayCleanup,
        },
        StageSpec {
            name: "tunnel",
            severity: Severity::Warning,
            kind: StageKind::Tunnel,
        },
        StageSpec {
            name: "deploy-app",
            severity: Severity::Warning,
            kind: StageKind::DeployApp,
        },
        StageSpec {
            name: "server",
            severity: Severity::Fatal,
            kind: StageKind::Server,
        },
    ]
}

/// Sequences the infrastructure components as ordered, blocking stages.
///
/// One instance per invocation; the only state shared across stages is the
/// tool-search list (extended when a dependency is acquired locally) — it is
/// computed once and reused, never re-derived mid-run.
pub struct BootstrapPipeline<'r> {
    runner: &'r dyn CommandRunner,
    config: SetupConfig,
    workdir: PathBuf,
    search: ToolSearchPath,
    elevated: bool,
}

impl<'r> BootstrapPipeline<'r> {
    pub fn new(
        runner: &'r dyn CommandRunner,
        config: SetupConfig,
        workdir: PathBuf,
        search: ToolSearchPath,
        elevated: bool,
    ) -> Self {
        Self {
            runner,
            config,
            workdir,
            search,
            elevated,
        }
    }

    /// Runs the full bootstrap: every stage in order, halting on the first
    /// fatal status.
    pub async fn run(&mut self) -> RunReport {
        let mut report = RunReport::new();
        for spec in stage_plan() {
            info!(stage = spec.name, "stage starting");
            let status: StageStatus = match self.execute(spec.kind).await {
                Ok(outcome) => outcome.into(),
                Err(err) => spec.severity.classify_failure(err.to_string()),
            };
            match &status {
                StageStatus::Pass => info!(stage = spec.name, "stage passed"),
                StageStatus::Warning(msg) => {
                    warn!(stage = spec.name, detail = %msg, "stage completed with warning");
                }
                StageStatus::Fatal(msg) => {
                    error!(stage = spec.name, detail = %msg, "stage failed — halting");
                }
            }
            let halt = status.halts_run();
            report.record(spec.name, status);
            if halt {
                break;
            }
        }
        report
    }

    /// Teardown: the device-removal phase alone, reported with the same
    /// vocabulary as a pipeline run.
    pub async fn cleanup(&self) -> RunReport {
        let mut report = RunReport::new();
        info!(stage = "display-cleanup", "stage starting");
        let status: StageStatus = match self.stage_display_cleanup().await {
            Ok(outcome) => outcome.into(),
            Err(err) => Severity::Fatal.classify_failure(err.to_string()),
        };
        match &status {
            StageStatus::Pass => info!(stage = "display-cleanup", "stage passed"),
            StageStatus::Warning(msg) => {
                warn!(stage = "display-cleanup", detail = %msg, "stage completed with warning");
            }
            StageStatus::Fatal(msg) => {
                error!(stage = "display-cleanup", detail = %msg, "stage failed");
            }
        }
        report.record("display-cleanup", status);
        report
    }

    async fn execute(&mut self, kind: StageKind) -> Result<StageOutcome, SetupError> {
        match kind {
            StageKind::Dependencies => self.stage_dependencies().await,
            StageKind::DriverPackage => self.stage_driver_package().await,
            StageKind::PythonPackages => self.stage_python_packages().await,
            StageKind::DisplayCleanup => self.stage_display_cleanup().await,
            StageKind::Tunnel => self.stage_tunnel().await,
            StageKind::DeployApp => self.stage_deploy_app().await,
            StageKind::Server => self.stage_server().await,
        }
    }

    // ── Stage actions ─────────────────────────────────────────────────────────

    /// The static dependency table for this run.
    fn dependency_table(&self) -> Vec<DependencyDescriptor> {
        let deps = &self.config.dependencies;
        vec![
            DependencyDescriptor {
                name: deps.interpreter.clone(),
                probe_args: vec!["--version".to_string()],
                bundled_archive: None,
                extract_dir: None,
                severity_if_missing: Severity::Fatal,
                remediation: "install Python 3 and make sure it is on PATH".to_string(),
            },
            DependencyDescriptor {
                name: deps.tunnel_client.clone(),
                probe_args: vec!["version".to_string()],
                bundled_archive: Some(self.workdir.join(&deps.platform_tools_archive)),
                extract_dir: Some(self.workdir.join(&deps.platform_tools_dir)),
                severity_if_missing: Severity::Fatal,
                remediation: format!(
                    "install Android platform-tools, or place {} next to this binary",
                    deps.platform_tools_archive
                ),
            },
        ]
    }

    async fn stage_dependencies(&mut self) -> Result<StageOutcome, SetupError> {
        let resolver = DependencyResolver::new(self.runner);
        let mut notes = Vec::new();
        for desc in self.dependency_table() {
            if let StageOutcome::Warning(note) = resolver.ensure(&desc, &mut self.search).await? {
                notes.push(note);
            }
        }
        if notes.is_empty() {
            Ok(StageOutcome::Pass)
        } else {
            Ok(StageOutcome::Warning(notes.join("; ")))
        }
    }

    async fn stage_driver_package(&self) -> Result<StageOutcome, SetupError> {
        let driver = &self.config.driver;
        let archive = self.workdir.join(&driver.archive);
        if !archive.is_file() {
            return Ok(StageOutcome::Warning(format!(
                "no bundled driver package at {} — skipping extraction",
                archive.display()
            )));
        }

        let target = self.workdir.join(&driver.install_dir);
        match PackageExtractor.extract(&archive, &target)? {
            Extraction::AlreadyPresent => {
                info!(dir = %target.display(), "driver package already unpacked");
                Ok(StageOutcome::Pass)
            }
            Extraction::Unpacked => {
                let manager = DeviceLifecycleManager::new(self.runner, self.elevated);
                Ok(manager
                    .launch_control_panel(&target, &driver.control_panel)
                    .await)
            }
        }
    }

    async fn stage_python_packages(&self) -> Result<StageOutcome, SetupError> {
        let deps = &self.config.dependencies;
        let manifest = self.workdir.join(&deps.manifest);
        if !manifest.is_file() {
            return Ok(StageOutcome::Warning(format!(
                "{} not found — skipping package installation",
                manifest.display()
            )));
        }

        let interpreter = self.resolve_required(&deps.interpreter)?;
        let args = vec![
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "-r".to_string(),
            manifest.display().to_string(),
        ];
        let out = self.runner.run(&interpreter, &args).await?;
        if out.success() {
            Ok(StageOutcome::Pass)
        } else {
            Err(SetupError::CommandFailed {
                program: "pip".to_string(),
                code: out.code,
            })
        }
    }

    async fn stage_display_cleanup(&self) -> Result<StageOutcome, SetupError> {
        DeviceLifecycleManager::new(self.runner, self.elevated)
            .remove_virtual_displays(&self.config.driver, &self.search)
            .await
    }

    async fn stage_tunnel(&self) -> Result<StageOutcome, SetupError> {
        let tunnel_client = self.resolve_required(&self.config.dependencies.tunnel_client)?;
        TunnelProvisioner::new(self.runner)
            .establish(&tunnel_client, &self.config.tunnel.mappings())
            .await
    }

    async fn stage_deploy_app(&self) -> Result<StageOutcome, SetupError> {
        let tunnel_client = self.resolve_required(&self.config.dependencies.tunnel_client)?;
        let target = DeploymentTarget {
            package_path: self.workdir.join(&self.config.app.package),
            replace_existing: true,
        };
        AppDeployer::new(self.runner)
            .deploy(&tunnel_client, &target)
            .await
    }

    async fn stage_server(&self) -> Result<StageOutcome, SetupError> {
        let server = &self.config.server;
        let launch = server.launch_config();
        launch.validate()?;

        let interpreter = self.resolve_required(&server.command)?;
        let mut args = vec![self.workdir.join(&server.script).display().to_string()];
        args.extend(launch.to_args());

        info!(
            fps = launch.fps,
            display = launch.display_index,
            quality = launch.quality,
            "launching streaming server — the run completes when it exits"
        );
        let code = self.runner.run_foreground(&interpreter, &args).await?;
        if code == 0 {
            Ok(StageOutcome::Pass)
        } else {
            Err(SetupError::CommandFailed {
                program: server.script.clone(),
                code,
            })
        }
    }

    /// Resolves a tool that earlier stages guaranteed; failing here means the
    /// environment changed mid-run.
    fn resolve_required(&self, name: &str) -> Result<PathBuf, SetupError> {
        self.search.resolve(name).ok_or_else(|| {
            SetupError::ToolMissing(format!("{name} is no longer resolvable on the search path"))
        })
    }
}
