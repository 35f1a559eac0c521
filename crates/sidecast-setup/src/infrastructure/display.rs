//! Virtual-display device lifecycle: node removal and install-side helpers.
//!
//! # Removal
//!
//! Stale virtual-display nodes from previous runs confuse the streaming
//! server's display indexing, so the orchestrator clears them before
//! launching.  The pass degrades in fixed steps:
//!
//! 1. **Tool discovery** — a copy of the device-management tool in the
//!    working directory is preferred over one on the system search path
//!    (the search list puts the working directory first).  Neither found →
//!    the whole phase becomes a single warning and the run continues.
//! 2. **Elevation** — device-node modification needs administrative
//!    privileges.  Not elevated → fatal, before any removal command is
//!    issued.
//! 3. **Strategy selection** — enumeration (`find *`) is preferred: its
//!    output is parsed into records and filtered by display-name substring.
//!    If the tool cannot enumerate, the fixed hardware-id pattern list is
//!    handed to the tool directly, one unconditional removal call per
//!    pattern.
//!
//! Removing an already-absent node is success-with-zero-matches, never an
//! error: in pattern mode a non-zero exit means "nothing matched", and in
//! enumerate mode an empty plan is reported as an informational pass.
//!
//! # Install side
//!
//! After the driver package is unpacked, the bundled control-panel
//! executable (a convenience UI) is launched as a detached process.  Its
//! absence is a warning only — the driver works without it.

use std::path::Path;

use tracing::{debug, info, warn};

use sidecast_core::{
    parse_device_listing, removal_plan, DeviceMatcher, DeviceRecord, HardwareIdGlob, NameContains,
    StageOutcome,
};

use super::process::{CommandRunner, ToolSearchPath};
use super::storage::config::DriverConfig;
use super::SetupError;

/// Returns `true` when the current process runs with administrative
/// privileges.
pub fn current_process_is_elevated() -> bool {
    #[cfg(unix)]
    {
        // Device-node modification requires root.
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(target_os = "windows")]
    {
        unsafe { windows::Win32::UI::Shell::IsUserAnAdmin().as_bool() }
    }

    #[cfg(not(any(unix, target_os = "windows")))]
    {
        false
    }
}

/// Discovers and removes virtual-display hardware nodes, and launches the
/// driver's bundled control panel after installation.
pub struct DeviceLifecycleManager<'a> {
    runner: &'a dyn CommandRunner,
    elevated: bool,
}

impl<'a> DeviceLifecycleManager<'a> {
    /// `elevated` is probed once by the caller (see
    /// [`current_process_is_elevated`]) so tests can exercise both sides.
    pub fn new(runner: &'a dyn CommandRunner, elevated: bool) -> Self {
        Self { runner, elevated }
    }

    /// The whole removal phase: tool discovery, elevation check, strategy
    /// selection, removal calls.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Privilege`] when a tool is present but the
    /// process is not elevated, and [`SetupError::Command`] when the tool
    /// disappears mid-pass.
    pub async fn remove_virtual_displays(
        &self,
        cfg: &DriverConfig,
        search: &ToolSearchPath,
    ) -> Result<StageOutcome, SetupError> {
        let Some(tool) = search.resolve(&cfg.tool) else {
            return Ok(StageOutcome::Warning(format!(
                "{} not found — cannot auto-remove the virtual display driver; \
                 remove \"{}\" devices manually from Device Manager",
                cfg.tool, cfg.display_name_contains
            )));
        };
        debug!(tool = %tool.display(), "device-management tool resolved");

        if !self.elevated {
            return Err(SetupError::Privilege(
                "removing virtual display nodes requires administrative privileges; \
                 re-run from an elevated prompt"
                    .to_string(),
            ));
        }

        match self.enumerate(&tool).await {
            Ok(devices) => {
                let matcher = NameContains::new(&cfg.display_name_contains);
                self.remove_matching(&tool, &devices, &matcher).await
            }
            Err(err) => {
                warn!(%err, "device enumeration unavailable — falling back to pattern removal");
                let matcher = HardwareIdGlob::new(cfg.removal_patterns.iter().cloned());
                self.remove_patterns(&tool, &matcher).await
            }
        }
    }

    /// One `find *` pass, parsed into transient records.
    async fn enumerate(&self, tool: &Path) -> Result<Vec<DeviceRecord>, SetupError> {
        let out = self
            .runner
            .run(tool, &["find".to_string(), "*".to_string()])
            .await?;
        if !out.success() {
            return Err(SetupError::CommandFailed {
                program: tool.display().to_string(),
                code: out.code,
            });
        }
        Ok(parse_device_listing(&out.stdout))
    }

    /// Enumerate-then-match removal: one call per device the matcher selects.
    async fn remove_matching(
        &self,
        tool: &Path,
        devices: &[DeviceRecord],
        matcher: &dyn DeviceMatcher,
    ) -> Result<StageOutcome, SetupError> {
        let plan = removal_plan(devices, matcher);
        if plan.is_empty() {
            info!(
                "no devices with {} among {} enumerated — nothing to remove",
                matcher.describe(),
                devices.len()
            );
            return Ok(StageOutcome::Pass);
        }

        let mut failed = 0usize;
        for id in &plan {
            let out = self
                .runner
                .run(tool, &["remove".to_string(), id.clone()])
                .await?;
            if out.success() {
                info!(device = %id, "virtual display node removed");
            } else {
                warn!(device = %id, code = out.code, "removal call failed");
                failed += 1;
            }
        }

        if failed == 0 {
            Ok(StageOutcome::Pass)
        } else {
            Ok(StageOutcome::Warning(format!(
                "{failed} of {} removal calls failed; the nodes may already be gone",
                plan.len()
            )))
        }
    }

    /// Pattern removal: one unconditional call per configured pattern.
    async fn remove_patterns(
        &self,
        tool: &Path,
        matcher: &HardwareIdGlob,
    ) -> Result<StageOutcome, SetupError> {
        for pattern in matcher.patterns() {
            let out = self
                .runner
                .run(tool, &["remove".to_string(), pattern.clone()])
                .await?;
            // The tool exits non-zero when a pattern matches no device;
            // that is success-with-zero-matches, not a failure.
            if out.success() {
                info!(pattern = %pattern, "removal pattern applied");
            } else {
                debug!(pattern = %pattern, code = out.code, "pattern matched no devices");
            }
        }
        Ok(StageOutcome::Pass)
    }

    /// Install side: launch the driver's bundled control panel, detached.
    pub async fn launch_control_panel(&self, install_dir: &Path, exe_name: &str) -> StageOutcome {
        let panel = install_dir.join(exe_name);
        if !panel.is_file() {
            return StageOutcome::Warning(format!(
                "control panel {} not bundled — the driver works without it",
                panel.display()
            ));
        }
        match self.runner.spawn_detached(&panel, &[]).await {
            Ok(()) => {
                info!(panel = %panel.display(), "driver control panel launched");
                StageOutcome::Pass
            }
            Err(err) => StageOutcome::Warning(format!(
                "could not launch driver control panel: {err}"
            )),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
