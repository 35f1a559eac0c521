//! Infrastructure layer for the setup orchestrator.
//!
//! Contains the OS-facing adapters: subprocess execution and tool
//! resolution, archive extraction, the virtual-display device lifecycle,
//! tunnel provisioning, app deployment, and configuration storage.
//!
//! **Dependency rule**: this layer may depend on `sidecast_core`, but MUST
//! NOT be imported by the core crate.

use thiserror::Error;

pub mod deploy;
pub mod display;
pub mod extract;
pub mod process;
pub mod resolver;
pub mod storage;
pub mod tunnel;

/// Failure taxonomy shared by all stage actions.
///
/// These are the *hard* failures a stage can raise; the pipeline driver
/// classifies them through the stage's declared severity.  Soft conditions —
/// nothing matched, nothing bundled, already unpacked — are not errors and
/// are reported as stage outcomes instead.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A required tool or its bundled acquisition source is absent.
    #[error("{0}")]
    ToolMissing(String),

    /// A privileged operation was attempted without elevation.
    #[error("{0}")]
    Privilege(String),

    /// An external command ran but exited non-zero.
    #[error("{program} exited with status {code}")]
    CommandFailed { program: String, code: i32 },

    /// An external command could not be driven at all (spawn/wait/interrupt).
    #[error(transparent)]
    Command(#[from] process::CommandError),

    /// A bundled archive could not be unpacked.
    #[error(transparent)]
    Extract(#[from] extract::ExtractError),

    /// The derived server launch configuration is out of range.
    #[error("invalid launch configuration: {0}")]
    Launch(#[from] sidecast_core::LaunchError),
}
