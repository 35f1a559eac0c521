//! Stage outcome model for the bootstrap pipeline.
//!
//! Every pipeline stage resolves to one of three terminal statuses: pass,
//! warning, or fatal.  The mapping from a stage *failure* to a status goes
//! through the stage's **declared severity** — a fixed table known before the
//! run starts, never decided by the content of the failure:
//!
//! ```text
//! action result          declared severity      recorded status
//! ─────────────          ─────────────────      ───────────────
//! Ok(Pass)               (ignored)              Pass
//! Ok(Warning(msg))       (ignored)              Warning(msg)
//! Err(e)                 Fatal                  Fatal(e)    → run halts
//! Err(e)                 Warning                Warning(e)  → run continues
//! ```
//!
//! A fatal status halts all subsequent stages; a warning never does.  Soft
//! degraded outcomes (for example "device tool not found, remove the driver
//! manually") are reported by the stage itself as [`StageOutcome::Warning`]
//! without involving severity classification at all.
//!
//! No structured error crosses a stage boundary: the pipeline driver only
//! ever sees the three-valued [`StageStatus`].

pub mod report;

/// Failure severity declared statically for each pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A failure of this stage halts the run immediately.
    Fatal,
    /// A failure of this stage is logged and the run continues.
    Warning,
}

/// The soft result a stage action reports when it does not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage did what it set out to do.
    Pass,
    /// The stage completed in a degraded way; the run continues regardless
    /// of the stage's declared severity.
    Warning(String),
}

/// Terminal status of an executed stage, as recorded in the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Pass,
    Warning(String),
    Fatal(String),
}

impl Severity {
    /// Classifies a stage failure through this declared severity.
    pub fn classify_failure(self, message: String) -> StageStatus {
        match self {
            Severity::Fatal => StageStatus::Fatal(message),
            Severity::Warning => StageStatus::Warning(message),
        }
    }
}

impl From<StageOutcome> for StageStatus {
    fn from(outcome: StageOutcome) -> Self {
        match outcome {
            StageOutcome::Pass => StageStatus::Pass,
            StageOutcome::Warning(message) => StageStatus::Warning(message),
        }
    }
}

impl StageStatus {
    /// `true` when the pipeline must not execute any further stage.
    pub fn halts_run(&self) -> bool {
        matches!(self, StageStatus::Fatal(_))
    }

    /// The attached message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            StageStatus::Pass => None,
            StageStatus::Warning(m) | StageStatus::Fatal(m) => Some(m),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
