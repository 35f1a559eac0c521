//! Run report: the ordered, append-only record of every executed stage.

use super::StageStatus;

/// A single stage's name and terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: String,
    pub status: StageStatus,
}

/// Ordered record of the stages a run executed.
///
/// The report carries the process exit-code contract: `0` on full success or
/// warning-only completion, `1` as soon as any stage recorded a fatal status.
/// Stages after a fatal one are never recorded because the driver loop halts
/// before executing them.
#[derive(Debug, Default)]
pub struct RunReport {
    stages: Vec<StageReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage result.
    pub fn record(&mut self, name: &str, status: StageStatus) {
        self.stages.push(StageReport {
            name: name.to_string(),
            status,
        });
    }

    /// All recorded stages, in execution order.
    pub fn stages(&self) -> &[StageReport] {
        &self.stages
    }

    /// The fatal stage, if the run was halted by one.
    pub fn fatal(&self) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.status.halts_run())
    }

    /// All stages that recorded a warning, in execution order.
    pub fn warnings(&self) -> Vec<&StageReport> {
        self.stages
            .iter()
            .filter(|s| matches!(s.status, StageStatus::Warning(_)))
            .collect()
    }

    /// `true` when a stage with the given name was executed (pass or warning).
    pub fn executed(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name == name)
    }

    /// Process exit code: 0 on success or warning-only completion, 1 on any
    /// fatal stage.
    pub fn exit_code(&self) -> i32 {
        if self.fatal().is_some() {
            1
        } else {
            0
        }
    }
}
