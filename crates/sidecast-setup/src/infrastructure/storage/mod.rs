//! File-system storage for the setup orchestrator.
//!
//! Currently just configuration loading; the pipeline itself persists no
//! state between runs.

pub mod config;
