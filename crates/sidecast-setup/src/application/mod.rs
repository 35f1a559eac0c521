//! Application layer: the bootstrap/teardown use case.
//!
//! This layer orchestrates the infrastructure components to fulfil the two
//! user goals — "provision the rig and launch the server" and "tear the
//! driver back out" — without doing any I/O of its own beyond what the
//! injected [`crate::infrastructure::process::CommandRunner`] provides.
//!
//! The stage sequence, the per-stage severity table, and the driver loop
//! that interprets them live in [`bootstrap`].

pub mod bootstrap;

pub use bootstrap::{stage_plan, BootstrapPipeline, StageKind, StageSpec};
