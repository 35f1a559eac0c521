//! # sidecast-core
//!
//! Shared library for Sidecast containing the bootstrap stage model, the
//! virtual-display device matching logic, and the streaming-server launch
//! configuration.
//!
//! This crate is used by the setup binary and by its integration tests.
//! It has zero dependencies on OS APIs, subprocesses, or the file system.
//!
//! # Overview
//!
//! Sidecast turns a phone into a second monitor.  Getting there takes a
//! handful of privileged, failure-prone steps (driver nodes, reverse port
//! tunnels, app deployment) that are orchestrated as a fixed sequence of
//! stages.  This crate defines the pure pieces of that machinery:
//!
//! - **`stage`** – How a stage's result is classified.  Every stage declares
//!   a failure severity up front; the classification of an outcome through
//!   that severity (pass / warning / fatal) and the accumulated run report
//!   live here.
//!
//! - **`device`** – The virtual-display device model.  Enumeration output
//!   from the device-management tool is parsed into [`DeviceRecord`]s, and
//!   two interchangeable matcher predicates decide which hardware nodes a
//!   removal pass targets.
//!
//! - **`launch`** – The streaming server's launch configuration and the
//!   derivation of its fixed command-line argument set.

pub mod device;
pub mod launch;
pub mod stage;

pub use device::matcher::{removal_plan, DeviceMatcher, HardwareIdGlob, NameContains};
pub use device::{parse_device_listing, DeviceRecord, LISTING_DELIMITER};
pub use launch::{LaunchError, ServerLaunchConfig, TransportMode};
pub use stage::report::{RunReport, StageReport};
pub use stage::{Severity, StageOutcome, StageStatus};
