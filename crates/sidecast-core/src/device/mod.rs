//! Virtual-display device records and enumeration parsing.
//!
//! The device-management tool lists hardware nodes one per line in the form
//! `<id><delimiter><displayName>`, e.g.
//!
//! ```text
//! ROOT\USBMMIDD\0000: USB Mobile Monitor Virtual Display
//! PCI\VEN_10DE&DEV_2484\0000: NVIDIA GeForce RTX 3070
//! ```
//!
//! Parsing rules are fixed:
//!
//! - each line is split on the **first** delimiter occurrence only, so a
//!   delimiter inside the display name stays in the name;
//! - surrounding whitespace is trimmed from both halves;
//! - lines without the delimiter, or with an empty id, are skipped.
//!
//! Ids are unique within one enumeration pass.  Records are transient: they
//! live for the duration of a single removal pass and are never persisted.

use tracing::debug;

pub mod matcher;

/// Separator between the hardware id and the display name in tool output.
pub const LISTING_DELIMITER: char = ':';

/// One hardware node reported by the device-management tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Vendor hardware id, unique within one enumeration pass.
    pub id: String,
    /// Human-readable device name.
    pub display_name: String,
}

/// Parses the raw `find *` output of the device-management tool.
///
/// Malformed lines are skipped, not errors: enumeration output routinely
/// contains banners and summary lines ("4 matching device(s) found").
pub fn parse_device_listing(output: &str) -> Vec<DeviceRecord> {
    let mut records = Vec::new();
    for line in output.lines() {
        let Some((id, name)) = line.split_once(LISTING_DELIMITER) else {
            if !line.trim().is_empty() {
                debug!(line, "skipping listing line without delimiter");
            }
            continue;
        };
        let id = id.trim();
        if id.is_empty() {
            debug!(line, "skipping listing line with empty id");
            continue;
        }
        records.push(DeviceRecord {
            id: id.to_string(),
            display_name: name.trim().to_string(),
        });
    }
    records
}

// ── Tests ─────────────────────────────────────────────────────────────────────
