//! Device-matcher predicates.
//!
//! Pattern removal and enumerate-then-match are two strategies for one goal:
//! selecting the virtual-display hardware nodes a removal pass targets.  Both
//! are expressions of a single predicate abstraction over [`DeviceRecord`]:
//!
//! - [`HardwareIdGlob`] — the fixed, ordered hardware-id pattern list
//!   (`*`/`?` wildcards, case-insensitive).  When the tool cannot enumerate,
//!   the same pattern spellings are handed to the tool unmodified, one
//!   removal call per pattern.
//! - [`NameContains`] — case-insensitive substring match over the display
//!   name, used to filter enumeration output.
//!
//! Which predicate drives a pass is selected by tool capability; the removal
//! logic itself is not duplicated.

use wildmatch::WildMatch;

use super::DeviceRecord;

/// A predicate over [`DeviceRecord`] deciding whether a node is targeted for
/// removal.
pub trait DeviceMatcher {
    fn matches(&self, device: &DeviceRecord) -> bool;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}

/// Case-insensitive `*`/`?` wildcard match over hardware ids.
///
/// Patterns are tried in their declared order; a record matching any pattern
/// is selected.  The original spellings are kept so they can be passed to the
/// device tool verbatim when enumeration is unavailable.
pub struct HardwareIdGlob {
    patterns: Vec<String>,
    compiled: Vec<WildMatch>,
}

impl HardwareIdGlob {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let compiled = patterns
            .iter()
            .map(|p| WildMatch::new(&p.to_lowercase()))
            .collect();
        Self { patterns, compiled }
    }

    /// The original pattern spellings, in declaration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl DeviceMatcher for HardwareIdGlob {
    fn matches(&self, device: &DeviceRecord) -> bool {
        let id = device.id.to_lowercase();
        self.compiled.iter().any(|glob| glob.matches(&id))
    }

    fn describe(&self) -> String {
        format!("hardware-id patterns [{}]", self.patterns.join(", "))
    }
}

/// Case-insensitive substring match over display names.
pub struct NameContains {
    needle: String,
    needle_lower: String,
}

impl NameContains {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
            needle_lower: needle.to_lowercase(),
        }
    }
}

impl DeviceMatcher for NameContains {
    fn matches(&self, device: &DeviceRecord) -> bool {
        device
            .display_name
            .to_lowercase()
            .contains(&self.needle_lower)
    }

    fn describe(&self) -> String {
        format!("display name containing \"{}\"", self.needle)
    }
}

/// Ids of the devices a matcher selects, in listing order.
pub fn removal_plan(devices: &[DeviceRecord], matcher: &dyn DeviceMatcher) -> Vec<String> {
    devices
        .iter()
        .filter(|d| matcher.matches(d))
        .map(|d| d.id.clone())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
