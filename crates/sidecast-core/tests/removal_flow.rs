//! Integration tests for the parse → match → plan removal flow.
//!
//! These tests drive the crate's public API end to end the way the setup
//! binary does: raw tool output in, an ordered list of removal targets out.

use sidecast_core::{
    parse_device_listing, removal_plan, HardwareIdGlob, NameContains, Severity, StageOutcome,
    StageStatus,
};

#[test]
fn test_enumeration_output_to_removal_targets() {
    // Arrange: the exact two-device scenario the removal pass must handle.
    let output = "ABC123: Virtual Display Adapter\nXYZ789: Generic Monitor\n";
    let matcher = NameContains::new("Virtual Display");

    // Act
    let devices = parse_device_listing(output);
    let plan = removal_plan(&devices, &matcher);

    // Assert: exactly one target, whitespace-trimmed id.
    assert_eq!(plan, ["ABC123".to_string()]);
}

#[test]
fn test_real_world_listing_with_noise_lines() {
    // devcon-style output: banner and summary lines mixed into the listing.
    let output = "\
ROOT\\USBMMIDD\\0000: USB Mobile Monitor Virtual Display
ROOT\\USBMMIDD\\0001: USB Mobile Monitor Virtual Display
PCI\\VEN_10DE&DEV_2484\\4&2283f625: NVIDIA GeForce RTX 3070
3 matching device(s) found.
";
    let devices = parse_device_listing(output);
    assert_eq!(devices.len(), 3);

    let plan = removal_plan(&devices, &NameContains::new("virtual display"));
    assert_eq!(
        plan,
        [
            "ROOT\\USBMMIDD\\0000".to_string(),
            "ROOT\\USBMMIDD\\0001".to_string(),
        ]
    );
}

#[test]
fn test_glob_and_substring_matchers_agree_on_vendor_nodes() {
    // Both strategies must target the same vendor nodes when the listing is
    // well-formed; they differ only in what they key on.
    let output = "\
ROOT\\USBMMIDD\\0000: USB Mobile Monitor Virtual Display
DISPLAY\\USBMMIDD\\5&1a2b3c: USB Mobile Monitor Virtual Display
PCI\\VEN_8086\\3&11583659: Generic Monitor
";
    let devices = parse_device_listing(output);

    let by_name = removal_plan(&devices, &NameContains::new("Virtual Display"));
    let by_id = removal_plan(
        &devices,
        &HardwareIdGlob::new(["ROOT\\USBMMIDD*", "DISPLAY\\USBMMIDD*"]),
    );

    assert_eq!(by_name, by_id);
    assert_eq!(by_name.len(), 2);
}

#[test]
fn test_zero_match_pass_is_not_a_failure() {
    // A pass selecting nothing is success-with-zero-matches: the stage
    // reports a soft outcome, which never escalates to fatal regardless of
    // the stage's declared severity.
    let devices = parse_device_listing("PCI\\VEN_8086\\3&1: Generic Monitor");
    let plan = removal_plan(&devices, &NameContains::new("Virtual Display"));
    assert!(plan.is_empty());

    let status: StageStatus =
        StageOutcome::Warning("no matching virtual displays".to_string()).into();
    assert!(!status.halts_run());

    // Only a classified *failure* of a fatal stage halts the run.
    assert!(Severity::Fatal
        .classify_failure("tool crashed".to_string())
        .halts_run());
}
