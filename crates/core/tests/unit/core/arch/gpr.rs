//! # General-Purpose Register Tests
//!
//! Tests for the 32-entry, 8-bit register file.

use avrsim_core::core::arch::gpr::Gpr;

#[test]
fn test_gpr_new_initializes_to_zero() {
    let gpr = Gpr::new();
    for i in 0..32 {
        assert_eq!(gpr.read(i), 0);
    }
}

#[test]
fn test_gpr_r0_is_writable() {
    let mut gpr = Gpr::new();
    gpr.write(0, 0xA5);
    assert_eq!(gpr.read(0), 0xA5);
}

#[test]
fn test_gpr_registers_are_independent() {
    let mut gpr = Gpr::new();
    for i in 0..32 {
        gpr.write(i, i as u8 * 3);
    }
    for i in 0..32 {
        assert_eq!(gpr.read(i), i as u8 * 3);
    }
}

#[test]
fn test_gpr_snapshot_and_clear() {
    let mut gpr = Gpr::new();
    gpr.write(31, 0xFF);
    let snap = gpr.snapshot();
    assert_eq!(snap[31], 0xFF);
    assert_eq!(snap.iter().filter(|&&v| v != 0).count(), 1);

    gpr.clear();
    assert_eq!(gpr, Gpr::default());
}

#[test]
fn test_gpr_display_lists_every_register() {
    let mut gpr = Gpr::new();
    gpr.write(16, 0xFF);
    let text = gpr.to_string();
    assert!(text.contains("r16=0xff"));
    assert!(text.contains("r31"));
    assert_eq!(text.lines().count(), 8);
}
