//! # Configuration Tests
//!
//! Tests for configuration defaults, JSON deserialization and validation.

use std::time::Duration;

use avrsim_core::common::ConfigError;
use avrsim_core::config::*;
use pretty_assertions::assert_eq;

use crate::common::harness::write_temp;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.general.step_delay_ms, 50);
    assert_eq!(config.general.stop_timeout_ms, 200);
    assert!(!config.general.trace_instructions);
    assert!(!config.loader.verify_checksums);
    assert_eq!(config.loader.capacity_words, 16_384);
}

#[test]
fn test_default_port_map_is_atmega32() {
    let ports: Vec<(String, u8)> = Config::default()
        .ports
        .into_iter()
        .map(|p| (p.name, p.address))
        .collect();
    assert_eq!(
        ports,
        vec![
            ("PORTA".to_string(), 0x1B),
            ("PORTB".to_string(), 0x18),
            ("PORTC".to_string(), 0x15),
            ("PORTD".to_string(), 0x12),
        ]
    );
}

#[test]
fn test_durations() {
    let general = GeneralConfig::default();
    assert_eq!(general.step_delay(), Duration::from_millis(50));
    assert_eq!(general.stop_timeout(), Duration::from_millis(200));
}

#[test]
fn test_empty_json_yields_defaults() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_json_overrides() {
    let config = Config::from_json_str(
        r#"{
            "general": { "step_delay_ms": 0, "trace_instructions": true },
            "loader": { "verify_checksums": true }
        }"#,
    )
    .unwrap();
    assert_eq!(config.general.step_delay_ms, 0);
    assert_eq!(config.general.stop_timeout_ms, 200);
    assert!(config.general.trace_instructions);
    assert!(config.loader.verify_checksums);
    assert_eq!(config.loader.capacity_words, 16_384);
    assert_eq!(config.ports.len(), 4);
}

#[test]
fn test_custom_ports_replace_defaults() {
    let config = Config::from_json_str(r#"{ "ports": [ { "name": "LEDS", "address": 24 } ] }"#).unwrap();
    assert_eq!(
        config.ports,
        vec![PortConfig {
            name: "LEDS".to_string(),
            address: 0x18
        }]
    );
}

#[test]
fn test_invalid_json() {
    let err = Config::from_json_str("{ general: ").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn test_capacity_bounds() {
    for capacity in [0, 16_385] {
        let mut config = Config::default();
        config.loader.capacity_words = capacity;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))), "capacity {capacity}");
    }

    let mut config = Config::default();
    config.loader.capacity_words = 1;
    assert!(config.validate().is_ok());
}

#[test]
fn test_port_outside_io_space() {
    let err = Config::from_json_str(r#"{ "ports": [ { "name": "X", "address": 64 } ] }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("outside the I/O space")));
}

#[test]
fn test_duplicate_port_name() {
    let json = r#"{ "ports": [ { "name": "P", "address": 1 }, { "name": "P", "address": 2 } ] }"#;
    let err = Config::from_json_str(json).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("bound twice")));
}

#[test]
fn test_duplicate_port_address() {
    let json = r#"{ "ports": [ { "name": "A", "address": 5 }, { "name": "B", "address": 5 } ] }"#;
    let err = Config::from_json_str(json).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("more than one port")));
}

#[test]
fn test_from_file() {
    let file = write_temp(r#"{ "general": { "stop_timeout_ms": 500 } }"#);
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.general.stop_timeout(), Duration::from_millis(500));
}

#[test]
fn test_from_missing_file() {
    let err = Config::from_file("/nonexistent/avrsim.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_zero_stop_timeout_rejected() {
    let err = Config::from_json_str(r#"{ "general": { "stop_timeout_ms": 0 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("stop_timeout_ms")));

    let config = Config::from_json_str(r#"{ "general": { "stop_timeout_ms": 1 } }"#).unwrap();
    assert_eq!(config.general.stop_timeout(), Duration::from_millis(1));
}
