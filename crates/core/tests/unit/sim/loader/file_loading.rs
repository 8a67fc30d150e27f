//! # Object File Loading Tests
//!
//! Loading object files from disk through `load_hex_file`.

use avrsim_core::common::LoadError;
use avrsim_core::config::LoaderConfig;
use avrsim_core::sim::loader::load_hex_file;

use crate::common::encode;
use crate::common::harness::{hex_from_words, init_tracing, write_temp};

#[test]
fn test_load_from_disk() {
    init_tracing();
    let words = [encode::ldi(16, 0xFF), encode::rjmp(-1)];
    let file = write_temp(&hex_from_words(&words));

    let image = load_hex_file(file.path(), &LoaderConfig::default()).unwrap();
    assert_eq!(image.words(), &words);
    assert_eq!(image.len(), 2);
    assert_eq!(image.byte_len(), 4);
}

#[test]
fn test_missing_file() {
    let err = load_hex_file("/nonexistent/main.hex", &LoaderConfig::default()).unwrap_err();
    match err {
        LoadError::Io { path, .. } => assert_eq!(path.to_str(), Some("/nonexistent/main.hex")),
        other => panic!("expected Io, got {other:?}"),
    }
}

#[test]
fn test_malformed_file() {
    let file = write_temp(":0200\n");
    let err = load_hex_file(file.path(), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, LoadError::Parse { line: 1, .. }));
    assert!(err.to_string().starts_with("line 1:"));
}
