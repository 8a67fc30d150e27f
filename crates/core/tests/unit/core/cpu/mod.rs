//! # CPU Execution Tests
