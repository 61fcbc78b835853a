// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # s7ua Integration Tests
//!
//! Integration tests for the s7ua client, run against an in-memory S7
//! address space instead of a real PLC.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `mocks`: In-memory address space, session and session factory
//!   - `fixtures`: Pre-built address spaces and configurations
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p s7ua-tests
//!
//! # Run specific test suite
//! cargo test -p s7ua-tests --test integration_pool
//! cargo test -p s7ua-tests --test integration_discovery
//! cargo test -p s7ua-tests --test integration_access
//! cargo test -p s7ua-tests --test integration_conversion
//!
//! # Run with log output
//! RUST_LOG=s7ua=debug cargo test -p s7ua-tests -- --nocapture
//! ```
//!
//! ## Test Categories
//!
//! ### Pool Tests (`integration_pool.rs`)
//! - Concurrent borrowing and return
//! - Partial initialization failure
//! - Replacement of disconnected sessions
//! - Disposal
//!
//! ### Discovery Tests (`integration_discovery.rs`)
//! - Root shells and area type overrides
//! - Instance data block sections
//! - UDT placeholder registration
//!
//! ### Access Tests (`integration_access.rs`)
//! - Batched reads with full paths
//! - Custom UDT converters
//! - Leaf and struct writes
//!
//! ### Conversion Tests (`integration_conversion.rs`)
//! - BCD DATE_AND_TIME and S5TIME
//! - DTL, CHAR/WCHAR and arrays

pub mod common;
