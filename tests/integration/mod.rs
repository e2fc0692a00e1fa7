//! Integration test suite for rulepack
//!
//! End-to-end tests against a real loopback HTTP server and the compiled
//! `rulepack` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **http_client**: `ReqwestClient` + `HttpFetcher` redirects, retries and timeouts
//! - **remote_imports**: `ImportLoader` caching of remote files and archives
//! - **cli_import**: the `rulepack import` command
//! - **cli_cache_key**: the `rulepack cache-key` command

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli_import;
mod remote_imports;
