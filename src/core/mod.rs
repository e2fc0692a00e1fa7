//! Core types for rulepack
//!
//! This module holds the error type shared by every part of the import
//! resolver together with the user-facing error rendering used by the CLI.
//!
//! - [`ImportError`] - Enumerated failure modes of import resolution
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format

pub mod error;

pub use error::{ErrorContext, ImportError, Result, user_friendly_error};
