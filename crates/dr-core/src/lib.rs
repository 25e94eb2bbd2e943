//! # dr-core
//!
//! Shared error type, result alias and fit result types used across the
//! drana workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::FitResult;

/// Workspace version string (reported by `drana --version`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
