//! Shared types used across the DRAM/PIM subsystem.
//!
//! Currently this is limited to the error taxonomy; address decoding lives in
//! [`crate::addr`] and the command/transaction data model lives in
//! [`crate::command`].

/// Error types: fatal configuration errors and fatal invariant violations.
pub mod error;

pub use error::{ConfigError, InvariantViolation};
