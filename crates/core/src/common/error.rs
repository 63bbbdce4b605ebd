//! Error taxonomy for the DRAM/PIM subsystem.
//!
//! Two classes of failure are distinguished:
//!
//! - [`ConfigError`]: detected once, at construction, from user-supplied
//!   configuration. Always surfaced as a `Result`, never a panic.
//! - [`InvariantViolation`]: a contract the simulator itself is responsible
//!   for upholding every tick (e.g. never issuing a command before its
//!   `next_allowed` cycle). These indicate implementation bugs rather than
//!   bad input, so they are raised via `panic!` at the single call site that
//!   detects them rather than threaded through `Result` on the hot path —
//!   the typed variant still centralizes the message text.
//!
//! Recoverable flow control (`QueueFull`) is not an error type at all: it is
//! the `bool` returned by `will_accept`/`add_transaction`, matching the
//! hot-path convention used throughout this crate.

use crate::command::CommandKind;

/// Fatal configuration error, detected once at construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `memory_type` was not one of `DRAM`, `NEWTON`, `NEUPIMS`.
    #[error("unknown memory type: {0}")]
    UnknownMemoryType(String),

    /// `queue_structure` was not one of `PER_BANK`, `PER_RANK`.
    #[error("unknown queue structure: {0}")]
    UnknownQueueStructure(String),

    /// Timing parameters failed an internal consistency check (e.g. a
    /// dependent interval smaller than the interval it must contain).
    #[error("inconsistent timing parameters: {0}")]
    InconsistentTiming(String),

    /// A geometry field (ranks, bankgroups, banks, rows, columns) was zero.
    #[error("channel geometry field `{field}` must be non-zero")]
    InvalidGeometry {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// A contract the subsystem itself must never break.
///
/// Reaching one of these means a bug in this crate, not bad input from a
/// caller; the simulator aborts rather than attempting to recover.
#[derive(Debug, thiserror::Error)]
pub enum InvariantViolation {
    /// A command was passed to `update_on_issue` before its `next_allowed`
    /// cycle for that kind had elapsed.
    #[error("command {0:?} issued before its next_allowed cycle")]
    IssuedTooEarly(CommandKind),

    /// A PIM command reported as issued could not be found in the PIM queue
    /// during erase.
    #[error("PIM command missing from queue during erase: {0:?}")]
    MissingPimCommand(CommandKind),

    /// An ordinary command was issued from a channel that is latched into
    /// PIM mode.
    #[error("unexpected command {0:?} issued while channel {1} is in PIM mode")]
    UnexpectedCommandInPimMode(CommandKind, usize),

    /// An ordinary command targeted the row reserved for an in-flight PIM
    /// burst while dual-buffer mode is disabled.
    #[error("row {0} targeted by ordinary command while reserved for PIM without dual-buffer")]
    ReservedPimRowViolated(u32),
}
