//! DRAM/PIM memory-controller subsystem simulator.
//!
//! This crate implements a cycle-stepped model of a JEDEC DRAM controller
//! extended with processing-in-memory (PIM) command support, with the
//! following pieces:
//! 1. **Timing:** JEDEC + PIM timing-constraint derivation (`timing`).
//! 2. **Channel state:** per-bank/per-rank state machines and timing gates
//!    (`channel_state`).
//! 3. **Command queue:** per-bank/per-rank and PIM queue arbitration
//!    (`command_queue`).
//! 4. **Controller:** per-channel transaction ingress, issue, and completion
//!    (`controller`).
//! 5. **DRAM system:** multi-channel fanout and a fixed-latency bypass model
//!    (`dram_system`).
//! 6. **Stats:** per-channel issue counters and JSON reporting (`stats`).

/// Common types and constants (errors shared across modules).
pub mod common;
/// Address decoding: byte address to channel/rank/bankgroup/bank/row/column.
pub mod addr;
/// The transaction/command data model and locality classification.
pub mod command;
/// Per-bank/per-rank command queues and PIM burst arbitration.
pub mod command_queue;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Per-bank/per-rank state machines and timing-window gating.
pub mod channel_state;
/// Per-channel transaction ingress, command issue, and completion scheduling.
pub mod controller;
/// Multi-channel fanout, callback dispatch, and the ideal bypass model.
pub mod dram_system;
/// JEDEC + PIM timing-constraint table.
pub mod timing;
/// Per-channel counters and JSON stats reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Top-level system (one controller per channel); construct with `DramSystem::new`.
pub use crate::dram_system::{DramSystem, IdealDramSystem};
/// Per-channel transaction/command issue engine.
pub use crate::controller::Controller;
