/// Single-channel harness wrapping a `Controller` with completion and
/// issue-order traces.
pub mod harness;
