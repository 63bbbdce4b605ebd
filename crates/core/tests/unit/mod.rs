/// Concrete scenario tests (rstest cases A-F from the testable-properties list).
pub mod scenarios;

/// Property-based invariants (proptest) over timing gaps and queue arbitration.
pub mod properties;

/// JSON stats output, round-tripped through a real file.
pub mod stats_output;
