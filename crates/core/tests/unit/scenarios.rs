//! Concrete scenario tests, lettered A-F, each pinned to one arbitration
//! behavior rather than a broad smoke test.

use dram_pim_core::channel_state::ChannelState;
use dram_pim_core::command::{Command, CommandKind, Decoded, PimMeta};
use dram_pim_core::command_queue::CommandQueue;
use dram_pim_core::config::{Config, MemoryType, QueueStructure};
use dram_pim_core::timing::TimingTable;
use rstest::rstest;

use crate::common::harness::ChannelHarness;

/// A. Row-hit read stream: one bank, one row, a run of column reads.
/// Expect exactly one `ACTIVATE` up front, then `READ`s spaced by
/// `read_to_read_l`, and no `PRECHARGE` anywhere in the trace.
#[test]
fn scenario_a_row_hit_read_stream() {
    let cfg = Config::default();
    let timing = TimingTable::new(&cfg.timing);
    let gap = timing
        .next_gap(CommandKind::Read, dram_pim_core::command::Locality::SameBank, CommandKind::Read)
        .expect("Read-Read gap must be defined");

    let mut h = ChannelHarness::new(&cfg);
    for col in 0..8 {
        h.submit_read(0, 0, 0, 7, col);
    }
    h.run(150);

    let kinds = h.issued_kinds();
    assert_eq!(kinds[0], CommandKind::Activate, "bank starts closed, must open before any column access");
    assert!(!kinds.contains(&CommandKind::Precharge), "a same-row stream never needs to close the row");
    let reads: Vec<u64> = h.issued().iter().filter(|(_, k)| *k == CommandKind::Read).map(|(c, _)| *c).collect();
    assert_eq!(reads.len(), 8, "all eight column reads must eventually issue");
    for pair in reads.windows(2) {
        assert_eq!(pair[1] - pair[0], u64::from(gap), "back-to-back same-bank reads must be spaced by read_to_read_l");
    }
}

/// B. Row-miss read: a second read to a different row in the same bank must
/// force a `PRECHARGE` and a fresh `ACTIVATE` between the two column
/// accesses.
#[test]
fn scenario_b_row_miss_forces_precharge_and_reactivate() {
    let cfg = Config::default();
    let mut h = ChannelHarness::new(&cfg);
    h.submit_read(0, 0, 0, 7, 0);
    h.submit_read(0, 0, 0, 8, 0);
    h.run(150);

    let kinds = h.issued_kinds();
    assert_eq!(
        kinds,
        vec![
            CommandKind::Activate,
            CommandKind::Read,
            CommandKind::Precharge,
            CommandKind::Activate,
            CommandKind::Read,
        ],
        "a row-miss read must close the old row before opening the new one"
    );
}

/// C. Refresh deadline pressure: when the estimated PIM burst latency
/// exceeds the rank's remaining refresh slack, the queue must fall back to
/// ordinary traffic (`skip_pim`) until the refresh clears, then resume
/// considering the PIM queue.
#[test]
fn scenario_c_refresh_deadline_defers_pim_to_ordinary_traffic() {
    let cfg = Config::default();
    let timing = TimingTable::new(&cfg.timing);
    let mut queue = CommandQueue::new(&cfg.queue, cfg.channels, MemoryType::Newton);
    let state = ChannelState::new(cfg.channels, timing, u64::from(cfg.timing.t_refi));

    let decoded = Decoded { channel: 0, rank: 0, bankgroup: 0, bank: 0, row: 3, column: 0 };
    let header = Command::new_pim(
        CommandKind::PimHeader,
        0xDEAD,
        decoded,
        PimMeta { num_comps: 16, num_readres: 1, is_last: true },
    );
    queue.add_command(header);
    let burst = Command::new_pim(
        CommandKind::CompsReadRes,
        0xDEAD,
        decoded,
        PimMeta { num_comps: 1, num_readres: 1, is_last: true },
    );
    queue.add_command(burst);

    let ordinary = Command::new(CommandKind::Read, 0xBEEF, Decoded { bank: 1, ..decoded });
    queue.add_command(ordinary);

    // Slack (10) is smaller than the estimated burst cost (50): deadline
    // pressure must force ordinary traffic through.
    queue.check_refresh_deadline(0, 10, 50);
    let issued = queue.get_command_to_issue(0, &state, 0).expect("ordinary traffic must still be selectable");
    assert_eq!(issued.kind, CommandKind::Activate, "the ordinary read's bank is closed, so it opens first");
    assert_ne!(issued.decoded.bank, decoded.bank, "the PIM burst's bank must not be the one selected");

    // The ordinary read has now left the queue (its transaction completed),
    // so once refresh clears, the PIM queue is the only traffic left.
    queue.erase_rw_command(&ordinary);
    queue.finish_refresh();
    let resumed = queue
        .get_command_to_issue(0, &state, 1)
        .expect("once the refresh clears, the PIM header must be considered again");
    assert_eq!(resumed.kind, CommandKind::GAct, "the PIM burst resumes by opening its reserved row");
}

/// D. `GWRITE` blocks same-bank ordinary access for `gwrite_delay` cycles,
/// even though the row-open path (`ACTIVATE`) for the ordinary read is free
/// to proceed immediately.
#[test]
fn scenario_d_gwrite_delays_same_bank_ordinary_read() {
    let mut cfg = Config::default();
    cfg.memory.memory_type = MemoryType::Newton;
    let gwrite_delay = u64::from(cfg.timing.gwrite_delay);

    let mut h = ChannelHarness::new(&cfg);
    h.submit_gwrite(0, 0, 0, 5);
    h.tick(); // GWRITE issues at cycle 0 while the ordinary queue is empty.
    h.submit_read(0, 0, 0, 5, 0);
    h.run(40);

    let kinds = h.issued_kinds();
    assert_eq!(kinds[0], CommandKind::Gwrite);
    assert!(kinds.contains(&CommandKind::Activate), "the read's bank still needs to open");

    let read_cycle = h
        .issued()
        .iter()
        .find(|(_, k)| *k == CommandKind::Read)
        .map(|(c, _)| *c)
        .expect("the read must eventually issue");
    assert!(read_cycle >= gwrite_delay, "the read must not beat the GWRITE's same-bank delay");
}

/// E. Dual-buffer overlap: under `NEUPIMS` with `enable_dual_buffer`, an
/// ordinary write to a different row of the same bank as an in-flight PIM
/// burst must be allowed to proceed in parallel and complete.
#[test]
fn scenario_e_dual_buffer_overlap_admits_parallel_write() {
    let mut cfg = Config::default();
    cfg.memory.memory_type = MemoryType::Neupims;
    cfg.timing.enable_dual_buffer = true;

    let mut h = ChannelHarness::new(&cfg);
    h.submit_comps_readres(0, 0, 0, 7);
    h.submit_write(0, 0, 0, 9, 3);
    h.run(400);

    assert!(!h.writes().is_empty(), "the parallel write must complete under dual-buffer overlap");
    let stats = h.controller.snapshot_stats();
    assert!(
        stats.num_parallel_write_cmds > 0 || stats.num_parallel_act_cmds > 0 || stats.num_parallel_prec_cmds > 0,
        "some stage of the ordinary write's path must have been admitted in parallel with the PIM burst"
    );
}

/// F. `PER_BANK` partitions queue capacity per bank; `PER_RANK` shares one
/// queue across every bank in the rank, so the same traffic that fits under
/// `PER_BANK` can be rejected once a shared queue fills up under
/// `PER_RANK`.
#[rstest]
#[case(QueueStructure::PerBank, true)]
#[case(QueueStructure::PerRank, false)]
fn scenario_f_per_bank_vs_per_rank_capacity_fairness(#[case] structure: QueueStructure, #[case] third_accepted: bool) {
    let mut cfg = Config::default();
    cfg.queue.queue_structure = structure;
    cfg.queue.cmd_queue_size = 2;

    let mut queue = CommandQueue::new(&cfg.queue, cfg.channels, MemoryType::Dram);
    let banks = [(0, 0), (0, 1), (0, 2)];
    let mut accepted = Vec::new();
    for (i, (bg, bank)) in banks.iter().enumerate() {
        let d = Decoded { channel: 0, rank: 0, bankgroup: *bg, bank: *bank, row: 1, column: 0 };
        let ok = queue.will_accept(CommandKind::Read, d);
        accepted.push(ok);
        if ok {
            queue.add_command(Command::new(CommandKind::Read, i as u64, d));
        }
    }

    assert!(accepted[0] && accepted[1], "the first two reads always fit within a capacity-2 queue");
    assert_eq!(
        accepted[2], third_accepted,
        "a third read to a distinct bank is only admitted when each bank owns its own queue"
    );
}

/// G. Refresh must actually be driven through `Controller::tick`: once a
/// rank crosses its `tREFI` deadline the controller must issue the
/// PRECHARGE…REFRESH sequence itself (not just latch `in_refresh`), clear
/// the gate, and resume ordinary issue on that rank afterward.
#[test]
fn scenario_g_controller_drives_refresh_to_completion() {
    let cfg = Config::default();
    let t_refi = u64::from(cfg.timing.t_refi);

    let mut h = ChannelHarness::new(&cfg);
    h.submit_read(0, 0, 0, 7, 0);
    h.run(t_refi + 400);

    let kinds = h.issued_kinds();
    assert!(kinds.contains(&CommandKind::Refresh), "the controller must actually issue a REFRESH command");
    assert!(!h.controller.rank_in_refresh(0), "in_refresh must clear once REFRESH has been issued");

    // Traffic submitted after the refresh clears must still be serviceable.
    h.submit_read(0, 0, 1, 2, 0);
    h.run(200);
    assert_eq!(h.reads().len(), 2, "both the pre- and post-refresh reads must complete");
}
