//! Per-channel command queues and issue arbitration.
//!
//! Grounded directly on `extern/NewtonSim/src/newton_command_queue.cc`
//! (`NewtonCommandQueue`), read in full. This is the closest thing this
//! crate has to a line-for-line port: the round-robin ordinary-queue scan,
//! the dedicated PIM queue (including its deliberately-reproduced
//! single-entry-scan quirk), precharge arbitration, and the RAW dependency
//! check all mirror that file's control flow.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::channel_state::ChannelState;
use crate::command::{Command, CommandKind, Decoded};
use crate::config::{ChannelsConfig, MemoryType, QueueConfig, QueueStructure};

/// One ordinary FIFO (`PER_BANK` or `PER_RANK`, depending on
/// [`QueueStructure`]).
type OrdinaryQueue = VecDeque<Command>;

/// Per-channel command queue set: ordinary FIFOs plus a dedicated PIM queue,
/// and the latched arbitration state the original tracks as loose fields on
/// `NewtonCommandQueue` (`is_pim_mode_`, `is_gwriting_`, `skip_pim_`, ...).
#[derive(Debug)]
pub struct CommandQueue {
    structure: QueueStructure,
    memory_type: MemoryType,
    geometry: ChannelsConfig,
    ordinary: Vec<OrdinaryQueue>,
    ordinary_capacity: usize,
    pim: VecDeque<Command>,
    pim_capacity: usize,
    last_queue_idx: usize,
    /// Channel is mid-PIM-burst; only PIM queue commands may issue.
    is_pim_mode: bool,
    /// A `GWRITE` has been selected and is in flight (single tick window).
    is_gwriting: bool,
    /// The PIM burst could not meet the refresh deadline; ordinary traffic
    /// is forced through until refresh clears this.
    skip_pim: bool,
    /// `(rank, bankgroup, bank)` locked out by an in-flight `GWRITE`.
    gwrite_target: Option<(usize, usize, usize)>,
    /// Row reserved by the active `PIM_HEADER` burst, if any.
    reserved_row_for_pim: Option<u32>,
    /// Cycles of refresh slack still available to overlap ordinary traffic
    /// with an in-flight PIM burst (dual-buffer only).
    remain_slack: i64,
    /// Queue indices currently gated by an in-progress refresh.
    ref_q_indices: Vec<usize>,
    /// Statistics the arbitration policy itself updates, mirroring the
    /// original's `stats_->num_ondemand_pres` etc.
    pub num_ondemand_pres: u64,
    pub num_parallel_prec_cmds: u64,
    pub num_parallel_act_cmds: u64,
    pub num_parallel_read_cmds: u64,
    pub num_parallel_write_cmds: u64,
}

impl CommandQueue {
    /// Builds empty queues for one channel.
    #[must_use]
    pub fn new(cfg: &QueueConfig, geometry: ChannelsConfig, memory_type: MemoryType) -> Self {
        let num_queues = match cfg.queue_structure {
            QueueStructure::PerBank => geometry.banks_per_channel(),
            QueueStructure::PerRank => geometry.ranks,
        };
        Self {
            structure: cfg.queue_structure,
            memory_type,
            geometry,
            ordinary: (0..num_queues).map(|_| VecDeque::new()).collect(),
            ordinary_capacity: cfg.cmd_queue_size,
            pim: VecDeque::new(),
            pim_capacity: cfg.pim_cmd_queue_size,
            last_queue_idx: num_queues.saturating_sub(1),
            is_pim_mode: false,
            is_gwriting: false,
            skip_pim: false,
            gwrite_target: None,
            reserved_row_for_pim: None,
            remain_slack: 0,
            ref_q_indices: Vec::new(),
            num_ondemand_pres: 0,
            num_parallel_prec_cmds: 0,
            num_parallel_act_cmds: 0,
            num_parallel_read_cmds: 0,
            num_parallel_write_cmds: 0,
        }
    }

    fn queue_index(&self, d: Decoded) -> usize {
        match self.structure {
            QueueStructure::PerBank => {
                (d.rank * self.geometry.bankgroups + d.bankgroup) * self.geometry.banks_per_group + d.bank
            }
            QueueStructure::PerRank => d.rank,
        }
    }

    /// Whether a new command targeting `d` can be accepted: its home queue
    /// (ordinary) or the PIM queue (PIM-family) has spare capacity.
    #[must_use]
    pub fn will_accept(&self, kind: CommandKind, d: Decoded) -> bool {
        if kind.is_pim_command() || kind == CommandKind::PimHeader {
            self.pim.len() < self.pim_capacity
        } else {
            self.ordinary[self.queue_index(d)].len() < self.ordinary_capacity
        }
    }

    /// Appends a command to its home queue. Caller must have checked
    /// `will_accept` first.
    pub fn add_command(&mut self, cmd: Command) {
        if cmd.kind.is_pim_command() || cmd.kind == CommandKind::PimHeader {
            self.pim.push_back(cmd);
        } else {
            let idx = self.queue_index(cmd.decoded);
            self.ordinary[idx].push_back(cmd);
        }
    }

    /// Whether every queue (ordinary and PIM) is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pim.is_empty() && self.ordinary.iter().all(VecDeque::is_empty)
    }

    /// Marks the queue indices a refresh to `rank` gates, matching the
    /// original's `GetRefQIndices`.
    pub fn begin_refresh(&mut self, rank: usize) {
        self.ref_q_indices = match self.structure {
            QueueStructure::PerRank => vec![rank],
            QueueStructure::PerBank => (0..self.ordinary.len())
                .filter(|&idx| idx / (self.geometry.bankgroups * self.geometry.banks_per_group) == rank)
                .collect(),
        };
    }

    /// Clears the refresh gate once `REFRESH` has issued for that rank.
    pub fn finish_refresh(&mut self) {
        self.ref_q_indices.clear();
        self.skip_pim = false;
        self.reserved_row_for_pim = None;
    }

    /// Records a refresh-deadline check result: if the estimated PIM burst
    /// latency meets or exceeds the rank's remaining refresh slack (a tie
    /// still counts as a miss, matching `CanMeetRefreshDeadline`'s strict
    /// `remain_slack > 0`), forces ordinary traffic by latching `skip_pim`.
    pub fn check_refresh_deadline(&mut self, channel: usize, remain_to_refresh: i64, estimated_latency: u32) {
        self.remain_slack = remain_to_refresh - i64::from(estimated_latency);
        if self.remain_slack <= 0 {
            warn!(
                channel,
                remain_to_refresh, estimated_latency, "PIM burst cannot meet refresh deadline, deferring to ordinary traffic"
            );
            self.skip_pim = true;
        }
    }

    /// The top-level arbitration entry point, mirroring
    /// `NewtonCommandQueue::GetCommandToIssue`.
    #[must_use]
    pub fn get_command_to_issue(&mut self, channel: usize, state: &ChannelState, now: u64) -> Option<Command> {
        if !self.ref_q_indices.is_empty() {
            return self.get_first_ready_in_queue(channel, state, now);
        }

        if self.memory_type.has_pim() && !self.skip_pim && (self.is_empty_of_ordinary() || self.is_pim_mode) {
            return self.get_ready_in_pim_queue(channel, state, now);
        }

        self.get_first_ready_in_queue(channel, state, now)
    }

    fn is_empty_of_ordinary(&self) -> bool {
        self.ordinary.iter().all(VecDeque::is_empty)
    }

    /// Scans the PIM queue for a ready command.
    ///
    /// **Faithful quirk**: the original's `GetReadyInPIMQueue` has no
    /// `continue` at the bottom of its loop body — every branch either
    /// `return`s or falls through to the final, unconditional
    /// `channel_state_.GetReadyCommand` call, which itself returns. That
    /// means the scan never advances past the head of the PIM queue inside
    /// a single tick. Reproduced here rather than generalized into a
    /// per-entry scan.
    fn get_ready_in_pim_queue(&mut self, channel: usize, state: &ChannelState, now: u64) -> Option<Command> {
        let head = *self.pim.front()?;

        if head.kind == CommandKind::Gwrite {
            let estimate = state.estimate_pim_latency(&head, now);
            let slack = state.refresh_slack(head.decoded.rank, now);
            if i64::from(estimate) <= slack {
                self.is_gwriting = true;
                self.gwrite_target = Some((head.decoded.rank, head.decoded.bankgroup, head.decoded.bank));
            } else {
                self.skip_pim = true;
                return None;
            }
        } else if head.kind == CommandKind::PimHeader {
            let estimate = state.estimate_pim_latency(&head, now);
            let slack = state.refresh_slack(head.decoded.rank, now);
            if i64::from(estimate) <= slack {
                self.is_pim_mode = true;
                self.reserved_row_for_pim = Some(head.decoded.row);
                self.pim.pop_front();
                trace!(channel, row = head.decoded.row, "PIM burst started");
                return self.get_ready_in_pim_queue(channel, state, now);
            }
            self.skip_pim = true;
            return None;
        }

        state.get_ready_command(&head, now)
    }

    /// Round-robins the ordinary queues, applying refresh gating, PIM-row
    /// and `GWRITE`-target exclusion, precharge arbitration, the RAW
    /// dependency check, the single-PIM-lockout break, and (when a PIM
    /// burst is concurrently in flight under dual-buffer) the
    /// overhead-subtraction admission test.
    ///
    /// While a refresh is in progress, queues gated into `ref_q_indices` are
    /// skipped so the rest of the channel keeps issuing ordinary traffic —
    /// mirroring `if (ref_q_indices_.find(queue_idx_) != end()) continue;`.
    fn get_first_ready_in_queue(&mut self, channel: usize, state: &ChannelState, now: u64) -> Option<Command> {
        let n = self.ordinary.len();
        if n == 0 {
            return None;
        }

        for step in 0..n {
            let idx = (self.last_queue_idx + 1 + step) % n;

            if self.ref_q_indices.contains(&idx) {
                continue;
            }

            let Some(ready) = self.first_admissible_in_queue(idx, state, now) else {
                continue;
            };

            self.last_queue_idx = idx;

            if self.remain_slack > 0 && !self.pim.is_empty() {
                if !self.admit_under_dual_buffer_overhead(ready.kind, state) {
                    continue;
                }
            }

            if self.is_pim_mode {
                debug!(channel, "ordinary queue issue breaks PIM lockout scan after first queue");
            }

            return Some(ready);
        }
        None
    }

    fn first_admissible_in_queue(&mut self, idx: usize, state: &ChannelState, now: u64) -> Option<Command> {
        let queue_len = self.ordinary[idx].len();
        for pos in 0..queue_len {
            let pending = self.ordinary[idx][pos];

            if let Some(row) = self.reserved_row_for_pim {
                if pending.decoded.row == row {
                    assert!(
                        self.memory_type.dual_buffer(),
                        "ordinary command targeted the PIM-reserved row without dual-buffer enabled"
                    );
                    continue;
                }
            }

            if let Some(target) = self.gwrite_target {
                if (pending.decoded.rank, pending.decoded.bankgroup, pending.decoded.bank) == target {
                    continue;
                }
            }

            let Some(ready) = state.get_ready_command(&pending, now) else {
                continue;
            };

            if ready.kind == CommandKind::Precharge && !self.arbitrate_precharge(idx, pos, &pending, state) {
                continue;
            }

            if ready.kind == CommandKind::Write && self.has_rw_dependency(idx, pos, &pending) {
                continue;
            }

            return Some(ready);
        }
        None
    }

    /// Permits a `PRECHARGE` derived from `pending` only if no earlier
    /// same-(rank,bg,bank) entry precedes it, and either no later entry in
    /// the queue is a row-hit against the currently open row or the bank's
    /// `row_hit_count` has reached the cap.
    fn arbitrate_precharge(&mut self, queue_idx: usize, pos: usize, pending: &Command, state: &ChannelState) -> bool {
        if pending.kind == CommandKind::Gwrite {
            return true;
        }

        let d = pending.decoded;
        let queue = &self.ordinary[queue_idx];

        let earlier_conflict = queue.iter().take(pos).any(|c| {
            c.decoded.rank == d.rank && c.decoded.bankgroup == d.bankgroup && c.decoded.bank == d.bank
        });
        if earlier_conflict {
            return false;
        }

        let open_row = state.open_row(d);
        let later_row_hit = queue
            .iter()
            .skip(pos + 1)
            .any(|c| c.decoded.rank == d.rank && c.decoded.bankgroup == d.bankgroup && c.decoded.bank == d.bank && Some(c.decoded.row) == open_row);

        let hit_cap_reached = state.row_hit_count(d) >= 4;
        if !later_row_hit || hit_cap_reached {
            self.num_ondemand_pres += 1;
            true
        } else {
            false
        }
    }

    /// Rejects a `WRITE` if any earlier entry in the same queue is a
    /// `READ` or PIM compute targeting the same (bankgroup, bank, row,
    /// column) — a later write must not pass a still-pending read of that
    /// data.
    fn has_rw_dependency(&self, queue_idx: usize, pos: usize, pending: &Command) -> bool {
        let d = pending.decoded;
        self.ordinary[queue_idx].iter().take(pos).any(|c| {
            (c.kind == CommandKind::Read || c.kind.is_pim_command())
                && c.decoded.bankgroup == d.bankgroup
                && c.decoded.bank == d.bank
                && c.decoded.row == d.row
                && c.decoded.column == d.column
        })
    }

    /// Dual-buffer overlap admission test, mirroring the overhead-subtraction
    /// block in `GetFirstReadyInQueue`: a `PRECHARGE` is deferred unless
    /// `remain_slack` exceeds `precharge_to_activate + activate_to_write`,
    /// then consumes `precharge_to_activate` of it; an `ACTIVATE` is
    /// deferred unless `remain_slack` exceeds `activate_to_write`, then
    /// consumes all of it. `READ`/`WRITE` are free and never touch
    /// `remain_slack`.
    fn admit_under_dual_buffer_overhead(&mut self, kind: CommandKind, state: &ChannelState) -> bool {
        let precharge_to_activate = i64::from(state.precharge_to_activate());
        let activate_to_write = i64::from(state.activate_to_write());
        match kind {
            CommandKind::Precharge => {
                let cmd_overhead = precharge_to_activate + activate_to_write;
                if self.remain_slack <= cmd_overhead {
                    return false;
                }
                self.remain_slack -= precharge_to_activate;
                self.num_parallel_prec_cmds += 1;
            }
            CommandKind::Activate => {
                if self.remain_slack <= activate_to_write {
                    return false;
                }
                self.remain_slack -= activate_to_write;
                self.num_parallel_act_cmds += 1;
            }
            CommandKind::Read | CommandKind::ReadPrecharge => self.num_parallel_read_cmds += 1,
            CommandKind::Write | CommandKind::WritePrecharge => self.num_parallel_write_cmds += 1,
            _ => {}
        }
        true
    }

    /// Erases the head PIM command after issue; clears `is_pim_mode` when
    /// it reports `is_last`, clears `is_gwriting`/`gwrite_target` when a
    /// `GWRITE` is erased.
    ///
    /// # Panics
    ///
    /// Panics (`InvariantViolation::MissingPimCommand`) if `issued` does not
    /// match the PIM queue's head, since only head entries are ever
    /// returned by `get_ready_in_pim_queue`.
    pub fn erase_pim_command(&mut self, issued: &Command) {
        let Some(head) = self.pim.front() else {
            panic!(
                "{}",
                crate::common::InvariantViolation::MissingPimCommand(issued.kind)
            );
        };
        if !head.same_entry(issued) {
            panic!(
                "{}",
                crate::common::InvariantViolation::MissingPimCommand(issued.kind)
            );
        }
        let erased = self.pim.pop_front().expect("front checked above");

        if erased.kind == CommandKind::Gwrite {
            self.is_gwriting = false;
            self.gwrite_target = None;
        }
        if erased.pim.is_last {
            self.is_pim_mode = false;
            self.reserved_row_for_pim = None;
        }
    }

    /// Erases a just-issued ordinary command from its home queue.
    pub fn erase_rw_command(&mut self, issued: &Command) {
        let idx = self.queue_index(issued.decoded);
        if let Some(pos) = self.ordinary[idx].iter().position(|c| c.same_entry(issued)) {
            self.ordinary[idx].remove(pos);
        }
    }

    /// Whether the channel is currently locked into PIM-only issue.
    #[must_use]
    pub const fn is_pim_mode(&self) -> bool {
        self.is_pim_mode
    }

    /// Current occupancy of the dedicated PIM queue.
    #[must_use]
    pub fn pim_queue_len(&self) -> usize {
        self.pim.len()
    }

    /// A copy of the PIM queue's head entry, used by the controller to
    /// estimate refresh-deadline risk without mutating arbitration state.
    #[must_use]
    pub fn pim_head(&self) -> Option<Command> {
        self.pim.front().copied()
    }
}
