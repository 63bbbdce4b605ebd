//! Per-channel controller: transaction ingress, command translation, and
//! the per-tick drive loop.
//!
//! Tick ordering is grounded directly on `JedecDRAMSystem::ClockTick` in
//! `extern/NewtonSim/src/dram_system.cc`, read in full: drain completions
//! first, then advance refresh state, then ask the queue for a command,
//! then issue and schedule its completion, then advance the clock and emit
//! stats. Command translation by [`MemoryType`] mirrors the virtual
//! `DRAMController`/`NewtonController`/`NeuPIMSController` split in the
//! original, collapsed into one `match` per the teacher's own
//! config-selected-enum idiom (`System::new` dispatching on
//! `MemControllerType`).

use std::collections::VecDeque;

use tracing::{debug, instrument};

use crate::channel_state::ChannelState;
use crate::command::{Command, CommandKind, Decoded, PimMeta, Transaction, TransactionKind};
use crate::config::{Config, MemoryType};
use crate::command_queue::CommandQueue;
use crate::stats::ChannelStats;
use crate::timing::TimingTable;

/// A scheduled completion: the cycle at which a transaction's data becomes
/// available, and whether to report it through the read or write callback.
#[derive(Debug, Clone, Copy)]
struct PendingCompletion {
    at_cycle: u64,
    address: u64,
    is_read: bool,
}

/// Drives one channel: owns its [`ChannelState`], [`CommandQueue`], and the
/// completion list transactions wait on.
#[derive(Debug)]
pub struct Controller {
    channel: usize,
    memory_type: MemoryType,
    state: ChannelState,
    queue: CommandQueue,
    clk: u64,
    epoch_period: u64,
    completions: VecDeque<PendingCompletion>,
    pub stats: ChannelStats,
    last_issued: Option<Command>,
}

impl Controller {
    /// Builds a controller for one channel from validated configuration and
    /// a shared timing table.
    #[must_use]
    pub fn new(channel: usize, cfg: &Config, timing: TimingTable) -> Self {
        let state = ChannelState::new(cfg.channels, timing, u64::from(cfg.timing.t_refi));
        let queue = CommandQueue::new(&cfg.queue, cfg.channels, cfg.memory.memory_type);
        Self {
            channel,
            memory_type: cfg.memory.memory_type,
            state,
            queue,
            clk: 0,
            epoch_period: cfg.general.epoch_period,
            completions: VecDeque::new(),
            stats: ChannelStats::default(),
            last_issued: None,
        }
    }

    /// Whether a new transaction of `kind` targeting `decoded` can be
    /// accepted right now. Ordinary traffic is additionally rejected while
    /// the PIM queue carries a backlog, per the back-pressure policy: a
    /// caller must wait for an in-flight PIM burst to drain before new
    /// ordinary reads/writes are admitted to this channel.
    #[must_use]
    pub fn will_accept(&self, kind: TransactionKind, decoded: Decoded) -> bool {
        if kind.is_pim() {
            self.queue.will_accept(pim_header_kind(kind), decoded)
        } else {
            self.queue.will_accept(ordinary_kind(kind), decoded) && self.queue.pim_queue_len() == 0
        }
    }

    /// Accepts a transaction, translating it into one or more commands and
    /// enqueuing them. Returns `false` (and enqueues nothing) if
    /// `will_accept` would have returned `false`.
    pub fn add_transaction(&mut self, txn: &Transaction, decoded: Decoded) -> bool {
        if !self.will_accept(txn.kind, decoded) {
            return false;
        }
        for cmd in translate(self.memory_type, txn, decoded) {
            self.queue.add_command(cmd);
        }
        true
    }

    /// One DRAM cycle: drain completions, advance refresh, issue a command,
    /// advance the clock, snapshot stats.
    #[instrument(skip(self), fields(channel = self.channel, clk = self.clk))]
    pub fn tick(&mut self, read_cb: &mut dyn FnMut(u64), write_cb: &mut dyn FnMut(u64)) {
        self.drain_completions(read_cb, write_cb);
        self.advance_refresh();

        self.last_issued = None;
        let next = match self.next_refresh_step() {
            Some(cmd) => Some(cmd),
            None => self.queue.get_command_to_issue(self.channel, &self.state, self.clk),
        };
        if let Some(cmd) = next {
            self.issue(cmd);
            self.last_issued = Some(cmd);
        }

        if self.queue.pim_queue_len() > 0 {
            self.stats.pim_cycles += 1;
        }

        self.clk += 1;
        if self.epoch_period > 0 && self.clk % self.epoch_period == 0 {
            self.stats.absorb_queue_counters(
                self.queue.num_ondemand_pres,
                self.queue.num_parallel_prec_cmds,
                self.queue.num_parallel_act_cmds,
                self.queue.num_parallel_read_cmds,
                self.queue.num_parallel_write_cmds,
            );
            debug!(channel = self.channel, clk = self.clk, "epoch stats snapshot");
        }
    }

    /// The command issued on the most recent `tick`, if any. Exposed for
    /// test assertions on issue ordering; not consulted by the controller
    /// itself.
    #[must_use]
    pub const fn last_issued(&self) -> Option<Command> {
        self.last_issued
    }

    /// Whether `rank` is currently mid-refresh.
    #[must_use]
    pub fn rank_in_refresh(&self, rank: usize) -> bool {
        self.state.is_in_refresh(rank)
    }

    /// Whether this channel's PIM queue has latched into burst-only issue.
    #[must_use]
    pub fn is_pim_mode(&self) -> bool {
        self.queue.is_pim_mode()
    }

    /// Row currently open on `d`'s (rank, bankgroup, bank), if any. Exposed
    /// for test assertions on row-state transitions.
    #[must_use]
    pub fn open_row(&self, d: Decoded) -> Option<u32> {
        self.state.open_row(d)
    }

    /// A full stats snapshot, syncing arbitration counters from the queue
    /// first (normally synced only at epoch boundaries during `tick`).
    pub fn snapshot_stats(&mut self) -> ChannelStats {
        self.stats.absorb_queue_counters(
            self.queue.num_ondemand_pres,
            self.queue.num_parallel_prec_cmds,
            self.queue.num_parallel_act_cmds,
            self.queue.num_parallel_read_cmds,
            self.queue.num_parallel_write_cmds,
        );
        self.stats.clone()
    }

    fn drain_completions(&mut self, read_cb: &mut dyn FnMut(u64), write_cb: &mut dyn FnMut(u64)) {
        while let Some(front) = self.completions.front() {
            if front.at_cycle > self.clk {
                break;
            }
            let done = self.completions.pop_front().expect("front checked above");
            if done.is_read {
                read_cb(done.address);
            } else {
                write_cb(done.address);
            }
        }
    }

    fn advance_refresh(&mut self) {
        for rank in 0..self.state.geometry().ranks {
            if self.state.is_in_refresh(rank) {
                continue;
            }
            if let Some(refresh_cmd) = self.state.pending_ref_command(self.clk) {
                if refresh_cmd.decoded.rank != rank {
                    continue;
                }
                self.state.enter_refresh(rank);
                self.queue.begin_refresh(rank);
            }
        }

        if !self.memory_type.has_pim() {
            return;
        }
        let Some(head) = self.queue.pim_head() else {
            return;
        };
        let rank = head.decoded.rank;
        let estimate = self.state.estimate_pim_latency(&head, self.clk);
        let slack = self.state.refresh_slack(rank, self.clk);
        self.queue.check_refresh_deadline(self.channel, slack, estimate);
    }

    /// Drives the PRECHARGE→REFRESH sequence for whichever rank
    /// `advance_refresh` has latched `in_refresh`, mirroring
    /// `NewtonCommandQueue::FinishRefresh`: re-derive the pending refresh for
    /// that rank and ask `ChannelState` for the next ready step (a
    /// `PRECHARGE` on an open bank, or the `REFRESH` itself once every bank
    /// is closed and the rank's timing window has opened). Returns `None`
    /// while no rank is mid-refresh, or while the next step isn't yet
    /// timing-ready — in either case the tick falls through to ordinary
    /// queue arbitration.
    fn next_refresh_step(&self) -> Option<Command> {
        let rank = (0..self.state.geometry().ranks).find(|&r| self.state.is_in_refresh(r))?;
        let pending = Command::new(CommandKind::Refresh, 0, Decoded { channel: self.channel, rank, ..Decoded::default() });
        self.state.get_ready_command(&pending, self.clk)
    }

    fn issue(&mut self, cmd: Command) {
        self.stats.record_issue(cmd.kind);
        self.state.update_on_issue(&cmd, self.clk);

        // Only a command that is itself a queue entry (not a structural
        // prerequisite like ACTIVATE/PRECHARGE/G_ACT that ChannelState
        // synthesized on the way to it) is erased from its queue here.
        if cmd.kind.is_queue_entry_kind() {
            if cmd.kind.is_pim_command() {
                self.queue.erase_pim_command(&cmd);
            } else {
                self.queue.erase_rw_command(&cmd);
            }
        } else if matches!(cmd.kind, CommandKind::Refresh | CommandKind::RefreshBank) {
            self.queue.finish_refresh();
        }

        if cmd.kind.completes_as_read() || cmd.kind.completes_as_write() {
            self.schedule_completion(cmd);
        }
    }

    fn schedule_completion(&mut self, cmd: Command) {
        let latency = self.issue_to_data_latency(cmd.kind);
        self.completions.push_back(PendingCompletion {
            at_cycle: self.clk + u64::from(latency),
            address: cmd.address,
            is_read: cmd.kind.completes_as_read(),
        });
    }

    fn issue_to_data_latency(&self, kind: CommandKind) -> u32 {
        match kind {
            CommandKind::Read | CommandKind::ReadPrecharge => 1,
            CommandKind::Write | CommandKind::WritePrecharge => 1,
            CommandKind::Gwrite | CommandKind::Comp | CommandKind::ReadRes | CommandKind::CompsReadRes => 1,
            _ => 0,
        }
    }
}

fn ordinary_kind(kind: TransactionKind) -> CommandKind {
    match kind {
        TransactionKind::Read => CommandKind::Read,
        TransactionKind::Write => CommandKind::Write,
        TransactionKind::Gwrite => CommandKind::Gwrite,
        TransactionKind::Comp | TransactionKind::ReadRes | TransactionKind::CompsReadRes => {
            unreachable!("PIM transaction routed through the ordinary-queue admission path")
        }
    }
}

fn pim_header_kind(kind: TransactionKind) -> CommandKind {
    match kind {
        TransactionKind::Gwrite => CommandKind::Gwrite,
        TransactionKind::Comp | TransactionKind::ReadRes | TransactionKind::CompsReadRes => CommandKind::PimHeader,
        TransactionKind::Read | TransactionKind::Write => {
            unreachable!("ordinary transaction routed through the PIM-queue admission path")
        }
    }
}

/// Expands one transaction into the command sequence it issues as, per the
/// translation rules in the command-translation section of the interface
/// contract: plain pass-through for `READ`/`WRITE`, a single `GWRITE`, and
/// `PIM_HEADER` + N×`COMP` + M×`READRES` (last flagged `is_last`) for
/// compute transactions.
fn translate(memory_type: MemoryType, txn: &Transaction, decoded: Decoded) -> Vec<Command> {
    match txn.kind {
        TransactionKind::Read => vec![Command::new(CommandKind::Read, txn.address, decoded)],
        TransactionKind::Write => vec![Command::new(CommandKind::Write, txn.address, decoded)],
        TransactionKind::Gwrite => vec![Command::new(CommandKind::Gwrite, txn.address, decoded)],
        TransactionKind::CompsReadRes => {
            let pim = PimMeta {
                num_comps: 1,
                num_readres: 1,
                is_last: true,
            };
            vec![
                Command::new(CommandKind::PimHeader, txn.address, decoded),
                Command::new_pim(CommandKind::CompsReadRes, txn.address, decoded, pim),
            ]
        }
        TransactionKind::Comp | TransactionKind::ReadRes => {
            debug_assert!(memory_type.has_pim(), "PIM transaction submitted to a non-PIM memory type");
            let num_comps = 1u16;
            let num_readres = u16::from(txn.kind == TransactionKind::ReadRes);
            let mut out = vec![Command::new(CommandKind::PimHeader, txn.address, decoded)];
            for i in 0..num_comps {
                out.push(Command::new_pim(
                    CommandKind::Comp,
                    txn.address,
                    decoded,
                    PimMeta {
                        num_comps,
                        num_readres,
                        is_last: num_readres == 0 && i + 1 == num_comps,
                    },
                ));
            }
            for i in 0..num_readres {
                out.push(Command::new_pim(
                    CommandKind::ReadRes,
                    txn.address,
                    decoded,
                    PimMeta {
                        num_comps,
                        num_readres,
                        is_last: i + 1 == num_readres,
                    },
                ));
            }
            out
        }
    }
}
