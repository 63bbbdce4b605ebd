//! Per-channel row state, refresh counters, and the next-allowed-cycle
//! matrix that gates command issue.
//!
//! Grounded in the original's per-(rank,bankgroup,bank) bookkeeping
//! (`dram_state`/`bank_state` fields threaded through `newton_command_queue.cc`
//! and `timing.cc`): this module owns exactly that state and answers the two
//! questions the queue needs every tick — "what command actually makes
//! progress toward this pending one" and "what did issuing a command just
//! change".

use std::collections::HashMap;

use crate::command::{Command, CommandKind, Decoded};
use crate::config::ChannelsConfig;
use crate::timing::TimingTable;

/// The lifecycle state of one (rank, bankgroup, bank).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// No row open; `ACTIVATE`/`G_ACT` or `REFRESH`/`REFRESH_BANK` may issue.
    Closed,
    /// A row is open; column accesses to it proceed without a prerequisite.
    Open,
    /// In self-refresh (low power); not driven further by this crate.
    SelfRefresh,
    /// Powered down; not driven further by this crate.
    PowerDown,
}

/// Per-(rank,bankgroup,bank) state.
#[derive(Debug, Clone)]
pub struct BankState {
    /// Current lifecycle state.
    pub state: RowState,
    /// The open row, if any.
    pub open_row: Option<u32>,
    /// Consecutive column accesses serviced against the currently open row;
    /// capped at 4 and consulted by precharge arbitration.
    pub row_hit_count: u32,
    next_allowed: HashMap<CommandKind, u64>,
}

impl BankState {
    fn new() -> Self {
        Self {
            state: RowState::Closed,
            open_row: None,
            row_hit_count: 0,
            next_allowed: HashMap::new(),
        }
    }

    /// The earliest cycle `kind` may next issue against this bank; `0` if
    /// never constrained yet.
    #[must_use]
    pub fn next_allowed(&self, kind: CommandKind) -> u64 {
        self.next_allowed.get(&kind).copied().unwrap_or(0)
    }

    fn bump(&mut self, kind: CommandKind, cycle: u64) {
        let entry = self.next_allowed.entry(kind).or_insert(0);
        *entry = (*entry).max(cycle);
    }
}

/// Per-rank refresh bookkeeping.
#[derive(Debug, Clone)]
pub struct RankState {
    /// The cycle at which this rank's next refresh becomes due.
    pub next_refresh_due: u64,
    /// Whether the rank is currently mid-refresh (`is_in_ref`).
    pub in_refresh: bool,
    next_allowed: HashMap<CommandKind, u64>,
}

impl RankState {
    fn new(refresh_interval: u64) -> Self {
        Self {
            next_refresh_due: refresh_interval,
            in_refresh: false,
            next_allowed: HashMap::new(),
        }
    }

    fn next_allowed(&self, kind: CommandKind) -> u64 {
        self.next_allowed.get(&kind).copied().unwrap_or(0)
    }

    fn bump(&mut self, kind: CommandKind, cycle: u64) {
        let entry = self.next_allowed.entry(kind).or_insert(0);
        *entry = (*entry).max(cycle);
    }
}

/// All per-bank and per-rank state for one channel, plus the timing table
/// it consults to answer issue-readiness questions.
#[derive(Debug, Clone)]
pub struct ChannelState {
    geometry: ChannelsConfig,
    timing: TimingTable,
    refresh_interval: u64,
    /// Indexed `[rank][bankgroup][bank]`.
    banks: Vec<Vec<Vec<BankState>>>,
    ranks: Vec<RankState>,
}

impl ChannelState {
    /// Builds fresh (all-closed) state for one channel from geometry and a
    /// shared timing table.
    #[must_use]
    pub fn new(geometry: ChannelsConfig, timing: TimingTable, refresh_interval: u64) -> Self {
        let banks = (0..geometry.ranks)
            .map(|_| {
                (0..geometry.bankgroups)
                    .map(|_| (0..geometry.banks_per_group).map(|_| BankState::new()).collect())
                    .collect()
            })
            .collect();
        let ranks = (0..geometry.ranks).map(|_| RankState::new(refresh_interval)).collect();
        Self {
            geometry,
            timing,
            refresh_interval,
            banks,
            ranks,
        }
    }

    fn bank(&self, d: Decoded) -> &BankState {
        &self.banks[d.rank][d.bankgroup][d.bank]
    }

    fn bank_mut(&mut self, d: Decoded) -> &mut BankState {
        &mut self.banks[d.rank][d.bankgroup][d.bank]
    }

    fn banks_in_rank(&self, rank: usize) -> impl Iterator<Item = &BankState> {
        self.banks[rank].iter().flatten()
    }

    fn rank_all_precharged(&self, rank: usize) -> bool {
        self.banks_in_rank(rank).all(|b| b.state == RowState::Closed)
    }

    fn first_open_bank(&self, rank: usize) -> Option<Decoded> {
        for (bg, group) in self.banks[rank].iter().enumerate() {
            for (bank, state) in group.iter().enumerate() {
                if state.state != RowState::Closed {
                    return Some(Decoded {
                        channel: 0,
                        rank,
                        bankgroup: bg,
                        bank,
                        row: 0,
                        column: 0,
                    });
                }
            }
        }
        None
    }

    /// Returns the command that actually makes progress toward `pending`
    /// right now: `pending` itself if its bank is already in the right
    /// state and its timing window has opened, or a prerequisite
    /// (`ACTIVATE`, `PRECHARGE`, `G_ACT`, `PIM_PRECHARGE`) otherwise.
    /// Returns `None` if even the prerequisite is not yet timing-eligible.
    #[must_use]
    pub fn get_ready_command(&self, pending: &Command, now: u64) -> Option<Command> {
        match pending.kind {
            CommandKind::Read | CommandKind::Write | CommandKind::ReadPrecharge | CommandKind::WritePrecharge => {
                self.ready_for_column_access(pending, now)
            }
            CommandKind::Comp | CommandKind::ReadRes | CommandKind::CompsReadRes => {
                self.ready_for_pim_access(pending, now)
            }
            CommandKind::Gwrite => self.ready_for_gwrite(pending, now),
            CommandKind::Refresh => self.ready_for_refresh(pending, now),
            CommandKind::RefreshBank => self.ready_for_refresh_bank(pending, now),
            _ => Some(*pending),
        }
    }

    fn ready_for_column_access(&self, pending: &Command, now: u64) -> Option<Command> {
        let bank = self.bank(pending.decoded);
        match bank.state {
            RowState::Closed => self.activate_if_ready(pending, now),
            RowState::Open if bank.open_row == Some(pending.decoded.row) => {
                (now >= bank.next_allowed(pending.kind)).then_some(*pending)
            }
            RowState::Open => self.precharge_if_ready(pending, now),
            RowState::SelfRefresh | RowState::PowerDown => None,
        }
    }

    fn ready_for_pim_access(&self, pending: &Command, now: u64) -> Option<Command> {
        let bank = self.bank(pending.decoded);
        match bank.state {
            RowState::Closed => self.gact_if_ready(pending, now),
            RowState::Open if bank.open_row == Some(pending.decoded.row) => {
                (now >= bank.next_allowed(pending.kind)).then_some(*pending)
            }
            RowState::Open => self.pim_precharge_if_ready(pending, now),
            RowState::SelfRefresh | RowState::PowerDown => None,
        }
    }

    fn ready_for_gwrite(&self, pending: &Command, now: u64) -> Option<Command> {
        let rank = pending.decoded.rank;
        if let Some(open) = self.first_open_bank(rank) {
            let bank = self.bank(open);
            return (now >= bank.next_allowed(CommandKind::Precharge))
                .then(|| Command::new(CommandKind::Precharge, pending.address, open));
        }
        let max_next = self.banks_in_rank(rank).map(|b| b.next_allowed(CommandKind::Gwrite)).max().unwrap_or(0);
        (now >= max_next).then_some(*pending)
    }

    fn ready_for_refresh(&self, pending: &Command, now: u64) -> Option<Command> {
        let rank = pending.decoded.rank;
        if let Some(open) = self.first_open_bank(rank) {
            let bank = self.bank(open);
            return (now >= bank.next_allowed(CommandKind::Precharge))
                .then(|| Command::new(CommandKind::Precharge, pending.address, open));
        }
        (now >= self.ranks[rank].next_allowed(CommandKind::Refresh)).then_some(*pending)
    }

    fn ready_for_refresh_bank(&self, pending: &Command, now: u64) -> Option<Command> {
        let bank = self.bank(pending.decoded);
        match bank.state {
            RowState::Closed => (now >= bank.next_allowed(CommandKind::RefreshBank)).then_some(*pending),
            _ => self.precharge_if_ready(pending, now),
        }
    }

    fn activate_if_ready(&self, pending: &Command, now: u64) -> Option<Command> {
        let bank = self.bank(pending.decoded);
        (now >= bank.next_allowed(CommandKind::Activate))
            .then(|| Command::new(CommandKind::Activate, pending.address, pending.decoded))
    }

    fn gact_if_ready(&self, pending: &Command, now: u64) -> Option<Command> {
        let bank = self.bank(pending.decoded);
        (now >= bank.next_allowed(CommandKind::GAct))
            .then(|| Command::new(CommandKind::GAct, pending.address, pending.decoded))
    }

    fn precharge_if_ready(&self, pending: &Command, now: u64) -> Option<Command> {
        let bank = self.bank(pending.decoded);
        (now >= bank.next_allowed(CommandKind::Precharge))
            .then(|| Command::new(CommandKind::Precharge, pending.address, pending.decoded))
    }

    fn pim_precharge_if_ready(&self, pending: &Command, now: u64) -> Option<Command> {
        let bank = self.bank(pending.decoded);
        (now >= bank.next_allowed(CommandKind::PimPrecharge))
            .then(|| Command::new(CommandKind::PimPrecharge, pending.address, pending.decoded))
    }

    /// Applies the effect of having just issued `cmd` at `now`: updates row
    /// state/`row_hit_count`, and bumps `next_allowed[next_kind]` for every
    /// `(locality, next_kind, gap)` entry the timing table has for
    /// `cmd.kind`, scoped to the banks that locality denotes.
    pub fn update_on_issue(&mut self, cmd: &Command, now: u64) {
        self.apply_row_transition(cmd);
        self.apply_timing_constraints(cmd, now);
    }

    fn apply_row_transition(&mut self, cmd: &Command) {
        let d = cmd.decoded;
        match cmd.kind {
            CommandKind::Activate | CommandKind::GAct => {
                let bank = self.bank_mut(d);
                bank.state = RowState::Open;
                bank.open_row = Some(d.row);
                bank.row_hit_count = 0;
            }
            CommandKind::Precharge
            | CommandKind::ReadPrecharge
            | CommandKind::WritePrecharge
            | CommandKind::PimPrecharge
            | CommandKind::Refresh
            | CommandKind::RefreshBank => {
                let bank = self.bank_mut(d);
                bank.state = RowState::Closed;
                bank.open_row = None;
                bank.row_hit_count = 0;
            }
            CommandKind::Read | CommandKind::Write | CommandKind::Comp | CommandKind::ReadRes => {
                let bank = self.bank_mut(d);
                if bank.open_row == Some(d.row) {
                    bank.row_hit_count = bank.row_hit_count.saturating_add(1);
                }
            }
            _ => {}
        }

        if matches!(cmd.kind, CommandKind::Refresh) {
            let rank = &mut self.ranks[d.rank];
            rank.in_refresh = false;
            rank.next_refresh_due = self.refresh_interval;
        }
    }

    fn apply_timing_constraints(&mut self, cmd: &Command, now: u64) {
        use crate::command::Locality;

        let d = cmd.decoded;
        for locality in Locality::ALL {
            for &(next_kind, gap) in self.timing.entries_for(cmd.kind, locality) {
                let gap = if next_kind == CommandKind::CompsReadRes {
                    gap.saturating_mul(u32::from(cmd.pim.num_comps.max(1)))
                } else {
                    gap
                };
                let target = u64::from(gap) + now;
                match locality {
                    Locality::SameBank => self.bank_mut(d).bump(next_kind, target),
                    Locality::OtherBanksSameBg => {
                        let (rank, bg, bank) = (d.rank, d.bankgroup, d.bank);
                        for (idx, b) in self.banks[rank][bg].iter_mut().enumerate() {
                            if idx != bank {
                                b.bump(next_kind, target);
                            }
                        }
                    }
                    Locality::OtherBgsSameRank => {
                        let rank = d.rank;
                        for (idx, group) in self.banks[rank].iter_mut().enumerate() {
                            if idx != d.bankgroup {
                                for b in group {
                                    b.bump(next_kind, target);
                                }
                            }
                        }
                    }
                    Locality::OtherRanks => {
                        for (idx, rank_banks) in self.banks.iter_mut().enumerate() {
                            if idx != d.rank {
                                for group in rank_banks {
                                    for b in group {
                                        b.bump(next_kind, target);
                                    }
                                }
                            }
                        }
                    }
                    Locality::SameRank => self.ranks[d.rank].bump(next_kind, target),
                }
            }
        }
    }

    /// An upper-bound estimate of the cycles needed to fully complete `cmd`
    /// from its current bank state, used only to gate PIM bursts against
    /// the refresh deadline — never to decide actual issue timing, which
    /// remains exact via `get_ready_command`/`update_on_issue`.
    #[must_use]
    pub fn estimate_pim_latency(&self, cmd: &Command, now: u64) -> u32 {
        let bank = self.bank(cmd.decoded);
        let mut total: u64 = 0;
        match bank.state {
            RowState::Closed => {
                total += u64::from(self.timing.precharge_to_activate());
                total += u64::from(self.timing.activate_to_write());
            }
            RowState::Open if bank.open_row != Some(cmd.decoded.row) => {
                total += u64::from(self.timing.precharge_to_activate());
                total += u64::from(self.timing.activate_to_write());
            }
            RowState::Open | RowState::SelfRefresh | RowState::PowerDown => {}
        }

        let wait = bank.next_allowed(cmd.kind).saturating_sub(now + total);
        total += wait;

        let unit = if cmd.kind == CommandKind::CompsReadRes {
            u64::from(self.timing.comps_readres_unit_gap()) * u64::from(cmd.pim.num_comps.max(1))
        } else if cmd.kind == CommandKind::Gwrite {
            u64::from(self.timing.gwrite_delay())
        } else {
            u64::from(self.timing.comps_readres_unit_gap())
        };
        total += unit;

        u32::try_from(total).unwrap_or(u32::MAX)
    }

    /// The refresh command due soonest, if any rank has reached its
    /// `tREFI`-derived deadline.
    #[must_use]
    pub fn pending_ref_command(&self, now: u64) -> Option<Command> {
        self.ranks.iter().enumerate().find_map(|(rank, state)| {
            (now >= state.next_refresh_due && !state.in_refresh).then(|| {
                Command::new(
                    CommandKind::Refresh,
                    0,
                    Decoded {
                        channel: 0,
                        rank,
                        bankgroup: 0,
                        bank: 0,
                        row: 0,
                        column: 0,
                    },
                )
            })
        })
    }

    /// Cycles remaining before `rank` must refresh; negative once overdue.
    #[must_use]
    pub fn refresh_slack(&self, rank: usize, now: u64) -> i64 {
        i64::try_from(self.ranks[rank].next_refresh_due).unwrap_or(i64::MAX) - i64::try_from(now).unwrap_or(0)
    }

    /// Marks `rank` as mid-refresh; cleared again by `update_on_issue` when
    /// the `REFRESH` command itself is issued.
    pub fn enter_refresh(&mut self, rank: usize) {
        self.ranks[rank].in_refresh = true;
    }

    /// Whether `rank` is currently mid-refresh.
    #[must_use]
    pub fn is_in_refresh(&self, rank: usize) -> bool {
        self.ranks[rank].in_refresh
    }

    /// Row currently open on a bank, if any.
    #[must_use]
    pub fn open_row(&self, d: Decoded) -> Option<u32> {
        self.bank(d).open_row
    }

    /// Consecutive row-hit count on a bank.
    #[must_use]
    pub fn row_hit_count(&self, d: Decoded) -> u32 {
        self.bank(d).row_hit_count
    }

    /// Channel geometry this state was built from.
    #[must_use]
    pub const fn geometry(&self) -> ChannelsConfig {
        self.geometry
    }

    /// `tRP`, half of the dual-buffer overhead-subtraction threshold the
    /// command queue applies when overlapping ordinary traffic with an
    /// in-flight PIM burst.
    #[must_use]
    pub const fn precharge_to_activate(&self) -> u32 {
        self.timing.precharge_to_activate()
    }

    /// Activate-to-write delay, the other half of that threshold.
    #[must_use]
    pub const fn activate_to_write(&self) -> u32 {
        self.timing.activate_to_write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;

    fn geometry() -> ChannelsConfig {
        ChannelsConfig {
            channels: 1,
            shift_bits: 6,
            ranks: 1,
            bankgroups: 2,
            banks_per_group: 2,
            rows: 1 << 16,
            columns: 1 << 10,
        }
    }

    fn state() -> ChannelState {
        let timing = TimingTable::new(&TimingConfig::default());
        ChannelState::new(geometry(), timing, 7800)
    }

    fn decoded(row: u32) -> Decoded {
        Decoded {
            channel: 0,
            rank: 0,
            bankgroup: 0,
            bank: 0,
            row,
            column: 0,
        }
    }

    #[test]
    fn closed_bank_requires_activate_before_read() {
        let cs = state();
        let pending = Command::new(CommandKind::Read, 0, decoded(7));
        let ready = cs.get_ready_command(&pending, 0).expect("activate is immediately ready");
        assert_eq!(ready.kind, CommandKind::Activate);
    }

    #[test]
    fn activate_then_read_opens_the_row() {
        let mut cs = state();
        let activate = Command::new(CommandKind::Activate, 0, decoded(7));
        cs.update_on_issue(&activate, 0);
        assert_eq!(cs.open_row(decoded(7)), Some(7));

        let pending = Command::new(CommandKind::Read, 0, decoded(7));
        let ready = cs.get_ready_command(&pending, 1_000).expect("row is open and far enough past tRCD");
        assert_eq!(ready.kind, CommandKind::Read);
    }

    #[test]
    fn row_miss_requires_precharge_before_new_activate() {
        let mut cs = state();
        let activate = Command::new(CommandKind::Activate, 0, decoded(7));
        cs.update_on_issue(&activate, 0);

        let pending = Command::new(CommandKind::Read, 0, decoded(8));
        let ready = cs.get_ready_command(&pending, 1_000).expect("precharge is ready");
        assert_eq!(ready.kind, CommandKind::Precharge);
    }

    #[test]
    fn read_before_timing_window_opens_is_not_ready() {
        let mut cs = state();
        let activate = Command::new(CommandKind::Activate, 0, decoded(7));
        cs.update_on_issue(&activate, 0);

        let pending = Command::new(CommandKind::Read, 0, decoded(7));
        assert!(cs.get_ready_command(&pending, 0).is_none());
    }

    #[test]
    fn refresh_due_after_interval_elapses() {
        let cs = state();
        assert!(cs.pending_ref_command(0).is_none());
        assert!(cs.pending_ref_command(7_800).is_some());
    }
}
