//! The static JEDEC + PIM timing constraint table.
//!
//! Grounded in `extern/NewtonSim/src/timing.cc`: every derived interval is
//! computed once from [`TimingConfig`] and stored in a dense lookup keyed by
//! `(issued kind, locality)`, never recomputed per query.

use std::collections::HashMap;

use crate::command::{CommandKind, Locality};
use crate::config::{Protocol, TimingConfig};

/// `(issued command, next command, minimum gap in cycles)` entries for one
/// `(issued, locality)` key.
type Entries = Vec<(CommandKind, u32)>;

/// The constraint table: for every `(issued_kind, locality)`, the minimum
/// cycle gap before each constrained follow-up kind may issue.
///
/// Built once at construction and never mutated; cheap to share behind an
/// `Arc` across channels since every channel uses identical timing.
#[derive(Debug, Clone)]
pub struct TimingTable {
    gaps: HashMap<(CommandKind, Locality), Entries>,
    /// Per-`num_comps` unit gap for `COMPS_READRES` continuations; the
    /// caller multiplies this by the header's `num_comps` field.
    comps_readres_unit_gap: u32,
    /// `gwrite_delay`, exposed directly for refresh-deadline latency
    /// estimates that need it before a `GWRITE` command exists.
    gwrite_delay: u32,
    /// `tRP`, exposed directly for the dual-buffer overhead-subtraction
    /// threshold in `CommandQueue::get_first_ready_in_queue`.
    precharge_to_activate: u32,
    /// Activate-to-write delay, the other half of that threshold.
    activate_to_write: u32,
}

impl TimingTable {
    /// Derives every constraint from timing configuration and builds the
    /// dense lookup.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn new(cfg: &TimingConfig) -> Self {
        let burst = i64::from(cfg.burst_cycle);
        let rl = i64::from(cfg.rl);
        let wl = i64::from(cfg.wl);
        let al = i64::from(cfg.al);
        let t_rtrs = i64::from(cfg.t_rtrs);
        let t_ccd_l = i64::from(cfg.t_ccd_l);
        let t_ccd_s = i64::from(cfg.t_ccd_s);
        let t_rtp = i64::from(cfg.t_rtp);
        let t_wtr_l = i64::from(cfg.t_wtr_l);
        let t_wtr_s = i64::from(cfg.t_wtr_s);
        let t_wr = i64::from(cfg.t_wr);
        let t_rp = i64::from(cfg.t_rp);
        let t_ppd = i64::from(cfg.t_ppd);
        let t_rc = i64::from(cfg.t_rc);
        let t_rrd_l = i64::from(cfg.t_rrd_l);
        let t_rrd_s = i64::from(cfg.t_rrd_s);
        let t_ras = i64::from(cfg.t_ras);
        let t_refi = i64::from(cfg.t_refi);
        let t_rfc = i64::from(cfg.t_rfc);
        let t_rfcb = i64::from(cfg.t_rfcb);
        let gwrite_delay = i64::from(cfg.gwrite_delay);

        // Derived intermediates, named to match the original's local variables.
        let read_to_read_l = burst.max(t_ccd_l);
        let read_to_read_s = burst.max(t_ccd_s);
        let read_to_read_o = burst + t_rtrs;
        let read_to_write = rl + burst - wl + t_rtrs;
        let write_delay = wl + burst;
        let read_delay = rl + burst;
        let write_to_read_l = write_delay + t_wtr_l;
        let write_to_read_s = write_delay + t_wtr_s;
        let write_to_read_o = write_delay + burst + t_rtrs - read_delay;
        let read_to_precharge = al + t_rtp;
        let readp_to_act = al + burst + t_rtp + t_rp;
        let write_to_write_l = burst.max(t_ccd_l);
        let write_to_write_s = burst.max(t_ccd_s);
        let write_to_write_o = burst;
        let write_to_precharge = wl + burst + t_wr;
        let precharge_to_activate = t_rp;
        let precharge_to_precharge = t_ppd;
        let activate_to_activate = t_rc;
        let activate_to_activate_l = t_rrd_l;
        let activate_to_activate_s = t_rrd_s;
        let activate_to_precharge = t_ras;
        let activate_to_access = match cfg.protocol {
            Protocol::Ddr => i64::from(cfg.t_rcd) - al,
            Protocol::Gddr => 0, // split below per read/write
        };
        let activate_to_read = match cfg.protocol {
            Protocol::Ddr => activate_to_access,
            Protocol::Gddr => i64::from(cfg.t_rcdrd),
        };
        let activate_to_write = match cfg.protocol {
            Protocol::Ddr => activate_to_access,
            Protocol::Gddr => i64::from(cfg.t_rcdwr),
        };
        let activate_to_refresh = t_rc;
        let refresh_to_refresh = t_refi;
        let refresh_to_activate = t_rfc;
        let refresh_to_activate_bank = t_rfcb;

        // PIM-specific derivations. Dual-buffer shortens the same-bank
        // hand-off between ordinary read/write and PIM compute commands,
        // and between ACTIVATE and a PIM-mode G_ACT on the same bank.
        let gact_after_activate_same_bank = if cfg.enable_dual_buffer {
            t_rrd_l
        } else {
            activate_to_activate
        };
        let rw_to_pim_same_bank = if cfg.enable_dual_buffer { 0 } else { read_to_read_l };

        let g = |v: i64| -> u32 { v.max(0).try_into().unwrap_or(u32::MAX) };

        let mut gaps: HashMap<(CommandKind, Locality), Entries> = HashMap::new();
        let mut add = |issued: CommandKind, locality: Locality, next: CommandKind, gap: i64| {
            gaps.entry((issued, locality)).or_default().push((next, g(gap)));
        };

        use CommandKind::{
            Activate, CompsReadRes, Comp, Gwrite, GAct, PimPrecharge, Precharge, Pwrite, Read,
            ReadPrecharge, ReadRes, Refresh, RefreshBank, Write, WritePrecharge,
        };
        use Locality::{OtherBanksSameBg, OtherBgsSameRank, OtherRanks, SameBank, SameRank};

        // READ.
        add(Read, SameBank, Read, read_to_read_l);
        add(Read, SameBank, ReadPrecharge, read_to_read_l);
        add(Read, SameBank, Write, read_to_write);
        add(Read, SameBank, WritePrecharge, read_to_write);
        add(Read, SameBank, Precharge, read_to_precharge);
        add(Read, SameBank, GAct, rw_to_pim_same_bank);
        add(Read, SameBank, Comp, rw_to_pim_same_bank);
        add(Read, SameBank, ReadRes, rw_to_pim_same_bank);
        add(Read, SameBank, CompsReadRes, rw_to_pim_same_bank);
        add(Read, OtherBanksSameBg, Read, read_to_read_l);
        add(Read, OtherBanksSameBg, Write, read_to_write);
        add(Read, OtherBgsSameRank, Read, read_to_read_s);
        add(Read, OtherBgsSameRank, Write, read_to_write);
        add(Read, OtherRanks, Read, read_to_read_o);
        add(Read, OtherRanks, Write, read_to_write);

        // WRITE.
        add(Write, SameBank, Write, write_to_write_l);
        add(Write, SameBank, WritePrecharge, write_to_write_l);
        add(Write, SameBank, Read, write_to_read_l);
        add(Write, SameBank, ReadPrecharge, write_to_read_l);
        add(Write, SameBank, Precharge, write_to_precharge);
        add(Write, SameBank, Comp, rw_to_pim_same_bank);
        add(Write, SameBank, ReadRes, rw_to_pim_same_bank);
        add(Write, SameBank, CompsReadRes, rw_to_pim_same_bank);
        add(Write, OtherBanksSameBg, Write, write_to_write_l);
        add(Write, OtherBanksSameBg, Read, write_to_read_l);
        add(Write, OtherBgsSameRank, Write, write_to_write_s);
        add(Write, OtherBgsSameRank, Read, write_to_read_s);
        add(Write, OtherRanks, Write, write_to_write_o);
        add(Write, OtherRanks, Read, write_to_read_o);

        // ACTIVATE.
        add(Activate, SameBank, Read, activate_to_read);
        add(Activate, SameBank, Write, activate_to_write);
        add(Activate, SameBank, Precharge, activate_to_precharge);
        add(Activate, SameBank, Activate, activate_to_activate);
        add(Activate, SameBank, Refresh, activate_to_refresh);
        add(Activate, SameBank, GAct, gact_after_activate_same_bank);
        add(Activate, OtherBanksSameBg, Activate, activate_to_activate_l);
        add(Activate, OtherBgsSameRank, Activate, activate_to_activate_s);

        // PRECHARGE.
        add(Precharge, SameBank, Activate, precharge_to_activate);
        add(Precharge, SameBank, RefreshBank, precharge_to_activate);
        add(Precharge, OtherBanksSameBg, Precharge, precharge_to_precharge);
        add(Precharge, OtherBgsSameRank, Precharge, precharge_to_precharge);

        // REFRESH (rank-wide) / REFRESH_BANK.
        add(Refresh, SameRank, Refresh, refresh_to_refresh);
        add(Refresh, SameRank, Activate, refresh_to_activate);
        add(RefreshBank, SameBank, Activate, refresh_to_activate_bank);
        add(RefreshBank, SameBank, RefreshBank, refresh_to_activate_bank);

        // GWRITE: broadcasts into every bank of the rank, so the delay it
        // imposes on a same-bank follow-up applies regardless of kind.
        for next in [Read, Write, GAct, Comp, ReadRes, CompsReadRes, Precharge] {
            add(Gwrite, SameBank, next, gwrite_delay);
        }
        add(Gwrite, SameRank, Gwrite, gwrite_delay);

        // G_ACT / COMP / READRES / COMPS_READRES / PIM_PRECHARGE.
        add(GAct, SameBank, Comp, activate_to_read);
        add(GAct, SameBank, ReadRes, activate_to_read);
        add(GAct, SameBank, CompsReadRes, activate_to_read);
        add(GAct, SameBank, PimPrecharge, activate_to_precharge);
        add(Comp, SameBank, Comp, read_to_read_l);
        add(Comp, SameBank, ReadRes, read_to_read_l);
        add(Comp, SameBank, PimPrecharge, read_to_precharge);
        add(ReadRes, SameBank, ReadRes, read_to_read_l);
        add(ReadRes, SameBank, Comp, read_to_read_l);
        add(ReadRes, SameBank, PimPrecharge, read_to_precharge);
        add(CompsReadRes, SameBank, PimPrecharge, read_to_precharge);
        add(PimPrecharge, SameBank, GAct, readp_to_act);
        add(PimPrecharge, SameBank, Activate, readp_to_act);

        // PWRITE (PIM-side scratch write-back), timed like an ordinary write.
        add(Pwrite, SameBank, Pwrite, write_to_write_l);
        add(Pwrite, SameBank, Read, write_to_read_l);
        add(Pwrite, SameBank, Comp, write_to_read_l);

        Self {
            gaps,
            comps_readres_unit_gap: g(read_to_read_l),
            gwrite_delay: g(gwrite_delay),
            precharge_to_activate: g(precharge_to_activate),
            activate_to_write: g(activate_to_write),
        }
    }

    /// The minimum gap before `next` may issue, `gap` cycles after `issued`
    /// at the given locality, or `None` if this entry does not constrain
    /// that pair (other localities or a same-rank fallback may still
    /// apply — callers must check every applicable locality).
    #[must_use]
    pub fn next_gap(&self, issued: CommandKind, locality: Locality, next: CommandKind) -> Option<u32> {
        self.gaps
            .get(&(issued, locality))
            .and_then(|entries| entries.iter().find(|(kind, _)| *kind == next).map(|(_, gap)| *gap))
    }

    /// Every `(next_kind, gap)` constraint this `(issued, locality)` pair
    /// imposes, used by `ChannelState::update_on_issue` to update every
    /// affected `next_allowed` entry in one pass.
    #[must_use]
    pub fn entries_for(&self, issued: CommandKind, locality: Locality) -> &[(CommandKind, u32)] {
        self.gaps
            .get(&(issued, locality))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Per-`num_comps` unit gap for a `COMPS_READRES` burst; multiply by the
    /// command's `pim.num_comps` to get its actual occupancy.
    #[must_use]
    pub const fn comps_readres_unit_gap(&self) -> u32 {
        self.comps_readres_unit_gap
    }

    /// `gwrite_delay`, needed by refresh-deadline latency estimates before a
    /// concrete `Gwrite` command exists to key a table lookup with.
    #[must_use]
    pub const fn gwrite_delay(&self) -> u32 {
        self.gwrite_delay
    }

    /// `tRP`, half of the dual-buffer overhead-subtraction threshold.
    #[must_use]
    pub const fn precharge_to_activate(&self) -> u32 {
        self.precharge_to_activate
    }

    /// Activate-to-write delay, the other half of that threshold.
    #[must_use]
    pub const fn activate_to_write(&self) -> u32 {
        self.activate_to_write
    }
}
