//! Configuration system for the DRAM/PIM subsystem.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline JEDEC timing constants and channel geometry.
//! 2. **Structures:** Hierarchical config for general settings, channel
//!    geometry, timing, queueing, and memory type.
//! 3. **Enums:** Memory type and queue structure selectors.
//!
//! Configuration is supplied as JSON (via `serde_json::from_str`) or built
//! with `Config::default()` and overridden field-by-field in Rust.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden by the caller. Timing defaults describe a DDR4-2400
/// profile; PIM-specific defaults describe a single dual-buffer-capable
/// bank-group PIM extension.
mod defaults {
    /// Number of memory channels.
    pub const CHANNELS: usize = 1;

    /// Address bits to drop before extracting channel/rank/bankgroup/bank
    /// fields (covers the burst-length byte offset).
    pub const SHIFT_BITS: u32 = 6;

    /// Ranks per channel.
    pub const RANKS: usize = 1;

    /// Bankgroups per rank.
    pub const BANKGROUPS: usize = 4;

    /// Banks per bankgroup.
    pub const BANKS_PER_GROUP: usize = 4;

    /// Rows per bank.
    pub const ROWS: usize = 1 << 16;

    /// Columns per row.
    pub const COLUMNS: usize = 1 << 10;

    /// Burst transfer length in cycles.
    pub const BURST_CYCLE: u32 = 4;

    /// Column-to-column delay, same bankgroup.
    pub const T_CCD_L: u32 = 6;

    /// Column-to-column delay, different bankgroup.
    pub const T_CCD_S: u32 = 4;

    /// Rank-to-rank switch penalty.
    pub const T_RTRS: u32 = 2;

    /// Read latency.
    pub const RL: u32 = 16;

    /// Write latency.
    pub const WL: u32 = 12;

    /// Read-to-precharge delay.
    pub const T_RTP: u32 = 9;

    /// Additive latency.
    pub const AL: u32 = 0;

    /// Write-to-read delay, same bankgroup.
    pub const T_WTR_L: u32 = 9;

    /// Write-to-read delay, different bankgroup.
    pub const T_WTR_S: u32 = 4;

    /// Write recovery time.
    pub const T_WR: u32 = 18;

    /// Row precharge time.
    pub const T_RP: u32 = 16;

    /// Precharge-to-precharge delay.
    pub const T_PPD: u32 = 4;

    /// Row cycle time (activate to activate, same bank).
    pub const T_RC: u32 = 46;

    /// Activate-to-activate delay, same bankgroup.
    pub const T_RRD_L: u32 = 6;

    /// Activate-to-activate delay, different bankgroup.
    pub const T_RRD_S: u32 = 4;

    /// Row active time (activate to precharge).
    pub const T_RAS: u32 = 32;

    /// Row address to column address delay.
    pub const T_RCD: u32 = 16;

    /// Activate-to-read delay (GDDR/HBM protocols).
    pub const T_RCDRD: u32 = 16;

    /// Activate-to-write delay (GDDR/HBM protocols).
    pub const T_RCDWR: u32 = 16;

    /// Refresh cycle time (rank-wide).
    pub const T_RFC: u32 = 350;

    /// Refresh cycle time (per-bank).
    pub const T_RFCB: u32 = 90;

    /// Average refresh interval.
    pub const T_REFI: u32 = 7800;

    /// Self-refresh exit delay.
    pub const T_CKESR: u32 = 9;

    /// Self-refresh exit settle time.
    pub const T_XS: u32 = 360;

    /// Four-activate window.
    pub const T_FAW: u32 = 20;

    /// Delay a `GWRITE` imposes on any follow-up command to the same bank.
    pub const GWRITE_DELAY: u32 = 20;

    /// Per-channel ordinary command queue (FIFO) depth.
    pub const CMD_QUEUE_SIZE: usize = 32;

    /// Dedicated PIM command queue depth.
    pub const PIM_CMD_QUEUE_SIZE: usize = 128;

    /// Cycle window between stats snapshots.
    pub const EPOCH_PERIOD: u64 = 1_000_000;

    /// Fixed latency used by the ideal (non-timing) memory model.
    pub const IDEAL_MEMORY_LATENCY: u64 = 100;
}

/// Whether channel geometry uses a DDR-style shared `tRCD` or a GDDR/HBM-style
/// split `tRCDRD`/`tRCDWR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Standard DDR: `activate_to_read`/`activate_to_write` both derive from
    /// `tRCD - AL`.
    #[default]
    Ddr,
    /// GDDR/HBM: read and write each have their own activate-to-access
    /// delay (`tRCDRD`/`tRCDWR`).
    Gddr,
}

/// Selects which controller/queue-selection strategy a channel uses.
///
/// Modeled as a tagged enum dispatched via `match` rather than as trait
/// objects — per-tick virtual dispatch on this hot path is avoided
/// deliberately (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoryType {
    /// Plain JEDEC DRAM, no PIM command path.
    #[default]
    Dram,
    /// Single-buffer PIM: a PIM burst locks out ordinary traffic on the
    /// issuing channel for its duration.
    Newton,
    /// Dual-buffer PIM: ordinary traffic on non-reserved rows may proceed
    /// in parallel with an in-flight PIM burst.
    Neupims,
}

impl MemoryType {
    /// Whether this memory type ever puts a channel into PIM mode.
    #[must_use]
    pub const fn has_pim(self) -> bool {
        !matches!(self, Self::Dram)
    }

    /// Whether ordinary traffic may proceed in parallel with an in-flight
    /// PIM burst on the same channel.
    #[must_use]
    pub const fn dual_buffer(self) -> bool {
        matches!(self, Self::Neupims)
    }
}

impl std::str::FromStr for MemoryType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAM" => Ok(Self::Dram),
            "NEWTON" => Ok(Self::Newton),
            "NEUPIMS" => Ok(Self::Neupims),
            other => Err(ConfigError::UnknownMemoryType(other.to_string())),
        }
    }
}

/// Per-channel command queue layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStructure {
    /// One FIFO per (rank, bankgroup, bank).
    #[default]
    PerBank,
    /// One FIFO per rank (strict cross-bank FIFO ordering).
    PerRank,
}

impl std::str::FromStr for QueueStructure {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PER_BANK" => Ok(Self::PerBank),
            "PER_RANK" => Ok(Self::PerRank),
            other => Err(ConfigError::UnknownQueueStructure(other.to_string())),
        }
    }
}

/// Root configuration structure containing every simulator setting.
///
/// # Examples
///
/// ```
/// use dram_pim_core::config::Config;
///
/// let json = r#"{"timing": {"burst_cycle": 8}}"#;
/// let cfg: Config = serde_json::from_str(json).expect("valid config");
/// assert_eq!(cfg.timing.burst_cycle, 8);
/// assert_eq!(cfg.channels.channels, 1);
/// cfg.validate().expect("defaults plus one override stay consistent");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Channel/rank/bankgroup/bank/row/column geometry.
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// JEDEC + PIM timing parameters.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Command queue layout.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Memory type (DRAM/NEWTON/NEUPIMS) and ideal-memory fallback latency.
    #[serde(default)]
    pub memory: MemoryTypeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            channels: ChannelsConfig::default(),
            timing: TimingConfig::default(),
            queue: QueueConfig::default(),
            memory: MemoryTypeConfig::default(),
        }
    }
}

impl Config {
    /// Validates cross-field consistency that individually-valid field
    /// values cannot rule out. Run once, at construction; never on the hot
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if channel geometry has a zero-sized field or
    /// timing parameters are internally inconsistent (e.g. a zero burst
    /// length, or an additive latency that exceeds the row-to-column delay
    /// it is subtracted from).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let geometry_fields: [(&'static str, usize); 6] = [
            ("channels", self.channels.channels),
            ("ranks", self.channels.ranks),
            ("bankgroups", self.channels.bankgroups),
            ("banks_per_group", self.channels.banks_per_group),
            ("rows", self.channels.rows),
            ("columns", self.channels.columns),
        ];
        for (field, value) in geometry_fields {
            if value == 0 {
                return Err(ConfigError::InvalidGeometry { field });
            }
        }

        if self.timing.burst_cycle == 0 {
            return Err(ConfigError::InconsistentTiming(
                "burst_cycle must be non-zero".to_string(),
            ));
        }
        if self.timing.al > self.timing.t_rcd {
            return Err(ConfigError::InconsistentTiming(
                "additive latency (al) exceeds tRCD".to_string(),
            ));
        }
        if self.timing.t_rfcb > self.timing.t_rfc {
            return Err(ConfigError::InconsistentTiming(
                "tRFCb exceeds tRFC".to_string(),
            ));
        }
        Ok(())
    }
}

/// General simulation settings: stats cadence and address tracing.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Cycle window between `print_epoch_stats` snapshots.
    #[serde(default = "GeneralConfig::default_epoch_period")]
    pub epoch_period: u64,

    /// When true, every accepted transaction's address is logged via
    /// `tracing::trace!` in addition to being counted.
    #[serde(default)]
    pub address_trace: bool,
}

impl GeneralConfig {
    fn default_epoch_period() -> u64 {
        defaults::EPOCH_PERIOD
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            epoch_period: defaults::EPOCH_PERIOD,
            address_trace: false,
        }
    }
}

/// Channel/rank/bankgroup/bank/row/column geometry.
///
/// Drives both [`crate::addr::AddressDecoder`] construction and the number
/// of per-(rank,bankgroup,bank) command queues a `PER_BANK` channel builds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChannelsConfig {
    /// Number of channels the top-level `DramSystem` fans out across.
    #[serde(default = "ChannelsConfig::default_channels")]
    pub channels: usize,
    /// Address bits dropped before field extraction.
    #[serde(default = "ChannelsConfig::default_shift_bits")]
    pub shift_bits: u32,
    /// Ranks per channel.
    #[serde(default = "ChannelsConfig::default_ranks")]
    pub ranks: usize,
    /// Bankgroups per rank.
    #[serde(default = "ChannelsConfig::default_bankgroups")]
    pub bankgroups: usize,
    /// Banks per bankgroup.
    #[serde(default = "ChannelsConfig::default_banks_per_group")]
    pub banks_per_group: usize,
    /// Rows per bank.
    #[serde(default = "ChannelsConfig::default_rows")]
    pub rows: usize,
    /// Columns per row.
    #[serde(default = "ChannelsConfig::default_columns")]
    pub columns: usize,
}

impl ChannelsConfig {
    fn default_channels() -> usize {
        defaults::CHANNELS
    }
    fn default_shift_bits() -> u32 {
        defaults::SHIFT_BITS
    }
    fn default_ranks() -> usize {
        defaults::RANKS
    }
    fn default_bankgroups() -> usize {
        defaults::BANKGROUPS
    }
    fn default_banks_per_group() -> usize {
        defaults::BANKS_PER_GROUP
    }
    fn default_rows() -> usize {
        defaults::ROWS
    }
    fn default_columns() -> usize {
        defaults::COLUMNS
    }

    /// Total bank count per channel (`ranks * bankgroups * banks_per_group`),
    /// the size of a `PER_BANK` channel's queue set.
    #[must_use]
    pub const fn banks_per_channel(&self) -> usize {
        self.ranks * self.bankgroups * self.banks_per_group
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            channels: defaults::CHANNELS,
            shift_bits: defaults::SHIFT_BITS,
            ranks: defaults::RANKS,
            bankgroups: defaults::BANKGROUPS,
            banks_per_group: defaults::BANKS_PER_GROUP,
            rows: defaults::ROWS,
            columns: defaults::COLUMNS,
        }
    }
}

/// JEDEC + PIM timing parameters, in DRAM cycles unless noted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimingConfig {
    /// Burst transfer length.
    #[serde(default = "TimingConfig::default_burst_cycle")]
    pub burst_cycle: u32,
    /// Column-to-column delay, same bankgroup.
    #[serde(default = "TimingConfig::default_t_ccd_l")]
    pub t_ccd_l: u32,
    /// Column-to-column delay, different bankgroup.
    #[serde(default = "TimingConfig::default_t_ccd_s")]
    pub t_ccd_s: u32,
    /// Rank switch penalty.
    #[serde(default = "TimingConfig::default_t_rtrs")]
    pub t_rtrs: u32,
    /// Read latency.
    #[serde(default = "TimingConfig::default_rl")]
    pub rl: u32,
    /// Write latency.
    #[serde(default = "TimingConfig::default_wl")]
    pub wl: u32,
    /// Read-to-precharge delay.
    #[serde(default = "TimingConfig::default_t_rtp")]
    pub t_rtp: u32,
    /// Additive latency.
    #[serde(default)]
    pub al: u32,
    /// Write-to-read delay, same bankgroup.
    #[serde(default = "TimingConfig::default_t_wtr_l")]
    pub t_wtr_l: u32,
    /// Write-to-read delay, different bankgroup.
    #[serde(default = "TimingConfig::default_t_wtr_s")]
    pub t_wtr_s: u32,
    /// Write recovery time.
    #[serde(default = "TimingConfig::default_t_wr")]
    pub t_wr: u32,
    /// Row precharge time.
    #[serde(default = "TimingConfig::default_t_rp")]
    pub t_rp: u32,
    /// Precharge-to-precharge delay.
    #[serde(default = "TimingConfig::default_t_ppd")]
    pub t_ppd: u32,
    /// Row cycle time.
    #[serde(default = "TimingConfig::default_t_rc")]
    pub t_rc: u32,
    /// Activate-to-activate delay, same bankgroup.
    #[serde(default = "TimingConfig::default_t_rrd_l")]
    pub t_rrd_l: u32,
    /// Activate-to-activate delay, different bankgroup.
    #[serde(default = "TimingConfig::default_t_rrd_s")]
    pub t_rrd_s: u32,
    /// Row active time.
    #[serde(default = "TimingConfig::default_t_ras")]
    pub t_ras: u32,
    /// Row-to-column delay (DDR protocol).
    #[serde(default = "TimingConfig::default_t_rcd")]
    pub t_rcd: u32,
    /// Activate-to-read delay (GDDR/HBM protocol).
    #[serde(default = "TimingConfig::default_t_rcdrd")]
    pub t_rcdrd: u32,
    /// Activate-to-write delay (GDDR/HBM protocol).
    #[serde(default = "TimingConfig::default_t_rcdwr")]
    pub t_rcdwr: u32,
    /// Rank-wide refresh cycle time.
    #[serde(default = "TimingConfig::default_t_rfc")]
    pub t_rfc: u32,
    /// Per-bank refresh cycle time.
    #[serde(default = "TimingConfig::default_t_rfcb")]
    pub t_rfcb: u32,
    /// Average refresh interval.
    #[serde(default = "TimingConfig::default_t_refi")]
    pub t_refi: u32,
    /// Self-refresh exit delay.
    #[serde(default = "TimingConfig::default_t_ckesr")]
    pub t_ckesr: u32,
    /// Self-refresh settle time.
    #[serde(default = "TimingConfig::default_t_xs")]
    pub t_xs: u32,
    /// Four-activate window.
    #[serde(default = "TimingConfig::default_t_faw")]
    pub t_faw: u32,
    /// `GWRITE`-to-follow-up delay.
    #[serde(default = "TimingConfig::default_gwrite_delay")]
    pub gwrite_delay: u32,
    /// DDR vs GDDR/HBM activate-to-access derivation.
    #[serde(default)]
    pub protocol: Protocol,
    /// Whether ordinary traffic may overlap an in-flight PIM burst.
    #[serde(default)]
    pub enable_dual_buffer: bool,
}

impl TimingConfig {
    fn default_burst_cycle() -> u32 {
        defaults::BURST_CYCLE
    }
    fn default_t_ccd_l() -> u32 {
        defaults::T_CCD_L
    }
    fn default_t_ccd_s() -> u32 {
        defaults::T_CCD_S
    }
    fn default_t_rtrs() -> u32 {
        defaults::T_RTRS
    }
    fn default_rl() -> u32 {
        defaults::RL
    }
    fn default_wl() -> u32 {
        defaults::WL
    }
    fn default_t_rtp() -> u32 {
        defaults::T_RTP
    }
    fn default_t_wtr_l() -> u32 {
        defaults::T_WTR_L
    }
    fn default_t_wtr_s() -> u32 {
        defaults::T_WTR_S
    }
    fn default_t_wr() -> u32 {
        defaults::T_WR
    }
    fn default_t_rp() -> u32 {
        defaults::T_RP
    }
    fn default_t_ppd() -> u32 {
        defaults::T_PPD
    }
    fn default_t_rc() -> u32 {
        defaults::T_RC
    }
    fn default_t_rrd_l() -> u32 {
        defaults::T_RRD_L
    }
    fn default_t_rrd_s() -> u32 {
        defaults::T_RRD_S
    }
    fn default_t_ras() -> u32 {
        defaults::T_RAS
    }
    fn default_t_rcd() -> u32 {
        defaults::T_RCD
    }
    fn default_t_rcdrd() -> u32 {
        defaults::T_RCDRD
    }
    fn default_t_rcdwr() -> u32 {
        defaults::T_RCDWR
    }
    fn default_t_rfc() -> u32 {
        defaults::T_RFC
    }
    fn default_t_rfcb() -> u32 {
        defaults::T_RFCB
    }
    fn default_t_refi() -> u32 {
        defaults::T_REFI
    }
    fn default_t_ckesr() -> u32 {
        defaults::T_CKESR
    }
    fn default_t_xs() -> u32 {
        defaults::T_XS
    }
    fn default_t_faw() -> u32 {
        defaults::T_FAW
    }
    fn default_gwrite_delay() -> u32 {
        defaults::GWRITE_DELAY
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            burst_cycle: defaults::BURST_CYCLE,
            t_ccd_l: defaults::T_CCD_L,
            t_ccd_s: defaults::T_CCD_S,
            t_rtrs: defaults::T_RTRS,
            rl: defaults::RL,
            wl: defaults::WL,
            t_rtp: defaults::T_RTP,
            al: defaults::AL,
            t_wtr_l: defaults::T_WTR_L,
            t_wtr_s: defaults::T_WTR_S,
            t_wr: defaults::T_WR,
            t_rp: defaults::T_RP,
            t_ppd: defaults::T_PPD,
            t_rc: defaults::T_RC,
            t_rrd_l: defaults::T_RRD_L,
            t_rrd_s: defaults::T_RRD_S,
            t_ras: defaults::T_RAS,
            t_rcd: defaults::T_RCD,
            t_rcdrd: defaults::T_RCDRD,
            t_rcdwr: defaults::T_RCDWR,
            t_rfc: defaults::T_RFC,
            t_rfcb: defaults::T_RFCB,
            t_refi: defaults::T_REFI,
            t_ckesr: defaults::T_CKESR,
            t_xs: defaults::T_XS,
            t_faw: defaults::T_FAW,
            gwrite_delay: defaults::GWRITE_DELAY,
            protocol: Protocol::Ddr,
            enable_dual_buffer: false,
        }
    }
}

/// Per-channel command queue layout and capacities.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QueueConfig {
    /// `PER_BANK` or `PER_RANK` FIFO layout.
    #[serde(default)]
    pub queue_structure: QueueStructure,
    /// Depth of each ordinary FIFO.
    #[serde(default = "QueueConfig::default_cmd_queue_size")]
    pub cmd_queue_size: usize,
    /// Depth of the dedicated PIM queue.
    #[serde(default = "QueueConfig::default_pim_cmd_queue_size")]
    pub pim_cmd_queue_size: usize,
}

impl QueueConfig {
    fn default_cmd_queue_size() -> usize {
        defaults::CMD_QUEUE_SIZE
    }
    fn default_pim_cmd_queue_size() -> usize {
        defaults::PIM_CMD_QUEUE_SIZE
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_structure: QueueStructure::default(),
            cmd_queue_size: defaults::CMD_QUEUE_SIZE,
            pim_cmd_queue_size: defaults::PIM_CMD_QUEUE_SIZE,
        }
    }
}

/// Memory type selector and the ideal-memory fallback's fixed latency.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MemoryTypeConfig {
    /// `DRAM`, `NEWTON`, or `NEUPIMS`.
    #[serde(default)]
    pub memory_type: MemoryType,
    /// Fixed latency used by `IdealDramSystem`, the external bypass path.
    #[serde(default = "MemoryTypeConfig::default_ideal_memory_latency")]
    pub ideal_memory_latency: u64,
}

impl MemoryTypeConfig {
    fn default_ideal_memory_latency() -> u64 {
        defaults::IDEAL_MEMORY_LATENCY
    }
}

impl Default for MemoryTypeConfig {
    fn default() -> Self {
        Self {
            memory_type: MemoryType::default(),
            ideal_memory_latency: defaults::IDEAL_MEMORY_LATENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().expect("defaults are consistent");
    }

    #[test]
    fn zero_geometry_field_is_rejected() {
        let mut cfg = Config::default();
        cfg.channels.banks_per_group = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidGeometry { field: "banks_per_group" })
        ));
    }

    #[test]
    fn al_exceeding_trcd_is_rejected() {
        let mut cfg = Config::default();
        cfg.timing.al = cfg.timing.t_rcd + 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InconsistentTiming(_))
        ));
    }

    #[test]
    fn memory_type_from_str_round_trips_known_values() {
        assert_eq!("DRAM".parse::<MemoryType>().unwrap(), MemoryType::Dram);
        assert_eq!("NEWTON".parse::<MemoryType>().unwrap(), MemoryType::Newton);
        assert_eq!("NEUPIMS".parse::<MemoryType>().unwrap(), MemoryType::Neupims);
        assert!("BOGUS".parse::<MemoryType>().is_err());
    }

    #[test]
    fn queue_structure_from_str_round_trips_known_values() {
        assert_eq!(
            "PER_BANK".parse::<QueueStructure>().unwrap(),
            QueueStructure::PerBank
        );
        assert_eq!(
            "PER_RANK".parse::<QueueStructure>().unwrap(),
            QueueStructure::PerRank
        );
        assert!("PER_CHANNEL".parse::<QueueStructure>().is_err());
    }

    #[test]
    fn deserializes_partial_json_with_field_defaults() {
        let json = r#"{"timing": {"burst_cycle": 8}, "queue": {"queue_structure": "PER_RANK"}}"#;
        let cfg: Config = serde_json::from_str(json).expect("valid partial config");
        assert_eq!(cfg.timing.burst_cycle, 8);
        assert_eq!(cfg.timing.t_rc, defaults::T_RC);
        assert_eq!(cfg.queue.queue_structure, QueueStructure::PerRank);
    }
}
