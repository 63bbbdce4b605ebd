//! The transaction/command data model.
//!
//! A [`Transaction`] is what the accelerator submits; it is translated into
//! one or more [`Command`]s, which are what actually move through a
//! [`crate::command_queue::CommandQueue`] and get issued against
//! [`crate::channel_state::ChannelState`].

/// The kind of transaction an accelerator can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// An ordinary memory read.
    Read,
    /// An ordinary memory write.
    Write,
    /// Broadcasts PIM weights into a row ("global write").
    Gwrite,
    /// A PIM compute (MAC) step.
    Comp,
    /// Reads back a PIM compute result.
    ReadRes,
    /// A fused compute-and-readback burst.
    CompsReadRes,
}

impl TransactionKind {
    /// Whether this transaction kind travels through the PIM command queue
    /// rather than an ordinary per-bank/per-rank queue.
    #[must_use]
    pub const fn is_pim(self) -> bool {
        matches!(
            self,
            Self::Gwrite | Self::Comp | Self::ReadRes | Self::CompsReadRes
        )
    }
}

/// A request submitted by the accelerator: an address and an access kind.
///
/// Created on ingress (`Controller::add_transaction`) and destroyed once its
/// completion callback has fired.
#[derive(Debug, Clone, Copy)]
pub struct Transaction {
    /// Raw byte address as submitted by the caller.
    pub address: u64,
    /// What kind of access this is.
    pub kind: TransactionKind,
    /// The cycle this transaction was accepted into a queue.
    pub enqueue_cycle: u64,
    /// The cycle its data becomes available, once known (set when the
    /// command(s) it expands to are issued).
    pub complete_cycle: Option<u64>,
}

impl Transaction {
    /// Creates a new transaction, recording its arrival cycle.
    #[must_use]
    pub const fn new(address: u64, kind: TransactionKind, enqueue_cycle: u64) -> Self {
        Self {
            address,
            kind,
            enqueue_cycle,
            complete_cycle: None,
        }
    }
}

/// Every DRAM/PIM command kind this subsystem can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Column read.
    Read,
    /// Column write.
    Write,
    /// Column read, closing the row afterward (auto-precharge).
    ReadPrecharge,
    /// Column write, closing the row afterward (auto-precharge).
    WritePrecharge,
    /// Opens a row.
    Activate,
    /// Closes the open row of a bank.
    Precharge,
    /// Rank-wide refresh.
    Refresh,
    /// Per-bank refresh.
    RefreshBank,
    /// Enter self-refresh (low power).
    SrefEnter,
    /// Exit self-refresh.
    SrefExit,
    /// Broadcasts PIM weights ("global write").
    Gwrite,
    /// Activates a row in PIM compute mode.
    GAct,
    /// A single PIM compute (MAC) step.
    Comp,
    /// Reads back a PIM compute result.
    ReadRes,
    /// Fused compute-and-readback, parameterized by `num_comps`.
    CompsReadRes,
    /// Closes a row opened for PIM compute.
    PimPrecharge,
    /// PIM-side write (scratch accumulator write-back).
    Pwrite,
    /// Carries burst parameters (`num_comps`, `num_readres`, target row) for
    /// the PIM commands that follow it; not itself a DRAM bus command.
    PimHeader,
}

impl CommandKind {
    /// Whether this is a plain `Read`/`Write` (not `*Precharge`, not PIM).
    #[must_use]
    pub const fn is_read_write(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }

    /// Whether this kind belongs to the PIM command family (excluding the
    /// header, which is metadata rather than a bus command).
    #[must_use]
    pub const fn is_pim_command(self) -> bool {
        matches!(
            self,
            Self::Gwrite
                | Self::GAct
                | Self::Comp
                | Self::ReadRes
                | Self::CompsReadRes
                | Self::PimPrecharge
                | Self::Pwrite
        )
    }

    /// Whether this kind is ever stored directly as a queue entry (as
    /// opposed to a structural prerequisite like `ACTIVATE`/`PRECHARGE`/
    /// `G_ACT` that `ChannelState::get_ready_command` synthesizes on the
    /// way to issuing the real pending entry). Only queue-entry kinds are
    /// erased from a queue on issue.
    #[must_use]
    pub const fn is_queue_entry_kind(self) -> bool {
        matches!(
            self,
            Self::Read
                | Self::Write
                | Self::ReadPrecharge
                | Self::WritePrecharge
                | Self::Gwrite
                | Self::Comp
                | Self::ReadRes
                | Self::CompsReadRes
                | Self::Pwrite
        )
    }

    /// Whether the completion of this command should be reported through the
    /// read callback. Per the original controller, every PIM-family
    /// completion (including `Gwrite`) is reported as a "read" to the
    /// upstream scratchpad, not a write.
    #[must_use]
    pub const fn completes_as_read(self) -> bool {
        matches!(
            self,
            Self::Read | Self::ReadPrecharge | Self::Gwrite | Self::Comp | Self::ReadRes | Self::CompsReadRes
        )
    }

    /// Whether this command reports completion through the write callback.
    #[must_use]
    pub const fn completes_as_write(self) -> bool {
        matches!(self, Self::Write | Self::WritePrecharge)
    }
}

/// The decoded JEDEC address fields a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decoded {
    /// Channel index.
    pub channel: usize,
    /// Rank index within the channel.
    pub rank: usize,
    /// Bankgroup index within the rank.
    pub bankgroup: usize,
    /// Bank index within the bankgroup.
    pub bank: usize,
    /// Row index within the bank.
    pub row: u32,
    /// Column index within the row.
    pub column: u32,
}

/// Extra fields carried by PIM commands: burst shape and completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PimMeta {
    /// Number of `Comp` steps in the burst this command belongs to, or the
    /// compute-cycle count for a fused `CompsReadRes`.
    pub num_comps: u16,
    /// Number of `ReadRes` steps in the burst this command belongs to.
    pub num_readres: u16,
    /// Whether this is the last command of its PIM burst; clears
    /// `is_pim_mode`/`is_gwriting` on the issuing channel when erased.
    pub is_last: bool,
}

/// A single DRAM/PIM bus command.
///
/// Created by command translation from a [`Transaction`]; destroyed after
/// issue, once its effect on [`crate::channel_state::ChannelState`] and its
/// completion event have both been recorded.
#[derive(Debug, Clone, Copy)]
pub struct Command {
    /// What kind of command this is.
    pub kind: CommandKind,
    /// The originating transaction's address (kept for completion callback
    /// and queue-equality matching during erase).
    pub address: u64,
    /// Decoded addressing fields.
    pub decoded: Decoded,
    /// PIM burst metadata; zeroed/irrelevant for non-PIM commands.
    pub pim: PimMeta,
}

impl Command {
    /// Builds a plain (non-PIM) command.
    #[must_use]
    pub const fn new(kind: CommandKind, address: u64, decoded: Decoded) -> Self {
        Self {
            kind,
            address,
            decoded,
            pim: PimMeta {
                num_comps: 0,
                num_readres: 0,
                is_last: false,
            },
        }
    }

    /// Builds a PIM command carrying burst metadata.
    #[must_use]
    pub const fn new_pim(kind: CommandKind, address: u64, decoded: Decoded, pim: PimMeta) -> Self {
        Self {
            kind,
            address,
            decoded,
            pim,
        }
    }

    /// Whether two commands refer to the same queue entry (same address and
    /// kind) — used when erasing a command from its queue after issue.
    #[must_use]
    pub fn same_entry(&self, other: &Self) -> bool {
        self.address == other.address && self.kind == other.kind
    }
}

/// The five locality classes the timing table distinguishes, from the
/// perspective of a just-issued command looking at a candidate next command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locality {
    /// Same (rank, bankgroup, bank).
    SameBank,
    /// Same rank and bankgroup, different bank.
    OtherBanksSameBg,
    /// Same rank, different bankgroup.
    OtherBgsSameRank,
    /// Different rank.
    OtherRanks,
    /// Same rank (bankgroup/bank irrelevant) — used for rank-wide commands
    /// like `Refresh`/`Gwrite`.
    SameRank,
}

impl Locality {
    /// All locality classes, in the order the timing table must be queried
    /// for a candidate command — see `TimingTable::next_allowed_gap`.
    pub const ALL: [Self; 5] = [
        Self::SameBank,
        Self::OtherBanksSameBg,
        Self::OtherBgsSameRank,
        Self::OtherRanks,
        Self::SameRank,
    ];

    /// Classifies the locality of `next` relative to `issued`.
    #[must_use]
    pub fn classify(issued: &Decoded, next: &Decoded) -> Self {
        if issued.rank != next.rank {
            Self::OtherRanks
        } else if issued.bankgroup != next.bankgroup {
            Self::OtherBgsSameRank
        } else if issued.bank != next.bank {
            Self::OtherBanksSameBg
        } else {
            Self::SameBank
        }
    }
}
