use std::sync::{Arc, Mutex};

use dram_pim_core::command::{CommandKind, Decoded, Transaction, TransactionKind};
use dram_pim_core::config::Config;
use dram_pim_core::controller::Controller;
use dram_pim_core::timing::TimingTable;

/// Wraps a single-channel `Controller`, recording every issued command and
/// every completed transaction so scenario tests can assert on ordering.
pub struct ChannelHarness {
    pub controller: Controller,
    clk: u64,
    reads_done: Arc<Mutex<Vec<u64>>>,
    writes_done: Arc<Mutex<Vec<u64>>>,
    issued: Vec<(u64, CommandKind)>,
}

impl ChannelHarness {
    /// Builds a harness from `cfg`, wiring completion callbacks into
    /// in-memory traces retrievable via `reads`/`writes`.
    #[must_use]
    pub fn new(cfg: &Config) -> Self {
        let timing = TimingTable::new(&cfg.timing);
        Self {
            controller: Controller::new(0, cfg, timing),
            clk: 0,
            reads_done: Arc::new(Mutex::new(Vec::new())),
            writes_done: Arc::new(Mutex::new(Vec::new())),
            issued: Vec::new(),
        }
    }

    /// Submits a read at `(rank, bg, bank, row, col)`. Panics if the queue
    /// rejects it (tests size their own traffic against queue capacity).
    pub fn submit_read(&mut self, rank: usize, bg: usize, bank: usize, row: u32, col: u32) {
        self.submit(TransactionKind::Read, rank, bg, bank, row, col);
    }

    /// Submits a write at `(rank, bg, bank, row, col)`.
    pub fn submit_write(&mut self, rank: usize, bg: usize, bank: usize, row: u32, col: u32) {
        self.submit(TransactionKind::Write, rank, bg, bank, row, col);
    }

    /// Submits a `GWRITE` targeting `(rank, bg, bank, row)`.
    pub fn submit_gwrite(&mut self, rank: usize, bg: usize, bank: usize, row: u32) {
        self.submit(TransactionKind::Gwrite, rank, bg, bank, row, 0);
    }

    /// Submits a fused compute-and-readback burst targeting
    /// `(rank, bg, bank, row)`.
    pub fn submit_comps_readres(&mut self, rank: usize, bg: usize, bank: usize, row: u32) {
        self.submit(TransactionKind::CompsReadRes, rank, bg, bank, row, 0);
    }

    fn submit(&mut self, kind: TransactionKind, rank: usize, bg: usize, bank: usize, row: u32, col: u32) {
        let decoded = Decoded {
            channel: 0,
            rank,
            bankgroup: bg,
            bank,
            row,
            column: col,
        };
        let address = address_from(decoded);
        let txn = Transaction::new(address, kind, self.clk);
        assert!(
            self.controller.add_transaction(&txn, decoded),
            "harness traffic must fit queue capacity"
        );
    }

    /// Advances one cycle, recording the issued command (if any) and
    /// dispatching completions into the read/write traces.
    pub fn tick(&mut self) {
        let reads = self.reads_done.clone();
        let writes = self.writes_done.clone();
        self.controller.tick(
            &mut move |addr| reads.lock().unwrap_or_else(|e| e.into_inner()).push(addr),
            &mut move |addr| writes.lock().unwrap_or_else(|e| e.into_inner()).push(addr),
        );
        if let Some(cmd) = self.controller.last_issued() {
            self.issued.push((self.clk, cmd.kind));
        }
        self.clk += 1;
    }

    /// Advances `cycles` cycles.
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    /// The sequence of `(cycle, kind)` issued so far, in issue order.
    #[must_use]
    pub fn issued(&self) -> &[(u64, CommandKind)] {
        &self.issued
    }

    /// The sequence of issued kinds, dropping cycle numbers.
    #[must_use]
    pub fn issued_kinds(&self) -> Vec<CommandKind> {
        self.issued.iter().map(|(_, k)| *k).collect()
    }

    /// Addresses whose read callback has fired so far.
    #[must_use]
    pub fn reads(&self) -> Vec<u64> {
        self.reads_done.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Addresses whose write callback has fired so far.
    #[must_use]
    pub fn writes(&self) -> Vec<u64> {
        self.writes_done.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current cycle.
    #[must_use]
    pub const fn clk(&self) -> u64 {
        self.clk
    }
}

/// A stable, injective-enough packing of decoded fields into a byte address
/// for traces where only the test's own book-keeping reads it back
/// (the harness never decodes it again through `AddressDecoder`).
fn address_from(d: Decoded) -> u64 {
    ((d.rank as u64) << 40)
        | ((d.bankgroup as u64) << 36)
        | ((d.bank as u64) << 32)
        | ((d.row as u64) << 12)
        | (d.column as u64)
}
