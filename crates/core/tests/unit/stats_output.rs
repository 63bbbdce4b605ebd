//! `print_epoch_stats`/`print_final_stats` JSON output, written to and read
//! back from a real file rather than an in-memory buffer, exercising the
//! same `std::io::Write` path a caller driving a full simulation run would.

use std::fs::File;
use std::io::Read;

use dram_pim_core::config::Config;
use dram_pim_core::DramSystem;
use tempfile::NamedTempFile;

#[test]
fn final_stats_round_trip_through_a_file() {
    let cfg = Config::default();
    let mut system = DramSystem::new(&cfg).expect("default config must be valid");
    system.register_callbacks(Box::new(|_| {}), Box::new(|_| {}));

    for _ in 0..50 {
        system.tick();
    }
    system.print_epoch_stats();
    for _ in 0..50 {
        system.tick();
    }
    system.print_epoch_stats();

    let file = NamedTempFile::new().expect("tempfile creation must succeed");
    system.print_final_stats(file.reopen().expect("reopen must succeed")).expect("serialization must succeed");

    let mut contents = String::new();
    File::open(file.path()).expect("path must be readable").read_to_string(&mut contents).expect("must be valid UTF-8");

    let parsed: serde_json::Value = serde_json::from_str(&contents).expect("output must be valid JSON");
    let epochs = parsed["epochs"].as_array().expect("epochs must be a JSON array");
    assert_eq!(epochs.len(), 2, "one entry per print_epoch_stats call");
    assert!(parsed["final"].is_array(), "final must report one snapshot per channel");
    assert!(parsed["pim_cycles"].is_number(), "pim_cycles must be reported as a number");
}
