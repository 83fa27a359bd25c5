//! `stapc` binary entry point.
//!
//! # Exit codes
//! - `0` — success
//! - `1` — any non-recoverable error (parse, semantic, derivation, inference)

fn main() {
    env_logger::init();
    if let Err(e) = stapc_cli::run_cli() {
        eprintln!("stapc: {e}");
        std::process::exit(1);
    }
}
