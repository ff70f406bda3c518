//! continuity CLI entry point
//!
//! Parses nothing and loads nothing itself: all logic is delegated to the
//! CLI module. Exits non-zero on failure.

use continuity::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
