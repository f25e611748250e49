use std::process;
use clap::Parser;

#[macro_use]
extern crate log;

use logger::Logger;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Parse command line arguments and run `borice_rs::run()`
fn main() {
    // ----------------------------- Run CLI Parser
    let cli = parser::Cli::parse();

    // ----------------------------- Init logger.
    if let Err(e) = Logger::init(Logger::verbosity(cli.quiet, cli.verbose)) {
        eprintln!("{e}");
        process::exit(1);
    }

    // ----------------------------- Serialize command line arguments
    if let Err(e) = cli.serialize() {
        error!("{e:?}");
        process::exit(1);
    };

    // ----------------------------- unpack Cli and run the appropriate modules.
    if let Err(e) = borice_rs::run(cli) {
        error!("{e:?}");
        process::exit(1);
    };
}
