//! Two independent producer/consumer pairs, each over its own bounded queue.
//!
//! Prints `Received 10000000 in <seconds> seconds` at every milestone. By default the process
//! exits as soon as the first producer is done, possibly before the consumers print their last
//! milestone; pass `--await-all` to wait for them.

use log::error;
use ring_throughput::cli::{self, Command, PAIRS_USAGE};
use ring_throughput::harness::{self, Stdout};
use std::{env, process, sync::Arc};

fn main() {
    pretty_env_logger::init();

    let (config, exit) = match cli::pairs(env::args().skip(1)) {
        Ok(Command::Run(run)) => run,
        Ok(Command::Help) => return println!("{}", PAIRS_USAGE),
        Err(e) => {
            eprintln!("{}\n{}", e, PAIRS_USAGE);
            process::exit(2);
        }
    };

    // Must happen before the first task is spawned.
    env::set_var("SMOL_THREADS", num_cpus::get().to_string());

    if let Err(e) = smol::block_on(harness::run_pairs(config, exit, Arc::new(Stdout))) {
        error!("{}", e);
        process::exit(1);
    }
}
