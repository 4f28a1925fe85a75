//! N producers and N consumers over a single bounded queue.
//!
//! Prints `<consumer> Received 10000000 in <seconds> seconds` at every milestone.

use log::error;
use ring_throughput::cli::{self, Command, THROUGHPUT_USAGE};
use ring_throughput::harness::{self, Stdout};
use std::{env, process, sync::Arc};

fn main() {
    pretty_env_logger::init();

    let config = match cli::throughput(env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => return println!("{}", THROUGHPUT_USAGE),
        Err(e) => {
            eprintln!("{}\n{}", e, THROUGHPUT_USAGE);
            process::exit(2);
        }
    };

    // Must happen before the first task is spawned.
    env::set_var("SMOL_THREADS", num_cpus::get().to_string());

    if let Err(e) = smol::block_on(harness::run(config, Arc::new(Stdout))) {
        error!("{}", e);
        process::exit(1);
    }
}
