#![no_main]

use futures::executor::block_on;
use libfuzzer_sys::fuzz_target;
use ring_throughput::harness::{run, run_pairs, Config, Exit, Milestone, Reporter, Summary};
use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::{atomic::AtomicU64, atomic::Ordering, Arc};

#[derive(Default)]
struct Tally {
    reports: AtomicU64,
    messages: AtomicU64,
}

impl Reporter for Tally {
    fn milestone(&self, milestone: &Milestone) {
        self.reports.fetch_add(1, Ordering::Relaxed);
        self.messages.fetch_add(milestone.messages, Ordering::Relaxed);
    }
}

fuzz_target!(|input: (u8, u16, u16, u8, bool)| {
    let (tasks, send_count, milestone, capacity, pairs) = input;

    let (capacity, milestone) = match (
        NonZeroUsize::new(capacity as usize),
        NonZeroU64::new(milestone as u64),
    ) {
        (Some(c), Some(m)) => (c, m),
        _ => return,
    };

    let config = Config {
        task_count: tasks as usize % 8,
        send_count: send_count as u64 % 4096,
        capacity,
        milestone,
    };

    let expected = config.task_count as u64 * (config.send_count / milestone.get());
    let tally = Arc::new(Tally::default());

    if pairs {
        assert_eq!(
            block_on(run_pairs(config, Exit::AwaitAll, tally.clone())),
            Ok(()),
            "awaited pairs never fail"
        );
    } else {
        let summary = block_on(run(config, tally.clone())).expect("a lossless run never fails");

        assert_eq!(summary.consumers, config.task_count);
        assert_eq!(
            summary.received,
            config.task_count as u64 * config.send_count,
            "every consumer receives its quota"
        );

        assert_eq!(
            summary.checksum,
            Summary::expected_checksum(&config),
            "every value sent is received exactly once"
        );

        assert_eq!(summary.milestones, expected);
    }

    assert_eq!(
        tally.reports.load(Ordering::Relaxed),
        expected,
        "one report per multiple of the milestone sent by each producer"
    );

    assert_eq!(
        tally.messages.load(Ordering::Relaxed),
        expected * milestone.get()
    );
});
