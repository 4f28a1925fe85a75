//! Producer/consumer throughput harness.
//!
//! Producers push `1, 2, …, send_count` into a shared [`bounded`] channel and consumers pop
//! exactly `send_count` values each. Every received value that is a multiple of the milestone
//! interval triggers a [`Milestone`] report with the time elapsed since the consumer's previous
//! milestone.
//!
//! [`bounded`]: ../fn.bounded.html
//! [`Milestone`]: struct.Milestone.html

use crate::{bounded, BoundedReceiver, BoundedSender};
use futures::{channel::mpsc, SinkExt, StreamExt};
use log::{debug, error, info};
use std::num::{NonZeroU64, NonZeroUsize};
use std::{fmt, sync::Arc, time::Duration, time::Instant};

#[cfg(test)]
use mockall::automock;

/// Slots in the queue shared by producers and consumers.
pub const CAPACITY: usize = 1000;

/// Number of messages between two throughput reports.
pub const MILESTONE: u64 = 10_000_000;

/// Producer/consumer pairs spawned by default.
pub const TASK_COUNT: usize = 2;

/// Messages sent by each producer by default.
pub const SEND_COUNT: u64 = 100_000_000;

/// Immutable parameters of a run, handed to every task by value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    /// Number of producer/consumer pairs.
    pub task_count: usize,

    /// Messages sent by each producer, and received by each consumer.
    pub send_count: u64,

    /// Capacity of the shared queue.
    pub capacity: NonZeroUsize,

    /// A consumer reports whenever it receives a multiple of this value.
    pub milestone: NonZeroU64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            task_count: TASK_COUNT,
            send_count: SEND_COUNT,
            capacity: NonZeroUsize::new(CAPACITY).unwrap_or(NonZeroUsize::MIN),
            milestone: NonZeroU64::new(MILESTONE).unwrap_or(NonZeroU64::MIN),
        }
    }
}

/// A task spawned by the harness.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Task {
    Producer(usize),
    Consumer(usize),
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Task::Producer(id) => write!(f, "producer {}", id),
            Task::Consumer(id) => write!(f, "consumer {}", id),
        }
    }
}

/// The only way a run can fail.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HarnessError {
    /// A channel hung up while the task was still sending or receiving.
    ChannelClosedUnexpectedly(Task),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HarnessError::ChannelClosedUnexpectedly(task) => {
                write!(f, "channel closed unexpectedly in {}", task)
            }
        }
    }
}

impl std::error::Error for HarnessError {}

/// Throughput observed by a consumer since its previous milestone.
///
/// Displays as `[<consumer> ]Received <messages> in <seconds> seconds`, with the seconds in
/// plain decimal notation even when tiny.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Milestone {
    /// The reporting consumer, if consumers are labeled.
    pub consumer: Option<usize>,

    /// Messages covered by this report.
    pub messages: u64,

    /// Wall-clock time since the previous milestone, or since the consumer started.
    pub elapsed: Duration,
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(id) = self.consumer {
            write!(f, "{} ", id)?;
        }

        // Plain decimal notation, never exponents: 10µs prints as 0.00001.
        let seconds = self.elapsed.as_nanos() as f64 / 1e9;
        write!(f, "Received {} in {} seconds", self.messages, seconds)
    }
}

/// Sink for milestone reports.
#[cfg_attr(test, automock)]
pub trait Reporter: Send + Sync {
    fn milestone(&self, milestone: &Milestone);
}

/// Prints one line per milestone on standard output.
#[derive(Debug, Default, Copy, Clone)]
pub struct Stdout;

impl Reporter for Stdout {
    fn milestone(&self, milestone: &Milestone) {
        println!("{}", milestone);
    }
}

/// What a run amounted to, as counted by the consumers.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Summary {
    pub consumers: usize,
    pub received: u64,
    pub milestones: u64,

    /// Wrapping sum of every value received.
    pub checksum: u64,
}

impl Summary {
    /// The checksum of a lossless run: `task_count` copies of `1..=send_count`.
    pub fn expected_checksum(config: &Config) -> u64 {
        let n = config.send_count as u128;
        let sum = n * (n + 1) / 2 * config.task_count as u128;
        sum as u64
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Completion {
    consumer: usize,
    received: u64,
    milestones: u64,
    checksum: u64,
}

async fn produce(id: usize, tx: BoundedSender<u64>, config: Config) -> Result<(), HarnessError> {
    debug!("producer {} started", id);

    for n in 1..=config.send_count {
        tx.send(n)
            .await
            .map_err(|_| HarnessError::ChannelClosedUnexpectedly(Task::Producer(id)))?;
    }

    debug!("producer {} done", id);
    Ok(())
}

async fn consume<R: Reporter + ?Sized>(
    id: usize,
    label: Option<usize>,
    rx: BoundedReceiver<u64>,
    config: Config,
    reporter: Arc<R>,
) -> Result<Completion, HarnessError> {
    debug!("consumer {} started", id);

    let interval = config.milestone.get();
    let (mut received, mut milestones, mut checksum) = (0, 0, 0u64);
    let mut last = Instant::now();

    for _ in 0..config.send_count {
        let n = rx
            .recv()
            .await
            .map_err(|_| HarnessError::ChannelClosedUnexpectedly(Task::Consumer(id)))?;

        received += 1;
        checksum = checksum.wrapping_add(n);

        // Triggered by the value received, not by how many values were received.
        if n % interval == 0 {
            let now = Instant::now();

            reporter.milestone(&Milestone {
                consumer: label,
                messages: interval,
                elapsed: now - last,
            });

            milestones += 1;
            last = now;
        }
    }

    debug!("consumer {} done", id);

    Ok(Completion {
        consumer: id,
        received,
        milestones,
        checksum,
    })
}

/// Runs `task_count` producers and `task_count` consumers over a single shared queue.
///
/// Returns once every consumer has signaled that it received its quota.
/// Consumers are labeled with their index in milestone reports.
pub async fn run<R: Reporter + ?Sized + 'static>(
    config: Config,
    reporter: Arc<R>,
) -> Result<Summary, HarnessError> {
    info!(
        "running {} producers and {} consumers, {} messages each",
        config.task_count, config.task_count, config.send_count
    );

    let (tx, rx) = bounded(config.capacity);
    let (done, mut signals) = mpsc::channel(0);
    let mut producers = Vec::with_capacity(config.task_count);

    for id in 0..config.task_count {
        let (rx, reporter, mut done) = (rx.clone(), reporter.clone(), done.clone());

        smol::spawn(async move {
            let completion = consume(id, Some(id), rx, config, reporter).await;
            if done.send(completion).await.is_err() {
                debug!("consumer {} outlived the run", id);
            }
        })
        .detach();

        producers.push(smol::spawn(produce(id, tx.clone(), config)));
    }

    // Only the spawned tasks may keep the queue connected.
    drop((tx, rx, done));

    let mut summary = Summary::default();
    let mut reported = vec![false; config.task_count];

    for _ in 0..config.task_count {
        let completion = match signals.next().await {
            Some(completion) => completion,
            None => {
                let id = reported.iter().position(|&r| !r).unwrap_or_default();
                Err(HarnessError::ChannelClosedUnexpectedly(Task::Consumer(id)))
            }
        };

        let Completion {
            consumer,
            received,
            milestones,
            checksum,
        } = completion?;

        debug!(
            "consumer {} received {} values, {} milestones",
            consumer, received, milestones
        );

        reported[consumer] = true;
        summary.consumers += 1;
        summary.received += received;
        summary.milestones += milestones;
        summary.checksum = summary.checksum.wrapping_add(checksum);
    }

    for producer in producers {
        producer.await?;
    }

    info!("{:?}", summary);
    Ok(summary)
}

/// Whether [`run_pairs`] waits for its background tasks.
///
/// [`run_pairs`]: fn.run_pairs.html
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Exit {
    /// Return as soon as the first pair's producer is done.
    ///
    /// Background consumers may still be receiving, so a process exiting right after may
    /// cut their last milestone short.
    Detached,

    /// Return once every producer and consumer is done.
    AwaitAll,
}

/// Runs `task_count` independent pairs, each a producer and a consumer over its own queue.
///
/// The first pair's producer runs on the calling task, everything else is spawned.
/// Milestone reports are unlabeled.
pub async fn run_pairs<R: Reporter + ?Sized + 'static>(
    config: Config,
    exit: Exit,
    reporter: Arc<R>,
) -> Result<(), HarnessError> {
    info!(
        "running {} producer/consumer pairs, {} messages each",
        config.task_count, config.send_count
    );

    let mut inline = None;
    let mut consumers = Vec::new();
    let mut producers = Vec::new();

    for id in 0..config.task_count {
        let (tx, rx) = bounded(config.capacity);
        let consumer = consume(id, None, rx, config, reporter.clone());

        match exit {
            Exit::AwaitAll => consumers.push(smol::spawn(consumer)),
            Exit::Detached => smol::spawn(async move {
                if let Err(e) = consumer.await {
                    error!("{}", e);
                }
            })
            .detach(),
        }

        if id == 0 {
            inline = Some(tx);
        } else {
            let producer = smol::spawn(produce(id, tx, config));

            match exit {
                Exit::AwaitAll => producers.push(producer),
                Exit::Detached => producer.detach(),
            }
        }
    }

    if let Some(tx) = inline {
        produce(0, tx, config).await?;
    }

    for producer in producers {
        producer.await?;
    }

    for consumer in consumers {
        consumer.await?;
    }

    Ok(())
}
