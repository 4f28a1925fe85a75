//! Blocking, bounded MPMC channel on top of a ring buffer, and a throughput harness around it.
//!
//! # Overview
//!
//! This crate provides a flavor of message passing that never loses messages. Under the hood,
//! [`bounded`] is a thin layer on top of a lock-free MPMC ring buffer of fixed capacity.
//! Senders suspend while the buffer is full and receivers suspend while it is empty, either
//! as futures or by parking the calling thread.
//!
//! The [`harness`] module drives integer traffic through such a channel from any number of
//! producer and consumer tasks, reporting how long each consumer takes per milestone.
//!
//! [`bounded`]: fn.bounded.html
//! [`harness`]: harness/index.html
//!
//! # Hello, world!
//!
//! ```rust
//! use ring_throughput::*;
//! use std::num::NonZeroUsize;
//!
//! // Open the channel.
//! let (tx, rx) = bounded(NonZeroUsize::new(1).unwrap());
//!
//! // Send a message through the inbound endpoint.
//! tx.try_send("Hello, world!").unwrap();
//!
//! // The buffer is full, so the message is handed back.
//! assert_eq!(tx.try_send("Hi!"), Err(TrySendError::Full("Hi!")));
//!
//! // Receive the message through the outbound endpoint.
//! assert_eq!(rx.try_recv(), Ok("Hello, world!"));
//! ```
//!
//! # Communicating across tasks
//!
//! Endpoints are just handles that may be cloned and sent to other threads or tasks.
//! They come in two flavors that allow sending and receiving messages through the channel,
//! respectively [`BoundedSender`] and [`BoundedReceiver`]. Cloning an endpoint produces a new
//! handle of the same kind associated with the same channel.
//! The channel lives as long as there is an endpoint associated with it.
//!
//! [`BoundedSender`]: struct.BoundedSender.html
//! [`BoundedReceiver`]: struct.BoundedReceiver.html
//!
//! ```rust
//! use futures::{future::join_all, StreamExt};
//! use ring_throughput::*;
//! use std::num::NonZeroUsize;
//!
//! let (tx, rx) = bounded(NonZeroUsize::new(4).unwrap());
//!
//! let producers: Vec<_> = (0..4)
//!     .map(|i| {
//!         let tx = tx.clone();
//!         smol::spawn(async move {
//!             for n in 1..=100u64 {
//!                 tx.send(i * 1000 + n).await.unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//!
//! // The channel disconnects once every producer is done.
//! drop(tx);
//!
//! let received = smol::block_on(async {
//!     join_all(producers).await;
//!     rx.collect::<Vec<_>>().await
//! });
//!
//! assert_eq!(received.len(), 400);
//! ```
//!
//! # Disconnection
//!
//! When all endpoints of one type get dropped, the channel becomes disconnected and every
//! suspended task is woken up. Attempting to send a message through a disconnected channel
//! returns an error. Receiving messages through a disconnected channel succeeds as long as
//! there are pending messages and an error is returned once all of them have been received.
//!
//! ```rust
//! use ring_throughput::*;
//! use std::num::NonZeroUsize;
//!
//! let (tx1, rx) = bounded(NonZeroUsize::new(3).unwrap());
//!
//! let tx2 = tx1.clone();
//! let tx3 = tx2.clone();
//!
//! tx1.send_blocking(1).unwrap();
//! tx2.send_blocking(2).unwrap();
//! tx3.send_blocking(3).unwrap();
//!
//! // All senders are dropped, so the channel becomes disconnected.
//! drop((tx1, tx2, tx3));
//!
//! // Pending messages can still be received.
//! assert_eq!(rx.recv_blocking(), Ok(1));
//! assert_eq!(rx.recv_blocking(), Ok(2));
//! assert_eq!(rx.recv_blocking(), Ok(3));
//!
//! // Finally, the channel reports itself as disconnected.
//! assert_eq!(rx.recv_blocking(), Err(RecvError::Disconnected));
//! ```

mod buffer;
mod control;
mod error;
mod receiver;
mod sender;
mod wait;
mod waitlist;

pub mod cli;
pub mod harness;

pub use error::*;
pub use receiver::*;
pub use sender::*;
pub use wait::{RecvFuture, SendFuture};

use std::num::NonZeroUsize;

/// Opens a multi-producer multi-consumer channel backed by a bounded ring buffer.
///
/// The associated ring buffer can contain up to `capacity` pending messages.
///
/// Sending through this channel suspends while the buffer is full and receiving suspends
/// while it is empty; no message is ever dropped or overwritten.
///
/// # Examples
///
/// ```rust,no_run
/// use ring_throughput::*;
/// use std::num::NonZeroUsize;
/// use std::thread;
/// use std::time::Instant;
///
/// fn main() {
///     // A small buffer keeps the producer at most 16 messages ahead of the consumer.
///     let (tx, rx) = bounded(NonZeroUsize::new(16).unwrap());
///
///     thread::spawn(move || {
///         for n in 1..=1_000_000u64 {
///             tx.send_blocking(n).unwrap();
///         }
///     });
///
///     let start = Instant::now();
///     while let Ok(n) = rx.recv_blocking() {
///         if n % 100_000 == 0 {
///             println!("{} after {:?}", n, start.elapsed());
///         }
///     }
/// }
/// ```
pub fn bounded<T>(capacity: NonZeroUsize) -> (BoundedSender<T>, BoundedReceiver<T>) {
    let (tx, rx) = control::endpoints(capacity.get());
    (BoundedSender(tx), BoundedReceiver::new(rx))
}
