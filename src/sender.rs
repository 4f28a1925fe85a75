use crate::{control::*, error::*, wait::SendFuture};
use derivative::Derivative;
use futures::executor::block_on;

/// The sending end of a [`bounded`] channel.
///
/// [`bounded`]: fn.bounded.html
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct BoundedSender<T>(#[derivative(Debug = "ignore")] pub(super) Endpoint<T>);

impl<T> BoundedSender<T> {
    /// Sends a message through the channel without blocking.
    ///
    /// * If the internal buffer has room, the message is pushed and one parked receiver is woken.
    /// * If the internal buffer is full, [`TrySendError::Full`] hands the message back.
    /// * If the channel is disconnected, [`TrySendError::Disconnected`] hands the message back.
    ///
    /// [`TrySendError::Full`]: enum.TrySendError.html#variant.Full
    /// [`TrySendError::Disconnected`]: enum.TrySendError.html#variant.Disconnected
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.0.try_send(value)
    }

    /// Sends a message through the channel, suspending the task while the buffer is full.
    ///
    /// Resolves to [`SendError::Disconnected`] if every receiver hangs up before there's room.
    /// Dropping the future before it resolves drops the message.
    ///
    /// [`SendError::Disconnected`]: enum.SendError.html#variant.Disconnected
    pub fn send(&self, value: T) -> SendFuture<'_, T> {
        SendFuture::new(&self.0, value)
    }

    /// Sends a message through the channel, parking the thread while the buffer is full.
    pub fn send_blocking(&self, value: T) -> Result<(), SendError<T>> {
        block_on(self.send(value))
    }

    /// The maximum number of pending messages.
    pub fn capacity(&self) -> usize {
        self.0.buffer.capacity()
    }

    /// The number of pending messages.
    pub fn len(&self) -> usize {
        self.0.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Whether every receiver has been dropped.
    pub fn is_disconnected(&self) -> bool {
        !self.0.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use futures::executor::block_on;
    use std::{num::NonZeroUsize, thread};
    use test_strategy::proptest;

    #[proptest]
    fn try_send_fills_the_buffer(#[strategy(1..=10usize)] capacity: usize) {
        let (tx, _rx) = bounded(NonZeroUsize::new(capacity).unwrap());

        for i in 0..capacity {
            assert_eq!(tx.len(), i);
            assert_eq!(tx.try_send(i), Ok(()));
        }

        assert!(tx.is_full());
        assert_eq!(tx.try_send(capacity), Err(TrySendError::Full(capacity)));
    }

    #[test]
    fn send_resolves_if_there_is_room() {
        let (tx, rx) = bounded(NonZeroUsize::new(1).unwrap());
        assert_eq!(block_on(tx.send("hello")), Ok(()));
        assert_eq!(rx.try_recv(), Ok("hello"));
    }

    #[test]
    fn send_fails_if_disconnected() {
        let (tx, rx) = bounded(NonZeroUsize::new(1).unwrap());
        drop(rx);
        assert!(tx.is_disconnected());
        assert_eq!(block_on(tx.send(1)), Err(SendError::Disconnected(1)));
    }

    #[test]
    fn send_blocking_waits_for_room() {
        let (tx, rx) = bounded(NonZeroUsize::new(1).unwrap());
        assert_eq!(tx.try_send(1), Ok(()));

        let consumer = thread::spawn(move || (rx.recv_blocking(), rx.recv_blocking()));

        assert_eq!(tx.send_blocking(2), Ok(()));
        assert_eq!(consumer.join().unwrap(), (Ok(1), Ok(2)));
    }

    #[test]
    fn send_blocking_fails_once_receivers_hang_up() {
        let (tx, rx) = bounded(NonZeroUsize::new(1).unwrap());
        assert_eq!(tx.try_send(1), Ok(()));

        let producer = thread::spawn(move || tx.send_blocking(2));

        drop(rx);
        assert_eq!(producer.join().unwrap(), Err(SendError::Disconnected(2)));
    }
}
