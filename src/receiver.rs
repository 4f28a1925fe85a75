use crate::wait::{release, RecvFuture};
use crate::{control::*, error::*, waitlist::Slot};
use derivative::Derivative;
use futures::executor::block_on;

/// The receiving end of a [`bounded`] channel.
///
/// [`bounded`]: fn.bounded.html
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct BoundedReceiver<T> {
    #[derivative(Debug = "ignore")]
    pub(super) endpoint: Endpoint<T>,

    // Registration kept across polls of the stream.
    pub(super) slot: Option<Slot>,
}

impl<T> BoundedReceiver<T> {
    pub(super) fn new(endpoint: Endpoint<T>) -> Self {
        BoundedReceiver {
            endpoint,
            slot: None,
        }
    }

    /// Receives a message through the channel without blocking.
    ///
    /// * If the internal buffer isn't empty, the oldest pending message is returned.
    /// * If the internal buffer is empty, [`TryRecvError::Empty`] is returned.
    /// * If the channel is disconnected and the internal buffer is empty,
    /// [`TryRecvError::Disconnected`] is returned.
    ///
    /// [`TryRecvError::Empty`]: enum.TryRecvError.html#variant.Empty
    /// [`TryRecvError::Disconnected`]: enum.TryRecvError.html#variant.Disconnected
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.endpoint.try_recv()
    }

    /// Receives a message through the channel, suspending the task while the buffer is empty.
    ///
    /// Resolves to [`RecvError::Disconnected`] once every sender hangs up and no messages
    /// remain pending.
    ///
    /// [`RecvError::Disconnected`]: enum.RecvError.html#variant.Disconnected
    pub fn recv(&self) -> RecvFuture<'_, T> {
        RecvFuture::new(&self.endpoint)
    }

    /// Receives a message through the channel, parking the thread while the buffer is empty.
    pub fn recv_blocking(&self) -> Result<T, RecvError> {
        block_on(self.recv())
    }

    /// The maximum number of pending messages.
    pub fn capacity(&self) -> usize {
        self.endpoint.buffer.capacity()
    }

    /// The number of pending messages.
    pub fn len(&self) -> usize {
        self.endpoint.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Whether every sender has been dropped.
    pub fn is_disconnected(&self) -> bool {
        !self.endpoint.is_connected()
    }
}

impl<T> Clone for BoundedReceiver<T> {
    fn clone(&self) -> Self {
        BoundedReceiver::new(self.endpoint.clone())
    }
}

impl<T> Drop for BoundedReceiver<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            release(&self.endpoint.arrival, slot);
        }
    }
}
