use crate::{buffer::*, error::*, waitlist::*};
use crossbeam_utils::CachePadded;
use derivative::Derivative;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::{ops::Deref, sync::Arc};

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub(super) struct ControlBlock<T> {
    pub(super) senders: CachePadded<AtomicUsize>,
    pub(super) receivers: CachePadded<AtomicUsize>,
    pub(super) connected: AtomicBool,
    pub(super) buffer: RingBuffer<T>,

    /// Senders parked on a full buffer.
    pub(super) vacancy: Waitlist,

    /// Receivers parked on an empty buffer.
    pub(super) arrival: Waitlist,
}

impl<T> ControlBlock<T> {
    fn new(capacity: usize) -> Self {
        Self {
            senders: CachePadded::new(AtomicUsize::new(1)),
            receivers: CachePadded::new(AtomicUsize::new(1)),
            connected: AtomicBool::new(true),
            buffer: RingBuffer::new(capacity),
            vacancy: Waitlist::new(),
            arrival: Waitlist::new(),
        }
    }

    #[inline]
    pub(super) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(super) fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        if !self.is_connected() {
            return Err(TrySendError::Disconnected(value));
        }

        self.buffer.push(value).map_err(TrySendError::Full)?;

        self.arrival.wake_one();
        Ok(())
    }

    pub(super) fn try_recv(&self) -> Result<T, TryRecvError> {
        let value = match self.buffer.pop() {
            Some(value) => value,
            None if self.is_connected() => return Err(TryRecvError::Empty),

            // A message may have been sent right before the channel was disconnected.
            None => self.buffer.pop().ok_or(TryRecvError::Disconnected)?,
        };

        self.vacancy.wake_one();
        Ok(value)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);

        self.vacancy.wake_all();
        self.arrival.wake_all();
    }
}

/// The side of the channel an [`Endpoint`] is attached to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(super) enum Side {
    Sending,
    Receiving,
}

/// A counted handle to the shared control block.
///
/// The channel disconnects once every endpoint of either side is dropped.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub(super) struct Endpoint<T> {
    side: Side,
    ctrl: Arc<ControlBlock<T>>,
}

impl<T> Endpoint<T> {
    fn counter(&self) -> &AtomicUsize {
        match self.side {
            Side::Sending => &self.ctrl.senders,
            Side::Receiving => &self.ctrl.receivers,
        }
    }
}

impl<T> Deref for Endpoint<T> {
    type Target = ControlBlock<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.ctrl
    }
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        self.counter().fetch_add(1, Ordering::Relaxed);

        Endpoint {
            side: self.side,
            ctrl: self.ctrl.clone(),
        }
    }
}

impl<T> Drop for Endpoint<T> {
    fn drop(&mut self) {
        // synchronizes with other endpoints of the same side
        if self.counter().fetch_sub(1, Ordering::AcqRel) == 1 {
            self.disconnect();
        }
    }
}

/// Allocates a control block and returns its sending and receiving endpoints.
pub(super) fn endpoints<T>(capacity: usize) -> (Endpoint<T>, Endpoint<T>) {
    let ctrl = Arc::new(ControlBlock::new(capacity));

    let tx = Endpoint {
        side: Side::Sending,
        ctrl: ctrl.clone(),
    };

    let rx = Endpoint {
        side: Side::Receiving,
        ctrl,
    };

    (tx, rx)
}
