use crate::{control::*, error::*, receiver::*, waitlist::*};
use futures::stream::{FusedStream, Stream};
use futures::task::{Context, Poll};
use std::{future::Future, pin::Pin};

/// Frees a registration, handing the wakeup on to another task if this slot consumed one.
pub(super) fn release(waitlist: &Waitlist, slot: Slot) {
    if waitlist.deregister(slot).is_none() {
        waitlist.wake_one();
    }
}

fn park(waitlist: &Waitlist, slot: &mut Option<Slot>, cx: &Context<'_>) {
    let slot = *slot.get_or_insert_with(|| waitlist.register());
    waitlist.park(slot, cx.waker());
}

fn poll_recv<T>(
    ctrl: &ControlBlock<T>,
    slot: &mut Option<Slot>,
    cx: &Context<'_>,
) -> Poll<Result<T, RecvError>> {
    for attempt in 0..2 {
        match ctrl.try_recv() {
            // A wakeup meant for another receiver may have landed in this slot.
            Ok(value) => {
                if let Some(s) = slot.take() {
                    release(&ctrl.arrival, s);
                }

                return Poll::Ready(Ok(value));
            }

            Err(TryRecvError::Disconnected) => {
                if let Some(s) = slot.take() {
                    release(&ctrl.arrival, s);
                }

                return Poll::Ready(Err(RecvError::Disconnected));
            }

            // Park, then check again in case a message arrived in the meantime.
            Err(TryRecvError::Empty) if attempt == 0 => park(&ctrl.arrival, slot, cx),
            Err(TryRecvError::Empty) => {}
        }
    }

    Poll::Pending
}

/// Future returned by [`BoundedSender::send`].
///
/// [`BoundedSender::send`]: struct.BoundedSender.html#method.send
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct SendFuture<'a, T> {
    endpoint: &'a Endpoint<T>,
    value: Option<T>,
    slot: Option<Slot>,
}

impl<T> Unpin for SendFuture<'_, T> {}

impl<'a, T> SendFuture<'a, T> {
    pub(super) fn new(endpoint: &'a Endpoint<T>, value: T) -> Self {
        SendFuture {
            endpoint,
            value: Some(value),
            slot: None,
        }
    }
}

impl<T> Future for SendFuture<'_, T> {
    type Output = Result<(), SendError<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let ctrl: &ControlBlock<T> = this.endpoint;

        for attempt in 0..2 {
            let value = match this.value.take() {
                Some(value) => value,
                None => panic!("`SendFuture` polled after completion"),
            };

            let result = match ctrl.try_send(value) {
                Ok(()) => Ok(()),
                Err(TrySendError::Disconnected(value)) => Err(SendError::Disconnected(value)),
                Err(TrySendError::Full(value)) => {
                    this.value = Some(value);

                    // Park, then check again in case room was made in the meantime.
                    if attempt == 0 {
                        park(&ctrl.vacancy, &mut this.slot, cx);
                    }

                    continue;
                }
            };

            if let Some(slot) = this.slot.take() {
                release(&ctrl.vacancy, slot);
            }

            return Poll::Ready(result);
        }

        Poll::Pending
    }
}

impl<T> Drop for SendFuture<'_, T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            release(&self.endpoint.vacancy, slot);
        }
    }
}

/// Future returned by [`BoundedReceiver::recv`].
///
/// [`BoundedReceiver::recv`]: struct.BoundedReceiver.html#method.recv
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct RecvFuture<'a, T> {
    endpoint: &'a Endpoint<T>,
    slot: Option<Slot>,
}

impl<T> Unpin for RecvFuture<'_, T> {}

impl<'a, T> RecvFuture<'a, T> {
    pub(super) fn new(endpoint: &'a Endpoint<T>) -> Self {
        RecvFuture {
            endpoint,
            slot: None,
        }
    }
}

impl<T> Future for RecvFuture<'_, T> {
    type Output = Result<T, RecvError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        poll_recv(this.endpoint, &mut this.slot, cx)
    }
}

impl<T> Drop for RecvFuture<'_, T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            release(&self.endpoint.arrival, slot);
        }
    }
}

impl<T> Stream for BoundedReceiver<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        poll_recv(&this.endpoint, &mut this.slot, cx).map(Result::ok)
    }
}

impl<T> FusedStream for BoundedReceiver<T> {
    fn is_terminated(&self) -> bool {
        self.is_disconnected() && self.is_empty()
    }
}
