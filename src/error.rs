use derivative::Derivative;
use std::fmt;

#[cfg(test)]
use test_strategy::Arbitrary;

/// An error that may be returned by [`BoundedSender::send`].
///
/// [`BoundedSender::send`]: struct.BoundedSender.html#method.send
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
#[derive(Copy, Clone, Eq, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum SendError<T> {
    /// The channel is disconnected.
    Disconnected(#[derivative(Debug = "ignore")] T),
}

impl<T> SendError<T> {
    /// Recovers the message that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            SendError::Disconnected(value) => value,
        }
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        "sending on a disconnected channel".fmt(f)
    }
}

impl<T> std::error::Error for SendError<T> {}

/// An error that may be returned by [`BoundedSender::try_send`].
///
/// [`BoundedSender::try_send`]: struct.BoundedSender.html#method.try_send
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
#[derive(Copy, Clone, Eq, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum TrySendError<T> {
    /// The internal buffer is full.
    Full(#[derivative(Debug = "ignore")] T),

    /// The channel is disconnected.
    Disconnected(#[derivative(Debug = "ignore")] T),
}

impl<T> TrySendError<T> {
    /// Recovers the message that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(value) | TrySendError::Disconnected(value) => value,
        }
    }
}

impl<T> From<SendError<T>> for TrySendError<T> {
    fn from(err: SendError<T>) -> Self {
        TrySendError::Disconnected(err.into_inner())
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TrySendError::*;
        match self {
            Full(_) => "sending on a full channel".fmt(f),
            Disconnected(_) => "sending on a disconnected channel".fmt(f),
        }
    }
}

impl<T> std::error::Error for TrySendError<T> {}

/// An error that may be returned by [`BoundedReceiver::recv`].
///
/// [`BoundedReceiver::recv`]: struct.BoundedReceiver.html#method.recv
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum RecvError {
    /// No messages pending in the internal buffer and the channel is disconnected.
    Disconnected,
}

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use RecvError::*;
        match self {
            Disconnected => "receiving on an empty and disconnected channel".fmt(f),
        }
    }
}

impl std::error::Error for RecvError {}

/// An error that may be returned by [`BoundedReceiver::try_recv`].
///
/// [`BoundedReceiver::try_recv`]: struct.BoundedReceiver.html#method.try_recv
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum TryRecvError {
    /// No messages pending in the internal buffer.
    Empty,

    /// No messages pending in the internal buffer and the channel is disconnected.
    Disconnected,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TryRecvError::*;
        match self {
            Empty => "receiving on an empty channel".fmt(f),
            Disconnected => "receiving on an empty and disconnected channel".fmt(f),
        }
    }
}

impl std::error::Error for TryRecvError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use test_strategy::proptest;

    #[proptest]
    fn send_error_implements_error_trait(err: SendError<()>) {
        assert_eq!(
            format!("{}", err),
            format!("{}", Box::<dyn Error>::from(err))
        );
    }

    #[proptest]
    fn try_send_error_implements_error_trait(err: TrySendError<()>) {
        assert_eq!(
            format!("{}", err),
            format!("{}", Box::<dyn Error>::from(err))
        );
    }

    #[proptest]
    fn recv_error_implements_error_trait(err: RecvError) {
        assert_eq!(
            format!("{}", err),
            format!("{}", Box::<dyn Error>::from(err))
        );
    }

    #[proptest]
    fn try_recv_error_implements_error_trait(err: TryRecvError) {
        assert_eq!(
            format!("{}", err),
            format!("{}", Box::<dyn Error>::from(err))
        );
    }

    #[proptest]
    fn errors_hand_back_the_message(value: u64) {
        assert_eq!(SendError::Disconnected(value).into_inner(), value);
        assert_eq!(TrySendError::Full(value).into_inner(), value);
        assert_eq!(
            TrySendError::from(SendError::Disconnected(value)),
            TrySendError::Disconnected(value)
        );
    }
}
