//! Cross-context completion mailbox.
//!
//! The motion context produces small integer codes when a leg settles; the
//! telemetry context drains them once per tick. The traits here keep the
//! transport pluggable: the firmware adapts the inter-core channel, the
//! emulator a bounded OS channel, and tests the in-process [`CodeQueue`].
//! Producer and consumer never block each other.

use heapless::Deque;

/// Depth of the completion mailbox shared between the two contexts.
///
/// Production is bounded at two codes per phase pair with a pause between
/// pairs, and the consumer drains once per second, so a handful of slots is
/// ample headroom.
pub const MAILBOX_DEPTH: usize = 4;

/// Outcome of one settled motion leg, as carried across the core boundary.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CompletionCode {
    /// The leg was abandoned before the remaining distance reached zero.
    Aborted,
    /// The leg settled with exactly zero distance remaining.
    Completed,
}

impl CompletionCode {
    const ABORTED_CODE: u32 = 0;
    const COMPLETED_CODE: u32 = 1;

    /// Encodes the code into the 32-bit word the mailbox transports.
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        match self {
            CompletionCode::Aborted => Self::ABORTED_CODE,
            CompletionCode::Completed => Self::COMPLETED_CODE,
        }
    }

    /// Decodes a raw mailbox word; unknown words are dropped, not aliased.
    #[must_use]
    pub const fn from_raw(code: u32) -> Option<Self> {
        match code {
            Self::ABORTED_CODE => Some(CompletionCode::Aborted),
            Self::COMPLETED_CODE => Some(CompletionCode::Completed),
            _ => None,
        }
    }
}

/// Error surfaced when a completion code cannot be pushed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalPushError<E = ()> {
    /// Mailbox has reached its capacity.
    Full,
    /// Transport-specific failure.
    Other(E),
}

impl<E> SignalPushError<E> {
    /// Maps the inner error type.
    pub fn map_other<F, M>(self, mapper: M) -> SignalPushError<F>
    where
        M: FnOnce(E) -> F,
    {
        match self {
            SignalPushError::Full => SignalPushError::Full,
            SignalPushError::Other(err) => SignalPushError::Other(mapper(err)),
        }
    }
}

/// Error surfaced when draining the mailbox fails outright.
///
/// An empty mailbox is not an error; `try_pop` reports it as `Ok(None)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalPopError<E = ()> {
    /// Mailbox has been disconnected from its producer.
    Disconnected,
    /// Transport-specific failure.
    Other(E),
}

impl<E> SignalPopError<E> {
    /// Maps the inner error type.
    pub fn map_other<F, M>(self, mapper: M) -> SignalPopError<F>
    where
        M: FnOnce(E) -> F,
    {
        match self {
            SignalPopError::Disconnected => SignalPopError::Disconnected,
            SignalPopError::Other(err) => SignalPopError::Other(mapper(err)),
        }
    }
}

/// Producer half of the mailbox, owned by the motion context.
pub trait SignalProducer {
    /// Transport-specific error type.
    type Error;

    /// Attempts to enqueue a completion code without blocking.
    fn try_push(&mut self, code: CompletionCode) -> Result<(), SignalPushError<Self::Error>>;

    /// Returns the mailbox capacity if it is known.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Consumer half of the mailbox, owned by the telemetry context.
pub trait SignalConsumer {
    /// Transport-specific error type.
    type Error;

    /// Attempts to dequeue a completion code without blocking.
    ///
    /// Returns `Ok(Some(code))` when a code was queued, `Ok(None)` when the
    /// mailbox is currently empty, or an error when the transport failed.
    fn try_pop(&mut self) -> Result<Option<CompletionCode>, SignalPopError<Self::Error>>;
}

impl<P: SignalProducer + ?Sized> SignalProducer for &mut P {
    type Error = P::Error;

    fn try_push(&mut self, code: CompletionCode) -> Result<(), SignalPushError<Self::Error>> {
        (**self).try_push(code)
    }

    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }
}

impl<C: SignalConsumer + ?Sized> SignalConsumer for &mut C {
    type Error = C::Error;

    fn try_pop(&mut self) -> Result<Option<CompletionCode>, SignalPopError<Self::Error>> {
        (**self).try_pop()
    }
}

/// In-process mailbox backed by a fixed-capacity deque.
///
/// Used wherever both contexts live in one thread of control: scenario
/// tests and single-threaded host tools.
pub struct CodeQueue<const DEPTH: usize = MAILBOX_DEPTH> {
    codes: Deque<u32, DEPTH>,
}

impl<const DEPTH: usize> CodeQueue<DEPTH> {
    /// Creates an empty mailbox.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            codes: Deque::new(),
        }
    }

    /// Returns the number of queued codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` when no codes are queued.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<const DEPTH: usize> Default for CodeQueue<DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DEPTH: usize> SignalProducer for CodeQueue<DEPTH> {
    type Error = ();

    fn try_push(&mut self, code: CompletionCode) -> Result<(), SignalPushError<Self::Error>> {
        self.codes
            .push_back(code.to_raw())
            .map_err(|_| SignalPushError::Full)
    }

    fn capacity(&self) -> Option<usize> {
        Some(DEPTH)
    }
}

impl<const DEPTH: usize> SignalConsumer for CodeQueue<DEPTH> {
    type Error = ();

    fn try_pop(&mut self) -> Result<Option<CompletionCode>, SignalPopError<Self::Error>> {
        Ok(self.codes.pop_front().and_then(CompletionCode::from_raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_codes_round_trip_through_raw_words() {
        for code in [CompletionCode::Aborted, CompletionCode::Completed] {
            assert_eq!(CompletionCode::from_raw(code.to_raw()), Some(code));
        }
        assert_eq!(CompletionCode::from_raw(2), None);
        assert_eq!(CompletionCode::from_raw(u32::MAX), None);
    }

    #[test]
    fn queue_preserves_fifo_order() {
        let mut mailbox: CodeQueue<4> = CodeQueue::new();

        mailbox.try_push(CompletionCode::Completed).unwrap();
        mailbox.try_push(CompletionCode::Aborted).unwrap();

        assert_eq!(mailbox.len(), 2);
        assert_eq!(mailbox.try_pop(), Ok(Some(CompletionCode::Completed)));
        assert_eq!(mailbox.try_pop(), Ok(Some(CompletionCode::Aborted)));
        assert_eq!(mailbox.try_pop(), Ok(None));
    }

    #[test]
    fn popping_an_empty_queue_is_idempotent() {
        let mut mailbox: CodeQueue<4> = CodeQueue::new();

        for _ in 0..16 {
            assert_eq!(mailbox.try_pop(), Ok(None));
        }
        assert!(mailbox.is_empty());
    }

    #[test]
    fn push_reports_full_at_capacity() {
        let mut mailbox: CodeQueue<2> = CodeQueue::new();

        mailbox.try_push(CompletionCode::Completed).unwrap();
        mailbox.try_push(CompletionCode::Completed).unwrap();

        assert_eq!(
            mailbox.try_push(CompletionCode::Aborted),
            Err(SignalPushError::Full)
        );
        assert_eq!(mailbox.capacity(), Some(2));
    }
}
