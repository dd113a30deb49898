//! Error types for future and emitter operations.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by [`Emitter`](crate::Emitter) sends and recorded as the
/// final status of a [`Future`](crate::Future).
///
/// Success is represented by the absence of an error (`None`), never by a
/// variant of this enum.
#[derive(Debug, Clone, Error)]
pub enum FutureError {
    /// The cancellation token was observed in the canceled state.
    #[error("CANCELED")]
    Canceled,

    /// A timed send elapsed before the consumer accepted the value.
    #[error("TIMEOUT")]
    TimedOut,

    /// An error returned by the producer function, passed through unchanged.
    #[error("{0}")]
    Producer(Arc<dyn StdError + Send + Sync + 'static>),

    /// The producer function panicked; carries the panic message.
    #[error("producer panicked: {0}")]
    Panicked(String),
}

impl FutureError {
    /// Wraps an arbitrary error returned by a producer.
    pub fn producer<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(err))
    }

    /// Builds a producer error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::producer(Message(message.to_string()))
    }

    /// Returns `true` if this is the cancellation status.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Returns `true` if a timed send gave up waiting for the consumer.
    #[inline]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// Returns `true` if the error originated in the producer itself
    /// rather than in the hand-off protocol.
    #[inline]
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_) | Self::Panicked(_))
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);
