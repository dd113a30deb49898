//! Rendezvous Future - Cancellable Background Producers
//!
//! A [`Future`] runs a producer function on its own thread. The producer
//! pushes values through an [`Emitter`] over a zero-capacity channel, so every
//! value is handed directly to the consumer, which reads them one at a time
//! with [`Future::get`] or lazily with [`Future::values`].
//!
//! # Key Features
//!
//! - **Rendezvous hand-off**: a send completes only when the consumer takes the value
//! - **Cooperative cancellation**: [`CancelToken`] trees, checked at every send
//! - **Single completion status**: the producer's error (or panic) is recorded once
//! - **Join-based shutdown**: `cancel()` drains the channel and joins the worker
//!
//! # Example
//!
//! ```
//! use rendezvous_future::{CancelToken, Future, FutureError};
//!
//! let future = Future::new(&CancelToken::new(), |emitter| {
//!     // Infinite producer: stops only when canceled.
//!     let mut n = 0u64;
//!     loop {
//!         emitter.send(n)?;
//!         n += 1;
//!     }
//! });
//!
//! let mut taken = Vec::new();
//! for v in &future {
//!     taken.push(v);
//!     if taken.len() == 3 {
//!         future.cancel();
//!         break;
//!     }
//! }
//!
//! assert_eq!(taken, vec![0, 1, 2]);
//! assert!(matches!(future.last_error(), Some(FutureError::Canceled)));
//! ```

mod cancel;
mod config;
mod emitter;
mod error;
mod future;
mod invariants;

pub use cancel::CancelToken;
pub use config::{Config, DEFAULT_THREAD_NAME};
pub use emitter::Emitter;
pub use error::FutureError;
pub use future::{Future, State, Values};
