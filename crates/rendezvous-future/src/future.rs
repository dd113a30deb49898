//! Consumer-side handle owning the producer's lifecycle.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::emitter::Emitter;
use crate::error::FutureError;
#[cfg(debug_assertions)]
use crate::invariants::{
    debug_assert_closed_after_completion, debug_assert_status_unset,
    debug_assert_worker_joined,
};
use crossbeam_channel::{select, Receiver};
use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;
use tracing::{debug, trace, warn};

/// Lifecycle state of a [`Future`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The producer is running and the channel is open.
    Running,
    /// Cancellation was requested; the producer has not returned yet.
    Canceling,
    /// The producer returned and the channel is closed.
    Completed,
    /// `cancel()` finished: channel drained, worker joined.
    Drained,
}

/// Completion status shared between the worker and the handle.
struct Shared {
    error: RwLock<Option<FutureError>>,
    completed: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            error: RwLock::new(None),
            completed: AtomicBool::new(false),
        }
    }

    fn complete(&self, error: Option<FutureError>) {
        let mut slot = self.error.write().unwrap_or_else(PoisonError::into_inner);

        #[cfg(debug_assertions)]
        debug_assert_status_unset!(self.completed.load(Ordering::Acquire));

        *slot = error;
        self.completed.store(true, Ordering::Release);
    }

    fn error(&self) -> Option<FutureError> {
        self.error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[inline]
    fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

/// Handle over a producer running on its own thread.
///
/// The producer receives an [`Emitter`] and pushes values through a
/// zero-capacity channel; the consumer pulls them with [`get`](Self::get) or
/// [`values`](Self::values). When the producer returns, its status is recorded
/// and the channel closes.
///
/// # Single consumer
///
/// A `Future` is meant to be read by one consumer at a time. Reading from
/// several threads at once is memory safe, but which reader receives which
/// value is unspecified.
///
/// # Drop
///
/// Dropping a `Future` performs [`cancel`](Self::cancel), so the worker is
/// always joined. Like `cancel`, this blocks until the producer notices.
///
/// # Example
///
/// ```
/// use rendezvous_future::{CancelToken, Future};
///
/// let future = Future::new(&CancelToken::new(), |emitter| {
///     for i in 0..3 {
///         emitter.send(i)?;
///     }
///     Ok(())
/// });
///
/// let values: Vec<u32> = future.values().collect();
/// assert_eq!(values, vec![0, 1, 2]);
/// assert!(future.last_error().is_none());
/// ```
pub struct Future<T> {
    token: CancelToken,
    rx: Receiver<T>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    drained: AtomicBool,
}

impl<T: Send + 'static> Future<T> {
    /// Spawns `producer` under a child of `parent` with the default config.
    ///
    /// Canceling `parent` cancels this future; canceling this future leaves
    /// `parent` untouched.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create a thread, as `std::thread::spawn`
    /// does. Use [`with_config`](Self::with_config) to handle that case.
    pub fn new<F>(parent: &CancelToken, producer: F) -> Self
    where
        F: FnOnce(&Emitter<T>) -> Result<(), FutureError> + Send + 'static,
    {
        Self::with_config(parent, &Config::default(), producer)
            .expect("failed to spawn producer thread")
    }

    /// Spawns `producer` under a fresh root token.
    pub fn spawn<F>(producer: F) -> Self
    where
        F: FnOnce(&Emitter<T>) -> Result<(), FutureError> + Send + 'static,
    {
        Self::new(&CancelToken::new(), producer)
    }

    /// Spawns `producer` on a worker thread built from `config`.
    pub fn with_config<F>(parent: &CancelToken, config: &Config, producer: F) -> io::Result<Self>
    where
        F: FnOnce(&Emitter<T>) -> Result<(), FutureError> + Send + 'static,
    {
        let token = parent.child();
        let (tx, rx) = crossbeam_channel::bounded(0);
        let shared = Arc::new(Shared::new());

        let emitter = Emitter::new(token.clone(), tx);
        let worker_shared = Arc::clone(&shared);
        let handle = config
            .thread_builder()
            .spawn(move || run_producer(producer, emitter, &worker_shared))?;

        trace!(thread = ?handle.thread().name(), "producer spawned");

        Ok(Self {
            token,
            rx,
            shared,
            worker: Mutex::new(Some(handle)),
            drained: AtomicBool::new(false),
        })
    }
}

impl<T> Future<T> {
    /// Blocks for the next value.
    ///
    /// - A value arrived: `(Some(value), status)`, where `status` is the
    ///   producer's status *as of now*. It is usually `None` because the
    ///   producer is still running; it is final only once the channel closed.
    /// - The future is (or becomes) canceled: `(None, Some(Canceled))`.
    /// - The producer returned without sending: `(None, status)`.
    pub fn get(&self) -> (Option<T>, Option<FutureError>) {
        if self.token.is_canceled() {
            debug!("Future::get() aborted");
            return (None, Some(FutureError::Canceled));
        }

        select! {
            recv(self.token.done()) -> _ => {
                debug!("Future::get() aborted");
                (None, Some(FutureError::Canceled))
            }
            recv(self.rx) -> msg => match msg {
                Ok(value) => (Some(value), self.last_error()),
                Err(_) => {
                    #[cfg(debug_assertions)]
                    debug_assert_closed_after_completion!(self.shared.is_completed());

                    (None, self.last_error())
                }
            },
        }
    }

    /// Lazy iterator over the produced values.
    ///
    /// Ends when the producer returns. Values already taken are gone, so a
    /// second pass after exhaustion yields nothing.
    pub fn values(&self) -> Values<'_, T> {
        Values {
            inner: self.rx.iter(),
        }
    }

    /// The producer's final status, or `None` while it is still running or
    /// if it succeeded.
    pub fn last_error(&self) -> Option<FutureError> {
        self.shared.error()
    }

    /// Cancels the producer and waits for it to finish.
    ///
    /// This will:
    /// 1. Cancel the future's token, failing any pending or later send
    /// 2. Drain and discard values until the channel closes
    /// 3. Join the worker thread
    ///
    /// Returns only after the producer can no longer run and
    /// [`last_error`](Self::last_error) holds its final value. Safe to call
    /// any number of times, from any thread, in any state. Blocks for as long
    /// as the producer takes to reach its next send.
    pub fn cancel(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        self.token.cancel();

        let discarded = self.rx.iter().count();
        if discarded > 0 {
            debug!(discarded, "Future::cancel() skipped extra data");
        }

        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                warn!("producer thread panicked outside the producer function");
            }
            trace!("producer joined");
        }

        #[cfg(debug_assertions)]
        debug_assert_worker_joined!(worker.is_none());

        self.drained.store(true, Ordering::Release);
    }

    /// Returns `true` if cancellation has been requested, directly or through
    /// a parent token.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }

    /// Returns `true` once the producer has returned and its status is final.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.shared.is_completed()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        if self.drained.load(Ordering::Acquire) {
            State::Drained
        } else if self.shared.is_completed() {
            State::Completed
        } else if self.token.is_canceled() {
            State::Canceling
        } else {
            State::Running
        }
    }
}

impl<T> Drop for Future<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("state", &self.state())
            .field("last_error", &self.last_error())
            .finish_non_exhaustive()
    }
}

impl<'a, T> IntoIterator for &'a Future<T> {
    type Item = T;
    type IntoIter = Values<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values()
    }
}

/// Iterator over the values of a [`Future`], see [`Future::values`].
pub struct Values<'a, T> {
    inner: crossbeam_channel::Iter<'a, T>,
}

impl<T> Iterator for Values<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }
}

impl<T> fmt::Debug for Values<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Values").finish_non_exhaustive()
    }
}

/// Worker body: run the producer, record its status, then close the channel.
fn run_producer<T, F>(producer: F, emitter: Emitter<T>, shared: &Shared)
where
    F: FnOnce(&Emitter<T>) -> Result<(), FutureError>,
{
    let status = match panic::catch_unwind(AssertUnwindSafe(|| producer(&emitter))) {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "producer panicked");
            Some(FutureError::Panicked(message))
        }
    };

    trace!(?status, "producer returned");
    shared.complete(status);

    // Status first, then close: a reader that saw the channel close sees
    // the final status.
    drop(emitter);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}
