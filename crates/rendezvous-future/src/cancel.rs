//! Cooperative cancellation tokens.
//!
//! A [`CancelToken`] is a one-way broadcast flag: it starts active and moves to
//! canceled exactly once. Besides the flag itself, every token owns a
//! zero-sized channel whose sender is dropped on cancellation, so blocking
//! operations can race cancellation against a hand-off with
//! `crossbeam_channel::select!`.
//!
//! Tokens form a tree. [`CancelToken::child`] derives a token that is canceled
//! whenever its parent is, while canceling the child leaves the parent alone.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

/// Uninhabited message type; the `done` channel never carries a value, it is
/// only ever disconnected.
#[derive(Debug)]
pub(crate) enum Never {}

/// A cloneable, thread-safe cancellation token.
///
/// Clones share state: canceling any clone cancels all of them.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    canceled: AtomicBool,
    trigger: Mutex<Option<Sender<Never>>>,
    done: Receiver<Never>,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new() -> Self {
        let (trigger, done) = crossbeam_channel::bounded(0);
        Self {
            canceled: AtomicBool::new(false),
            trigger: Mutex::new(Some(trigger)),
            done,
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel(&self) {
        if self.canceled.swap(true, Ordering::AcqRel) {
            return;
        }

        // Disconnects `done`, waking every thread selecting on it.
        drop(
            self.trigger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );

        let children = std::mem::take(
            &mut *self
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }

    #[inline]
    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

impl CancelToken {
    /// Creates a new root token in the active state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new()),
        }
    }

    /// Derives a child token.
    ///
    /// The child is canceled when this token is canceled (or immediately, if
    /// this token already is). Canceling the child does not affect `self`.
    pub fn child(&self) -> Self {
        let child = Arc::new(Inner::new());

        {
            let mut children = self
                .inner
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }

        // The parent raises its flag before collecting children, so a child
        // registered too late for the sweep is caught here.
        if self.inner.is_canceled() {
            child.cancel();
        }

        Self { inner: child }
    }

    /// Cancels this token and all of its descendants. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` once the token has been canceled.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.inner.is_canceled()
    }

    /// Blocks the calling thread until the token is canceled.
    pub fn wait(&self) {
        // Only ever returns Err(Disconnected).
        let _ = self.inner.done.recv();
    }

    /// Blocks until the token is canceled or `timeout` elapses.
    ///
    /// Returns `true` if the token was canceled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.inner.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => self.is_canceled(),
            Ok(never) => match never {},
        }
    }

    /// Channel that becomes disconnected on cancellation, for use in
    /// `select!` arms.
    #[inline]
    pub(crate) fn done(&self) -> &Receiver<Never> {
        &self.inner.done
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("canceled", &self.is_canceled())
            .finish_non_exhaustive()
    }
}
