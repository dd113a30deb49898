//! Debug assertion macros for future lifecycle invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so release
//! builds pay nothing for them.

// =============================================================================
// Completion status is written exactly once
// =============================================================================

/// Assert that the completion status has not been recorded yet.
///
/// **Invariant**: the worker writes the status once, after the producer returns.
///
/// Used in: `Shared::complete()` before storing the status
macro_rules! debug_assert_status_unset {
    ($already_completed:expr) => {
        debug_assert!(
            !$already_completed,
            "completion status recorded more than once"
        )
    };
}

// =============================================================================
// Channel closes only after the producer has returned
// =============================================================================

/// Assert that a closed hand-off channel implies a recorded status.
///
/// **Invariant**: `channel closed → producer returned ∧ status written`
///
/// Used in: `Future::get()` when the receive reports disconnection
macro_rules! debug_assert_closed_after_completion {
    ($completed:expr) => {
        debug_assert!(
            $completed,
            "hand-off channel closed before the producer recorded its status"
        )
    };
}

// =============================================================================
// Cancel returns only after the worker is gone
// =============================================================================

/// Assert that the worker thread has been joined.
///
/// **Invariant**: `cancel() returned → worker joined`
///
/// Used in: `Future::cancel()` before returning
macro_rules! debug_assert_worker_joined {
    ($joined:expr) => {
        debug_assert!($joined, "cancel() returning while the worker is still attached")
    };
}

pub(crate) use debug_assert_closed_after_completion;
pub(crate) use debug_assert_status_unset;
pub(crate) use debug_assert_worker_joined;
