//! Producer-side hand-off handle.

use crate::cancel::CancelToken;
use crate::error::FutureError;
use crossbeam_channel::{select, Sender};
use std::time::Duration;
use tracing::debug;

/// Handle a producer function uses to publish values to the consumer.
///
/// Every send is a rendezvous: it returns only once the consumer has taken the
/// value, the future has been canceled, or (for [`send_timeout`]) the deadline
/// has passed.
///
/// # Note
///
/// `Emitter` is only ever lent to the producer (`&Emitter<T>`), and does NOT
/// implement `Clone`. The hand-off channel closes when the producer returns,
/// so an emitter cannot outlive the producer function.
///
/// [`send_timeout`]: Emitter::send_timeout
pub struct Emitter<T> {
    token: CancelToken,
    tx: Sender<T>,
}

impl<T> Emitter<T> {
    pub(crate) fn new(token: CancelToken, tx: Sender<T>) -> Self {
        Self { token, tx }
    }

    /// Hands `value` to the consumer, blocking until it is taken.
    ///
    /// Returns [`FutureError::Canceled`] if the future is canceled before or
    /// while waiting; the value is dropped in that case. A producer should
    /// return that error promptly.
    pub fn send(&self, value: T) -> Result<(), FutureError> {
        if self.token.is_canceled() {
            debug!("Emitter::send() aborted before delivery");
            return Err(FutureError::Canceled);
        }

        select! {
            recv(self.token.done()) -> _ => {
                debug!("Emitter::send() aborted");
                Err(FutureError::Canceled)
            }
            send(self.tx, value) -> res => res.map_err(|_| {
                debug!("Emitter::send() found the consumer gone");
                FutureError::Canceled
            }),
        }
    }

    /// Hands `value` to the consumer, giving up after `timeout`.
    ///
    /// Exactly one of three outcomes is reported: `Ok(())` when the value was
    /// taken, [`FutureError::Canceled`] when the future was canceled, or
    /// [`FutureError::TimedOut`] when the deadline passed first. A timeout
    /// does not cancel the future.
    ///
    /// A zero `timeout` means no deadline and behaves like [`send`](Self::send).
    pub fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), FutureError> {
        if timeout.is_zero() {
            return self.send(value);
        }

        if self.token.is_canceled() {
            debug!("Emitter::send_timeout() aborted before delivery");
            return Err(FutureError::Canceled);
        }

        select! {
            recv(self.token.done()) -> _ => {
                debug!("Emitter::send_timeout() aborted");
                Err(FutureError::Canceled)
            }
            send(self.tx, value) -> res => res.map_err(|_| {
                debug!("Emitter::send_timeout() found the consumer gone");
                FutureError::Canceled
            }),
            default(timeout) => {
                debug!(?timeout, "Emitter::send_timeout() timed out");
                Err(FutureError::TimedOut)
            }
        }
    }

    /// Returns `true` if the future has been canceled.
    ///
    /// Lets a producer bail out of long stretches of work between sends.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }

    /// The future's cancellation token.
    ///
    /// Producers that start nested futures can pass this as their parent so
    /// canceling the outer future cancels the inner ones too.
    #[inline]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    fn pair() -> (Emitter<u32>, crossbeam_channel::Receiver<u32>, CancelToken) {
        let token = CancelToken::new();
        let (tx, rx) = crossbeam_channel::bounded(0);
        (Emitter::new(token.clone(), tx), rx, token)
    }

    #[test]
    fn test_send_rendezvous() {
        let (emitter, rx, _token) = pair();
        let consumer = thread::spawn(move || rx.recv().unwrap());

        emitter.send(7).unwrap();
        assert_eq!(consumer.join().unwrap(), 7);
    }

    #[test]
    fn test_send_after_cancel_fails_immediately() {
        let (emitter, rx, token) = pair();
        token.cancel();

        // Even with a reader waiting, nothing is delivered.
        let reader = thread::spawn(move || rx.recv_timeout(Duration::from_millis(50)));
        assert!(matches!(emitter.send(1), Err(FutureError::Canceled)));
        assert!(matches!(
            emitter.send_timeout(2, Duration::from_secs(5)),
            Err(FutureError::Canceled)
        ));
        assert!(reader.join().unwrap().is_err());
    }

    #[test]
    fn test_cancel_unblocks_pending_send() {
        let (emitter, _rx, token) = pair();
        let canceler = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            token.cancel();
        });

        assert!(matches!(emitter.send(1), Err(FutureError::Canceled)));
        canceler.join().unwrap();
    }

    #[test]
    fn test_send_timeout_elapses() {
        let (emitter, _rx, token) = pair();

        let start = Instant::now();
        let result = emitter.send_timeout(1, Duration::from_millis(30));
        assert!(matches!(result, Err(FutureError::TimedOut)));
        assert!(start.elapsed() >= Duration::from_millis(30));
        // A timeout is local to the call.
        assert!(!token.is_canceled());
    }

    #[test]
    fn test_send_timeout_delivers() {
        let (emitter, rx, _token) = pair();
        let consumer = thread::spawn(move || rx.recv().unwrap());

        emitter.send_timeout(9, Duration::from_secs(5)).unwrap();
        assert_eq!(consumer.join().unwrap(), 9);
    }

    #[test]
    fn test_zero_timeout_blocks_until_delivery() {
        let (emitter, rx, _token) = pair();
        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            rx.recv().unwrap()
        });

        emitter.send_timeout(3, Duration::ZERO).unwrap();
        assert_eq!(consumer.join().unwrap(), 3);
    }

    #[test]
    fn test_disconnected_consumer_reports_canceled() {
        let (emitter, rx, _token) = pair();
        drop(rx);
        assert!(matches!(emitter.send(1), Err(FutureError::Canceled)));
    }
}
