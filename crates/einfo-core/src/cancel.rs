//! One-shot cancellation for bounded terminal reads.
//!
//! A [`CancelToken`] is a flag plus an optional waker. Cancelling only stores
//! the reason and pokes the waker; restoring the terminal is always left to the
//! reader once its blocking call returns. [`AlarmTimer`] cancels a token after a
//! fixed delay unless it is disarmed first.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const ACTIVE: u8 = 0;
const DEADLINE: u8 = 1;
const INTERRUPT: u8 = 2;

/// Why a token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The response timer expired.
    Deadline,
    /// A termination signal arrived.
    Interrupt,
}

type Waker = Box<dyn Fn() + Send + Sync>;

struct Inner {
    state: AtomicU8,
    waker: Mutex<Option<Waker>>,
}

/// Shared cancellation flag.
///
/// Clones observe the same state. The first [`cancel`](Self::cancel) wins;
/// later calls leave the reason untouched.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a token without a waker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicU8::new(ACTIVE),
                waker: Mutex::new(None),
            }),
        }
    }

    /// Create a token whose cancellation also calls `waker`.
    ///
    /// The waker runs on the cancelling thread and must not block.
    #[must_use]
    pub fn with_waker(waker: impl Fn() + Send + Sync + 'static) -> Self {
        let token = Self::new();
        if let Ok(mut slot) = token.inner.waker.lock() {
            *slot = Some(Box::new(waker));
        }
        token
    }

    /// Cancel the token. Returns `true` if this call did the cancelling.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let code = match reason {
            CancelReason::Deadline => DEADLINE,
            CancelReason::Interrupt => INTERRUPT,
        };
        let won = self
            .inner
            .state
            .compare_exchange(ACTIVE, code, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won
            && let Ok(slot) = self.inner.waker.lock()
            && let Some(waker) = slot.as_ref()
        {
            waker();
        }
        won
    }

    /// Whether the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) != ACTIVE
    }

    /// The cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        match self.inner.state.load(Ordering::Acquire) {
            DEADLINE => Some(CancelReason::Deadline),
            INTERRUPT => Some(CancelReason::Interrupt),
            _ => None,
        }
    }
}

/// A one-shot timer that cancels a token with [`CancelReason::Deadline`].
///
/// The timer thread waits on a channel with a deadline. Dropping or disarming
/// the timer closes the channel, so the thread exits without firing.
#[derive(Debug)]
pub struct AlarmTimer {
    disarm: Option<mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AlarmTimer {
    /// Start a timer that cancels `token` after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer thread cannot be spawned.
    pub fn arm(timeout: Duration, token: CancelToken) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("einfo-cpr-alarm".into())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(?timeout, "cpr alarm fired");
                    token.cancel(CancelReason::Deadline);
                }
            })?;
        Ok(Self {
            disarm: Some(tx),
            thread: Some(thread),
        })
    }

    /// Stop the timer and wait for its thread.
    pub fn disarm(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.disarm.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for AlarmTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
