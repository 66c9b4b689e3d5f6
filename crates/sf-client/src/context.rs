//! Per-call deadline and cancellation.
//!
//! Every network operation in the workspace takes a [`RequestContext`]. The
//! context bounds the whole exchange, from sending the request to reading the
//! last byte of the body.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{Error, ErrorKind, Result};

/// Create a linked cancel handle and signal.
///
/// The signal can be cloned into any number of contexts; firing the handle
/// cancels all of them.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Fires a [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel every request observing the paired signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes a [`CancelHandle`].
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns true once the paired handle has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the paired handle fires. Never resolves if the handle is
    /// dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Deadline and cancellation for a single call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<CancelSignal>,
}

impl RequestContext {
    /// A context with no deadline and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire the call after `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Expire the call at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort the call when `signal` fires.
    pub fn with_cancellation(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` to completion unless the context expires or is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let cancelled = async {
            match &self.cancel {
                Some(signal) => signal.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Error::new(ErrorKind::Cancelled)),
            _ = expired => Err(Error::new(ErrorKind::Timeout)),
            result = fut => result,
        }
    }
}
