//! Process-wide stop signal.
//!
//! Task loops check [`Shutdown::is_requested`] before every iteration and
//! race cooldown sleeps against [`Shutdown::wait`], so a stop request ends
//! each character's current run at the next action boundary. An action
//! already sent to the server is never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Shared stop flag with a wake-up for sleeping waiters.
#[derive(Debug, Default)]
pub struct Shutdown {
    /// Whether a stop has been requested.
    requested: AtomicBool,

    /// Wakes tasks blocked in [`wait`](Self::wait).
    notify: Notify,
}

impl Shutdown {
    /// Create a signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop and wake every waiter.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested.
    ///
    /// Returns immediately if one already was.
    pub async fn wait(&self) {
        loop {
            // Register before checking the flag so a request between the
            // check and the await is not missed.
            let notified = self.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn wait_returns_after_request() {
        let shutdown = Arc::new(Shutdown::new());
        let waiter = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move { shutdown.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!shutdown.is_requested());
        shutdown.request();
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(joined.is_ok());
        assert!(shutdown.is_requested());
    }

    #[tokio::test]
    async fn wait_after_request_is_immediate() {
        let shutdown = Shutdown::new();
        shutdown.request();
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.wait()).await;
        assert!(waited.is_ok());
    }
}
