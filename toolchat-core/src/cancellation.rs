//! Cancellation token system
//!
//! Cooperative cancellation for the endpoint call and every handler
//! invocation of a session. Cancelling aborts whichever wait is in progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;

/// Returned by a wait that was interrupted by cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

/// Token for cooperative cancellation of async operations
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

#[derive(Debug)]
struct CancellationTokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Create a new cancellation token
    ///
    /// # Examples
    /// ```
    /// use toolchat_core::CancellationToken;
    ///
    /// let token = CancellationToken::new();
    /// assert!(!token.is_cancelled());
    /// ```
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Create a cancellation token that is already cancelled
    pub fn already_cancelled() -> Self {
        let token = Self::new();
        token.cancel();
        token
    }

    /// Create a cancellation token that will be cancelled after a timeout
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Examples
    /// ```
    /// use toolchat_core::CancellationToken;
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let token = CancellationToken::with_timeout(Duration::from_secs(5));
    /// assert!(!token.is_cancelled());
    /// # });
    /// ```
    pub fn with_timeout(duration: Duration) -> Self {
        let token = Self::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            token_clone.cancel();
        });

        token
    }

    /// Check if the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Cancel the token and wake every task waiting on it
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Wait for the token to be cancelled
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register interest before reading the flag so a concurrent cancel is not missed.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Return an error if the token is cancelled
    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run a future, abandoning it if the token is cancelled first
    ///
    /// # Examples
    /// ```
    /// use toolchat_core::CancellationToken;
    ///
    /// # tokio_test::block_on(async {
    /// let token = CancellationToken::new();
    /// let value = token.run_with_cancellation(async { 42 }).await;
    /// assert_eq!(value, Ok(42));
    /// # });
    /// ```
    pub async fn run_with_cancellation<F, T>(&self, future: F) -> Result<T, Cancelled>
    where
        F: std::future::Future<Output = T>,
    {
        self.check_cancelled()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            result = future => Ok(result),
        }
    }

    /// Create a child token that will be cancelled when this token is cancelled
    ///
    /// Must be called inside a tokio runtime.
    pub fn child_token(&self) -> Self {
        let child = Self::new();
        if self.is_cancelled() {
            child.cancel();
            return child;
        }

        let child_clone = child.clone();
        let parent = self.clone();
        tokio::spawn(async move {
            parent.cancelled().await;
            child_clone.cancel();
        });

        child
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn test_cancellation_token_cancel() {
        let token = CancellationToken::new();
        assert!(token.check_cancelled().is_ok());
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check_cancelled(), Err(Cancelled));
    }

    #[tokio::test]
    async fn test_cancellation_notification() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let handle = tokio::spawn(async move {
            token_clone.cancelled().await;
            "cancelled"
        });

        sleep(Duration::from_millis(10)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), "cancelled");
    }

    #[tokio::test]
    async fn test_run_with_cancellation_interrupts_wait() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let result = token
            .run_with_cancellation(async {
                sleep(Duration::from_secs(30)).await;
                "should not complete"
            })
            .await;
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_future() {
        let token = CancellationToken::already_cancelled();
        let result = token.run_with_cancellation(async { "never" }).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_child_token() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        assert!(!child.is_cancelled());
        parent.cancel();

        sleep(Duration::from_millis(10)).await;
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_timeout_token() {
        let token = CancellationToken::with_timeout(Duration::from_millis(20));
        assert!(!token.is_cancelled());

        sleep(Duration::from_millis(80)).await;
        assert!(token.is_cancelled());
    }
}
