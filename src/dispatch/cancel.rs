use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation flag for an in-flight action.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            // The sender lives as long as any clone of this token, so this only
            // fails if every owner is gone; wait forever in that case.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    #[tokio::test]
    async fn cancel_wakes_waiters_on_clones() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        assert!(!token.is_cancelled());
        token.cancel();
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter woke")
            .unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn uncancelled_token_stays_pending() {
        let token = CancelToken::new();
        assert!(
            timeout(Duration::from_millis(20), token.cancelled())
                .await
                .is_err()
        );
    }
}
