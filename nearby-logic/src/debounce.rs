use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Runs an action once a burst of triggers has been quiet for a while.
///
/// Each trigger replaces the pending action. Once an action starts running it isn't
/// interrupted by later triggers, those schedule another run instead.
pub struct Debouncer {
    quiet: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Mutex::new(None),
        }
    }

    pub async fn trigger<Fut>(&self, action: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().await;

        if let Some(previous) = pending.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        *pending = Some(token.clone());

        let quiet = self.quiet;

        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = token.cancelled() => {}

                _ = tokio::time::sleep(quiet) => {
                    action.await;
                }
            }
        });
    }

    /// Drop the pending action, if any
    pub async fn cancel(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }
}
