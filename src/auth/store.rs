//! In-memory credential store with single-flight refresh.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::{CredentialStore, Credentials, TokenRefresher};

/// Holds a session in memory and refreshes it through a [`TokenRefresher`].
///
/// Refresh is serialized through an async gate: when several requests hit an
/// unauthorized response at once, one of them performs the exchange and the
/// rest adopt its result after the gate opens.
pub struct MemoryCredentialStore<R: TokenRefresher> {
    refresher: R,
    credentials: RwLock<Option<Credentials>>,
    refresh_gate: Mutex<()>,
}

impl<R: TokenRefresher> MemoryCredentialStore<R> {
    /// Creates an empty store; `current` returns `None` until a session is set.
    pub fn new(refresher: R) -> Self {
        Self {
            refresher,
            credentials: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Creates a store seeded with an existing session.
    pub fn with_credentials(refresher: R, credentials: Credentials) -> Self {
        Self {
            refresher,
            credentials: RwLock::new(Some(credentials)),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Installs a session, replacing whatever was held before.
    pub fn set(&self, credentials: Credentials) {
        *self.credentials.write() = Some(credentials);
    }

    /// Drops the held session.
    pub fn clear(&self) {
        *self.credentials.write() = None;
    }
}

#[async_trait]
impl<R: TokenRefresher> CredentialStore for MemoryCredentialStore<R> {
    fn current(&self) -> Option<Credentials> {
        self.credentials.read().clone()
    }

    #[tracing::instrument(skip(self))]
    async fn refresh(&self) -> Result<Credentials> {
        // Snapshot before waiting on the gate; if the stored session differs
        // once we hold it, a concurrent caller already refreshed.
        let observed = self.current();

        let _gate = self.refresh_gate.lock().await;

        match self.current() {
            Some(held) if observed.as_ref() != Some(&held) => {
                debug!("Session already refreshed by a concurrent caller.");
                return Ok(held);
            }
            _ => {}
        }

        debug!("Exchanging refresh secret for a new session...");
        let fresh = self
            .refresher
            .exchange()
            .await
            .context("Failed to refresh session")?;

        *self.credentials.write() = Some(fresh.clone());
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fresh_credentials, stale_credentials};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts exchanges and hands out a fixed session, optionally slowly.
    struct CountingRefresher {
        calls: AtomicUsize,
        next: Credentials,
        delay: Duration,
    }

    impl CountingRefresher {
        fn new(next: Credentials) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                next,
                delay: Duration::ZERO,
            }
        }

        fn slow(next: Credentials, delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                next,
                delay,
            }
        }
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn exchange(&self) -> Result<Credentials> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.next.clone())
        }
    }

    struct FailingRefresher;

    #[async_trait]
    impl TokenRefresher for FailingRefresher {
        async fn exchange(&self) -> Result<Credentials> {
            anyhow::bail!("refresh token revoked")
        }
    }

    #[test]
    fn test_current_starts_empty() {
        let store = MemoryCredentialStore::new(CountingRefresher::new(fresh_credentials()));
        assert_eq!(store.current(), None);

        store.set(stale_credentials());
        assert_eq!(store.current(), Some(stale_credentials()));

        store.clear();
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_with_credentials_seeds_session() {
        let store = MemoryCredentialStore::with_credentials(
            CountingRefresher::new(fresh_credentials()),
            stale_credentials(),
        );
        assert_eq!(store.current(), Some(stale_credentials()));
    }

    #[tokio::test]
    async fn test_refresh_replaces_session() {
        let store = MemoryCredentialStore::with_credentials(
            CountingRefresher::new(fresh_credentials()),
            stale_credentials(),
        );

        let refreshed = store.refresh().await.unwrap();
        assert_eq!(refreshed, fresh_credentials());
        assert_eq!(store.current(), Some(fresh_credentials()));
        assert_eq!(store.refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_session() {
        let store =
            MemoryCredentialStore::with_credentials(FailingRefresher, stale_credentials());

        let result = store.refresh().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to refresh session")
        );
        // The old session stays in place so the caller can inspect it.
        assert_eq!(store.current(), Some(stale_credentials()));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_exchanges_once() {
        let store = Arc::new(MemoryCredentialStore::with_credentials(
            CountingRefresher::slow(fresh_credentials(), Duration::from_millis(50)),
            stale_credentials(),
        ));

        let a = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.refresh().await.unwrap() }
        });
        let b = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.refresh().await.unwrap() }
        });

        let (first, second) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(first, fresh_credentials());
        assert_eq!(second, fresh_credentials());
        assert_eq!(store.refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sequential_refreshes_exchange_each_time() {
        let store = MemoryCredentialStore::with_credentials(
            CountingRefresher::new(fresh_credentials()),
            stale_credentials(),
        );

        store.refresh().await.unwrap();
        store.refresh().await.unwrap();
        assert_eq!(store.refresher.calls.load(Ordering::SeqCst), 2);
    }
}
