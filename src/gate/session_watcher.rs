use crate::application_impl::SessionManager;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Background sweep that keeps an idle session fresh.
///
/// Every period it runs `ensure_valid_token` while a session exists and
/// publishes whether one is still present. A failed refresh shows up as a
/// `false` on the channel, never as an error.
pub struct SessionWatcher {
    state: watch::Receiver<bool>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionWatcher {
    pub async fn spawn(session: Arc<SessionManager>, period: Duration) -> Self {
        let initial = session.is_authenticated().await;
        let (tx, rx) = watch::channel(initial);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(watch_session(session, period, tx, cancel.clone()));

        SessionWatcher {
            state: rx,
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        *self.state.borrow()
    }

    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = match self.handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "session watcher task ended abnormally");
            }
        }
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn watch_session(
    session: Arc<SessionManager>,
    period: Duration,
    state: watch::Sender<bool>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the initial state is already published.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if session.is_authenticated().await {
                    let _ = session.ensure_valid_token().await;
                }
                let authenticated = session.is_authenticated().await;
                state.send_if_modified(|current| {
                    if *current == authenticated {
                        return false;
                    }
                    info!(authenticated, "session state changed");
                    *current = authenticated;
                    true
                });
            }
        }
    }
    debug!("session watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::SessionConfig;
    use crate::application_impl::test_support::*;
    use crate::application_port::AuthError;
    use crate::domain_port::*;
    use crate::infra_memory::MemoryTokenStore;
    use chrono::Utc;

    const TICK: Duration = Duration::from_millis(10);

    async fn expiring_session(
        client: ScriptedAuthClient,
    ) -> (
        Arc<MemoryTokenStore>,
        Arc<ScriptedAuthClient>,
        Arc<SessionManager>,
    ) {
        let store = Arc::new(MemoryTokenStore::new());
        store
            .apply(vec![
                StoreWrite::set("access_token", "A1"),
                StoreWrite::set("access_expires", (Utc::now().timestamp() + 60).to_string()),
                StoreWrite::set("refresh_token", "R1"),
            ])
            .await
            .unwrap();
        let client = Arc::new(client);
        let session = Arc::new(SessionManager::new(
            store.clone(),
            client.clone(),
            SessionConfig::default(),
        ));
        (store, client, session)
    }

    #[tokio::test]
    async fn refresh_failure_downgrades_to_unauthenticated() {
        let (store, _client, session) = expiring_session(
            ScriptedAuthClient::new().push_refresh(Err(AuthError::Refresh("revoked".into()))),
        )
        .await;

        let watcher = SessionWatcher::spawn(session, TICK).await;
        let mut rx = watcher.subscribe();
        assert!(*rx.borrow());

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("watcher never published")
            .unwrap();

        assert!(!watcher.is_authenticated());
        assert!(store.snapshot().is_empty());
        watcher.shutdown().await;
    }

    #[tokio::test]
    async fn idle_session_is_refreshed_in_background() {
        let (store, client, session) = expiring_session(
            ScriptedAuthClient::new().push_refresh(Ok(token_result("A2", Some("R2"), 3600.0))),
        )
        .await;

        let watcher = SessionWatcher::spawn(session, TICK).await;
        tokio::time::timeout(Duration::from_secs(2), async {
            while client.refresh_calls() == 0 {
                tokio::time::sleep(TICK).await;
            }
        })
        .await
        .expect("no background refresh");
        watcher.shutdown().await;

        assert!(watcher.is_authenticated());
        assert_eq!(store.snapshot()["access_token"], "A2");
        assert_eq!(client.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_polling() {
        let (_store, client, session) = expiring_session(ScriptedAuthClient::new()).await;

        let watcher = SessionWatcher::spawn(session, Duration::from_secs(3600)).await;
        watcher.shutdown().await;
        watcher.shutdown().await;

        assert_eq!(client.refresh_calls(), 0);
        assert!(watcher.is_authenticated());
    }
}
