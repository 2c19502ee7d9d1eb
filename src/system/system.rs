use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::gate::*;
use crate::infra_file::*;
use crate::infra_memory::*;
use crate::settings::Settings;
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Everything one front-end needs, wired from its settings.
pub struct System {
    pub session: Arc<SessionManager>,
    pub api: Arc<AuthorizedClient>,
    pub targets: Arc<dyn TargetService>,
    pub gate: RouteGate,
    poll_interval: Duration,
}

impl System {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn TokenStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryTokenStore::new()),
            "file" => {
                let path = settings
                    .store
                    .path
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.path is required for the file backend"))?;
                Arc::new(FileTokenStore::open(path).await?)
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.session.request_timeout_secs))
            .build()?;

        let auth_base_url = Url::parse(&settings.session.auth_base_url)?;
        let auth_client: Arc<dyn AuthClient> = Arc::new(
            HttpAuthClient::new(auth_base_url, settings.session.profile)
                .with_http_client(http.clone()),
        );

        let expiry_margin = ChronoDuration::try_seconds(settings.session.expiry_margin_secs)
            .ok_or_else(|| anyhow::anyhow!("session.expiry_margin_secs is out of range"))?;
        let config = SessionConfig {
            keys: StorageKeys::with_suffix(&settings.session.key_suffix),
            expiry_margin,
        };
        debug!(?config, profile = ?settings.session.profile, "session configured");
        let session = Arc::new(SessionManager::new(store, auth_client, config));

        let api_base_url = Url::parse(&settings.api.base_url)?;
        let api = Arc::new(
            AuthorizedClient::new(session.clone(), api_base_url).with_http_client(http),
        );
        let targets: Arc<dyn TargetService> = Arc::new(HttpTargetService::new(api.clone()));
        let gate = RouteGate::new(session.clone(), settings.session.login_path.clone());

        Ok(System {
            session,
            api,
            targets,
            gate,
            poll_interval: Duration::from_secs(settings.session.poll_interval_secs),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Start the background sweep with the configured period.
    pub async fn spawn_watcher(&self) -> SessionWatcher {
        SessionWatcher::spawn(self.session.clone(), self.poll_interval).await
    }
}
