#![allow(dead_code)]

use sso_session::application_impl::*;
use sso_session::domain_model::StorageKeys;
use sso_session::domain_port::TokenStore;
use sso_session::fake_idp::*;
use sso_session::infra_memory::MemoryTokenStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub struct Harness {
    pub idp: FakeIdp,
    pub store: Arc<MemoryTokenStore>,
    pub session: Arc<SessionManager>,
    pub api: Arc<AuthorizedClient>,
}

pub fn idp_config(access_ttl: Duration) -> FakeIdpConfig {
    let mut config = FakeIdpConfig::default();
    config.jwt.access_ttl = access_ttl;
    config
}

pub fn spawn_idp(config: FakeIdpConfig, prefix: &str) -> FakeIdp {
    let state = Arc::new(FakeIdpState::new(config));
    FakeIdp::spawn(state, SocketAddr::from(([127, 0, 0, 1], 0)), prefix).unwrap()
}

pub fn session_for(
    idp: &FakeIdp,
    store: Arc<dyn TokenStore>,
    profile: EndpointProfile,
    suffix: &str,
) -> Arc<SessionManager> {
    let base_url = Url::parse(&idp.base_url()).unwrap();
    let config = SessionConfig {
        keys: StorageKeys::with_suffix(suffix),
        ..SessionConfig::default()
    };
    Arc::new(SessionManager::new(
        store,
        Arc::new(HttpAuthClient::new(base_url, profile)),
        config,
    ))
}

pub fn harness(config: FakeIdpConfig, prefix: &str, profile: EndpointProfile, suffix: &str) -> Harness {
    let idp = spawn_idp(config, prefix);
    let store = Arc::new(MemoryTokenStore::new());
    let session = session_for(&idp, store.clone(), profile, suffix);
    let base_url = Url::parse(&idp.base_url()).unwrap();
    let api = Arc::new(AuthorizedClient::new(session.clone(), base_url));
    Harness {
        idp,
        store,
        session,
        api,
    }
}

/// System 1: legacy endpoints under `/api`, unsuffixed keys.
pub fn legacy(access_ttl: Duration) -> Harness {
    harness(idp_config(access_ttl), "api", EndpointProfile::Legacy, "")
}
