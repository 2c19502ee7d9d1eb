use crate::application_impl::SessionManager;
use std::sync::Arc;

pub const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Send the user to `to`; login returns them to `from` afterwards.
    Redirect { to: String, from: String },
}

/// Decides whether a protected location may be shown.
pub struct RouteGate {
    session: Arc<SessionManager>,
    login_path: String,
}

impl RouteGate {
    pub fn new(session: Arc<SessionManager>, login_path: impl Into<String>) -> Self {
        RouteGate {
            session,
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub async fn check(&self, requested: &str) -> GateDecision {
        let authenticated = self.session.is_authenticated().await;
        self.decide(authenticated, requested)
    }

    /// Same decision from an already observed state, e.g. a watcher channel.
    pub fn decide(&self, authenticated: bool, requested: &str) -> GateDecision {
        if authenticated {
            GateDecision::Allow
        } else {
            GateDecision::Redirect {
                to: self.login_path.clone(),
                from: requested.to_string(),
            }
        }
    }

    /// Where to go after a successful login. Only same-site paths are honored.
    pub fn return_location(from: Option<&str>) -> String {
        match from {
            Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
            _ => "/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::SessionConfig;
    use crate::application_impl::test_support::ScriptedAuthClient;
    use crate::domain_port::TokenStore;
    use crate::infra_memory::MemoryTokenStore;

    fn gate(store: Arc<MemoryTokenStore>) -> RouteGate {
        let session = SessionManager::new(
            store,
            Arc::new(ScriptedAuthClient::new()),
            SessionConfig::default(),
        );
        RouteGate::new(Arc::new(session), DEFAULT_LOGIN_PATH)
    }

    #[tokio::test]
    async fn redirects_without_session_and_keeps_origin() {
        let gate = gate(Arc::new(MemoryTokenStore::new()));

        assert_eq!(
            gate.check("/targets/42").await,
            GateDecision::Redirect {
                to: "/login".into(),
                from: "/targets/42".into()
            }
        );
    }

    #[tokio::test]
    async fn allows_with_session() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set("access_token", "A1").await.unwrap();

        assert_eq!(gate(store).check("/targets").await, GateDecision::Allow);
    }

    #[test]
    fn return_location_ignores_foreign_targets() {
        assert_eq!(RouteGate::return_location(Some("/targets/create")), "/targets/create");
        assert_eq!(RouteGate::return_location(Some("//evil.example")), "/");
        assert_eq!(RouteGate::return_location(Some("https://evil.example")), "/");
        assert_eq!(RouteGate::return_location(None), "/");
    }
}
