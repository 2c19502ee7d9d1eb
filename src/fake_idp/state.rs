use super::error::IdpError;
use super::token::{JwtConfig, decode_access, encode_access};
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nanoid::nanoid;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FakeIdpConfig {
    pub jwt: JwtConfig,
    pub refresh_ttl: Duration,
    /// Login page the OIDC start endpoint points browsers at.
    pub authorize_url: String,
    /// Front-end callback the authorize endpoint redirects to.
    pub redirect_uri: String,
    pub users: Vec<(String, String)>,
}

impl Default for FakeIdpConfig {
    fn default() -> Self {
        FakeIdpConfig {
            jwt: JwtConfig {
                issuer: "fake-idp".to_string(),
                audience: "sso-client".to_string(),
                access_ttl: Duration::from_secs(5 * 60),
                signing_key: b"fake-idp-dev-key".to_vec(),
            },
            refresh_ttl: Duration::from_secs(30 * 60),
            authorize_url: "http://localhost/realms/dev/protocol/openid-connect/auth".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            users: vec![("alice".to_string(), "pw".to_string())],
        }
    }
}

/// Endpoints whose hits are counted, for assertions in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdpCall {
    PasswordLogin,
    CodeExchange,
    Refresh,
    Revoke,
}

impl IdpCall {
    fn index(self) -> usize {
        match self {
            IdpCall::PasswordLogin => 0,
            IdpCall::CodeExchange => 1,
            IdpCall::Refresh => 2,
            IdpCall::Revoke => 3,
        }
    }
}

struct RefreshGrant {
    username: String,
    expires_at: DateTime<Utc>,
}

pub struct FakeIdpState {
    config: FakeIdpConfig,
    users: DashMap<String, String>,
    refresh_grants: DashMap<String, RefreshGrant>,
    pending_states: DashMap<String, ()>,
    codes: DashMap<String, String>,
    targets: DashMap<String, Target>,
    calls: [AtomicUsize; 4],
}

impl FakeIdpState {
    pub fn new(config: FakeIdpConfig) -> Self {
        let users = config.users.iter().cloned().collect();
        FakeIdpState {
            config,
            users,
            refresh_grants: DashMap::new(),
            pending_states: DashMap::new(),
            codes: DashMap::new(),
            targets: DashMap::new(),
            calls: Default::default(),
        }
    }

    pub fn check_password(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| stored.value() == password)
    }

    pub fn record(&self, call: IdpCall) {
        self.calls[call.index()].fetch_add(1, Ordering::SeqCst);
    }

    pub fn calls(&self, call: IdpCall) -> usize {
        self.calls[call.index()].load(Ordering::SeqCst)
    }

    // region tokens

    pub fn issue_tokens(&self, username: &str, with_profile: bool) -> Result<TokenResult, IdpError> {
        let (access_token, _) = encode_access(username, &self.config.jwt)?;
        let refresh_token = nanoid!(32);
        self.refresh_grants.insert(
            refresh_token.clone(),
            RefreshGrant {
                username: username.to_string(),
                expires_at: Utc::now() + self.config.refresh_ttl,
            },
        );

        Ok(TokenResult {
            access_token,
            refresh_token: Some(refresh_token),
            expires_in: self.config.jwt.access_ttl.as_secs_f64(),
            refresh_expires_in: Some(self.config.refresh_ttl.as_secs_f64()),
            user_info: with_profile.then(|| self.profile(username)),
        })
    }

    /// Refresh tokens are single use: redeeming one revokes it.
    pub fn redeem_refresh(&self, refresh_token: &str) -> Result<String, IdpError> {
        let (_, grant) = self
            .refresh_grants
            .remove(refresh_token)
            .ok_or(IdpError::RefreshFailed)?;
        if grant.expires_at <= Utc::now() {
            debug!(username = %grant.username, "expired refresh token presented");
            return Err(IdpError::RefreshFailed);
        }
        Ok(grant.username)
    }

    pub fn revoke(&self, refresh_token: &str) -> bool {
        self.refresh_grants.remove(refresh_token).is_some()
    }

    /// Revoke every outstanding refresh token, e.g. to simulate a server-side logout.
    pub fn revoke_all(&self) {
        self.refresh_grants.clear();
    }

    pub fn verify_access(&self, access_token: &str) -> Result<String, IdpError> {
        decode_access(access_token, &self.config.jwt)
    }

    pub fn profile(&self, username: &str) -> UserInfo {
        UserInfo {
            sub: Some(format!("user-{username}")),
            preferred_username: Some(username.to_string()),
            email: Some(format!("{username}@example.com")),
            extra: Default::default(),
        }
    }

    // endregion

    // region oidc

    pub fn start_oidc(&self) -> OidcLoginStart {
        let state = nanoid!(24);
        self.pending_states.insert(state.clone(), ());
        OidcLoginStart {
            auth_url: format!(
                "{}?client_id={}&response_type=code&state={}",
                self.config.authorize_url, self.config.jwt.audience, state
            ),
            state,
        }
    }

    /// What the provider's login page does: authenticate `username` for a
    /// pending `state` and hand out a one-time code.
    pub fn authorize(&self, username: &str, state: &str) -> Option<String> {
        if !self.users.contains_key(username) || !self.pending_states.contains_key(state) {
            return None;
        }
        let code = nanoid!(24);
        self.codes.insert(code.clone(), username.to_string());
        Some(code)
    }

    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    pub fn redeem_code(&self, code: &str, state: Option<&str>) -> Result<String, IdpError> {
        if let Some(state) = state {
            self.pending_states.remove(state);
        }
        self.codes
            .remove(code)
            .map(|(_, username)| username)
            .ok_or(IdpError::InvalidCode)
    }

    // endregion

    // region targets

    pub fn list_targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.targets.iter().map(|t| t.value().clone()).collect();
        targets.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        targets
    }

    pub fn get_target(&self, id: &str) -> Option<Target> {
        self.targets.get(id).map(|t| t.value().clone())
    }

    pub fn create_target(&self, input: NewTarget) -> Target {
        let id = uuid::Uuid::new_v4().to_string();
        let target = Target {
            id: TargetId(id.clone()),
            first_name: input.first_name,
            last_name: input.last_name,
            dob: input.dob,
        };
        self.targets.insert(id, target.clone());
        target
    }

    pub fn delete_target(&self, id: &str) -> bool {
        self.targets.remove(id).is_some()
    }

    // endregion
}
