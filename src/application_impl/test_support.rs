use crate::application_port::*;
use crate::domain_model::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub fn token_result(access: &str, refresh: Option<&str>, expires_in: f64) -> TokenResult {
    TokenResult {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_in,
        refresh_expires_in: None,
        user_info: None,
    }
}

/// `AuthClient` that replays canned responses and records every call.
#[derive(Default)]
pub struct ScriptedAuthClient {
    login: Mutex<Option<Result<TokenResult, AuthError>>>,
    oidc_start: Mutex<Option<OidcLoginStart>>,
    exchange: Mutex<Option<Result<TokenResult, AuthError>>>,
    refreshes: Mutex<VecDeque<Result<TokenResult, AuthError>>>,
    user: Mutex<Option<UserInfo>>,
    refresh_delay: Option<Duration>,
    failing_revoke: bool,

    login_calls: Mutex<Vec<(String, String)>>,
    exchange_calls: Mutex<usize>,
    refresh_calls: Mutex<Vec<String>>,
    revoke_calls: Mutex<Vec<String>>,
}

impl ScriptedAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login(self, result: Result<TokenResult, AuthError>) -> Self {
        *self.login.lock().unwrap() = Some(result);
        self
    }

    pub fn with_oidc_start(self, auth_url: &str, state: &str) -> Self {
        *self.oidc_start.lock().unwrap() = Some(OidcLoginStart {
            auth_url: auth_url.to_string(),
            state: state.to_string(),
        });
        self
    }

    pub fn with_exchange(self, result: Result<TokenResult, AuthError>) -> Self {
        *self.exchange.lock().unwrap() = Some(result);
        self
    }

    pub fn push_refresh(self, result: Result<TokenResult, AuthError>) -> Self {
        self.refreshes.lock().unwrap().push_back(result);
        self
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn with_user(self, user: UserInfo) -> Self {
        *self.user.lock().unwrap() = Some(user);
        self
    }

    pub fn with_failing_revoke(mut self) -> Self {
        self.failing_revoke = true;
        self
    }

    pub fn login_calls(&self) -> Vec<(String, String)> {
        self.login_calls.lock().unwrap().clone()
    }

    pub fn exchange_calls(&self) -> usize {
        *self.exchange_calls.lock().unwrap()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.lock().unwrap().len()
    }

    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.refresh_calls.lock().unwrap().clone()
    }

    pub fn revoked_tokens(&self) -> Vec<String> {
        self.revoke_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AuthClient for ScriptedAuthClient {
    async fn password_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResult, AuthError> {
        self.login_calls
            .lock()
            .unwrap()
            .push((username.to_string(), password.to_string()));
        self.login
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(AuthError::Authentication("no scripted login".into())))
    }

    async fn oidc_login(&self) -> Result<OidcLoginStart, AuthError> {
        self.oidc_start
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthError::Provider("no scripted oidc start".into()))
    }

    async fn oidc_exchange(&self, _code: &str, _state: &str) -> Result<TokenResult, AuthError> {
        *self.exchange_calls.lock().unwrap() += 1;
        self.exchange
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(AuthError::Authentication("no scripted exchange".into())))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResult, AuthError> {
        let next = {
            self.refresh_calls
                .lock()
                .unwrap()
                .push(refresh_token.to_string());
            self.refreshes.lock().unwrap().pop_front()
        };
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Err(AuthError::Refresh("no scripted refresh".into())))
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.revoke_calls
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if self.failing_revoke {
            Err(AuthError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }

    async fn user_info(&self, _access_token: &str) -> Result<UserInfo, AuthError> {
        self.user.lock().unwrap().clone().ok_or(AuthError::Authorization {
            status: 401,
            detail: "Not authenticated".into(),
        })
    }
}
