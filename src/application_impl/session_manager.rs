use super::token_claims;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_EXPIRY_MARGIN_SECS: i64 = 180;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub keys: StorageKeys,
    /// Tokens this close to expiry are refreshed before use.
    pub expiry_margin: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            keys: StorageKeys::default(),
            expiry_margin: Duration::seconds(DEFAULT_EXPIRY_MARGIN_SECS),
        }
    }
}

/// Owner of the client-side session.
///
/// The only component that writes session keys to the [`TokenStore`];
/// everything else asks it whether a session is usable. Session writes are
/// single batches, so a reader sees either the old or the new token pair.
///
/// State machine:
/// `NoSession -> Valid -> RefreshPending -> Valid | NoSession`, and
/// `Valid -> NoSession` on logout.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    auth_client: Arc<dyn AuthClient>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        auth_client: Arc<dyn AuthClient>,
        config: SessionConfig,
    ) -> Self {
        SessionManager {
            store,
            auth_client,
            clock: Arc::new(SystemClock),
            config,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.config.keys
    }

    // region queries

    /// Presence check only; an expired token still counts.
    pub async fn is_authenticated(&self) -> bool {
        self.read(&self.config.keys.access_token).await.is_some()
    }

    /// True when there is no token, its expiry cannot be determined, or it
    /// expires within the safety margin.
    pub async fn is_token_expired(&self) -> bool {
        match self.read(&self.config.keys.access_token).await {
            Some(token) => self.needs_refresh(&token).await,
            None => true,
        }
    }

    pub async fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        let token = self.read(&self.config.keys.access_token).await?;
        self.access_expiry(&token).await
    }

    pub async fn current_user(&self) -> Option<UserInfo> {
        let raw = self.read(&self.config.keys.user_info).await?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "cached user info is not valid json");
                None
            }
        }
    }

    // endregion

    // region renewal

    /// Return a token that is good for at least the safety margin, refreshing
    /// if needed. `None` means there is no usable session; any refresh failure
    /// has already cleared local state.
    pub async fn ensure_valid_token(&self) -> Option<String> {
        let seen = self.read(&self.config.keys.access_token).await?;
        if !self.needs_refresh(&seen).await {
            return Some(seen);
        }

        let _guard = self.refresh_lock.lock().await;

        // Whoever held the lock before us may already have refreshed or
        // cleared. A replaced token counts as fresh even if it is short-lived.
        let token = self.read(&self.config.keys.access_token).await?;
        if token != seen || !self.needs_refresh(&token).await {
            debug!("token renewed by a concurrent caller");
            return Some(token);
        }

        match self.refresh_session().await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "session refresh failed, clearing session");
                self.clear_session().await;
                None
            }
        }
    }

    async fn refresh_session(&self) -> Result<String, AuthError> {
        let keys = &self.config.keys;
        let refresh_token = self
            .read(&keys.refresh_token)
            .await
            .ok_or_else(|| AuthError::Refresh("no refresh token stored".to_string()))?;

        if let Some(expires) = self.read(&keys.refresh_expires).await {
            // Same margin as the access token.
            let horizon = self.clock.now() + self.config.expiry_margin;
            if parse_epoch(&expires).is_some_and(|at| horizon >= at) {
                return Err(AuthError::Refresh("refresh token expired".to_string()));
            }
        }

        debug!("refreshing access token");
        let result = self.auth_client.refresh(&refresh_token).await?;
        self.store_tokens(&result).await?;
        info!("session refreshed");
        Ok(result.access_token)
    }

    async fn needs_refresh(&self, token: &str) -> bool {
        match self.access_expiry(token).await {
            Some(expires) => self.clock.now() + self.config.expiry_margin >= expires,
            None => true,
        }
    }

    /// Stored absolute expiry first, then the token's own `exp` claim.
    async fn access_expiry(&self, token: &str) -> Option<DateTime<Utc>> {
        if let Some(stored) = self.read(&self.config.keys.access_expires).await {
            match parse_epoch(&stored) {
                Some(at) => return Some(at),
                None => debug!("stored access expiry is unreadable, decoding token"),
            }
        }
        match token_claims::decode_expiry(token) {
            Ok(at) => Some(at),
            Err(e) => {
                debug!(error = %e, "access token expiry unknown, treating as expired");
                None
            }
        }
    }

    // endregion

    // region login / logout

    /// Password grant. On failure the existing session is left as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResult, AuthError> {
        let result = self.auth_client.password_login(username, password).await?;
        self.store_tokens(&result).await?;
        info!(username, "password login succeeded");
        Ok(result)
    }

    /// Ask the broker for an authorization URL and remember its `state` for
    /// the callback.
    pub async fn begin_oidc_login(&self) -> Result<OidcLoginStart, AuthError> {
        let start = self.auth_client.oidc_login().await?;
        self.store
            .set(&self.config.keys.oidc_state, &start.state)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        debug!("oidc login started");
        Ok(start)
    }

    /// Finish the authorization-code flow. The remembered `state` is consumed
    /// before anything else, so it can never be replayed.
    pub async fn complete_oidc_login(
        &self,
        callback: &OidcCallback,
    ) -> Result<TokenResult, AuthError> {
        let state_key = &self.config.keys.oidc_state;
        let saved_state = self.read(state_key).await;
        if let Err(e) = self.store.remove(state_key).await {
            warn!(error = %e, "failed to delete consumed oidc state");
        }

        if let Some(error) = &callback.error {
            return Err(AuthError::Provider(error.clone()));
        }
        let code = callback
            .code
            .as_deref()
            .ok_or(AuthError::MissingParameter("code"))?;
        let state = callback
            .state
            .as_deref()
            .ok_or(AuthError::MissingParameter("state"))?;

        if saved_state.as_deref() != Some(state) {
            warn!("oidc callback state mismatch, refusing exchange");
            return Err(AuthError::StateMismatch);
        }

        let result = self.auth_client.oidc_exchange(code, state).await?;
        self.store_tokens(&result).await?;
        info!("oidc login succeeded");
        Ok(result)
    }

    /// Fetch the profile with a valid token and cache it.
    pub async fn fetch_user_info(&self) -> Result<UserInfo, AuthError> {
        let token = self
            .ensure_valid_token()
            .await
            .ok_or(AuthError::NotAuthenticated)?;
        let user = self.auth_client.user_info(&token).await?;

        let raw = serde_json::to_string(&user).map_err(|e| AuthError::Decode(e.to_string()))?;
        self.store
            .set(&self.config.keys.user_info, &raw)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(user)
    }

    /// Revoke server-side if possible, then always clear locally.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.read(&self.config.keys.refresh_token).await {
            if let Err(e) = self.auth_client.revoke(&refresh_token).await {
                warn!(error = %e, "server-side logout failed, clearing local session anyway");
            }
        }
        self.clear_session().await;
        info!("logged out");
    }

    // endregion

    // region store

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "token store read failed");
                None
            }
        }
    }

    /// A response without a refresh token keeps the current one; the broker
    /// did not rotate it.
    async fn store_tokens(&self, result: &TokenResult) -> Result<(), AuthError> {
        let keys = &self.config.keys;
        let now = self.clock.now();

        let mut writes = vec![
            StoreWrite::set(&keys.access_token, &result.access_token),
            StoreWrite::set(
                &keys.access_expires,
                expires_at(now, result.expires_in)?.timestamp().to_string(),
            ),
        ];
        if let Some(refresh_token) = &result.refresh_token {
            writes.push(StoreWrite::set(&keys.refresh_token, refresh_token));
            writes.push(match result.refresh_expires_in {
                Some(secs) => StoreWrite::set(
                    &keys.refresh_expires,
                    expires_at(now, secs)?.timestamp().to_string(),
                ),
                None => StoreWrite::remove(&keys.refresh_expires),
            });
        }
        if let Some(user) = &result.user_info {
            let raw = serde_json::to_string(user).map_err(|e| AuthError::Decode(e.to_string()))?;
            writes.push(StoreWrite::set(&keys.user_info, raw));
        }

        self.store
            .apply(writes)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    async fn clear_session(&self) {
        let writes = self
            .config
            .keys
            .session_keys()
            .into_iter()
            .map(StoreWrite::remove)
            .collect();
        if let Err(e) = self.store.apply(writes).await {
            warn!(error = %e, "failed to clear session");
        }
    }

    // endregion
}

/// `now + secs`, rejecting lifetimes that are not finite or do not fit a timestamp.
fn expires_at(now: DateTime<Utc>, secs: f64) -> Result<DateTime<Utc>, AuthError> {
    let millis = secs * 1000.0;
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(AuthError::Decode(format!("unusable token lifetime: {secs}")));
    }
    Duration::try_milliseconds(millis as i64)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| AuthError::Decode(format!("token lifetime out of range: {secs}")))
}

/// Epoch seconds, integer or fractional.
fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let secs = raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
    DateTime::from_timestamp(secs.trunc() as i64, 0)
}
