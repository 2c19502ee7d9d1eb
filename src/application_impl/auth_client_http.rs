use super::http_util::{error_detail, join_path};
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Which refresh/logout endpoints the identity broker exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointProfile {
    /// `POST /auth/refresh` and `/auth/logout` with `{"token": ...}`.
    #[default]
    Legacy,
    /// `POST /auth/oidc/refresh` and `/auth/oidc/logout` with `{"refresh_token": ...}`.
    Oidc,
}

impl EndpointProfile {
    fn refresh_path(self) -> &'static str {
        match self {
            EndpointProfile::Legacy => "auth/refresh",
            EndpointProfile::Oidc => "auth/oidc/refresh",
        }
    }

    fn logout_path(self) -> &'static str {
        match self {
            EndpointProfile::Legacy => "auth/logout",
            EndpointProfile::Oidc => "auth/oidc/logout",
        }
    }

    fn token_field(self) -> &'static str {
        match self {
            EndpointProfile::Legacy => "token",
            EndpointProfile::Oidc => "refresh_token",
        }
    }

    fn token_body(self, refresh_token: &str) -> HashMap<&'static str, &str> {
        HashMap::from([(self.token_field(), refresh_token)])
    }
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpAuthClient {
    base_url: Url,
    profile: EndpointProfile,
    http: reqwest::Client,
}

impl HttpAuthClient {
    pub fn new(base_url: Url, profile: EndpointProfile) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        HttpAuthClient {
            base_url,
            profile,
            http,
        }
    }

    /// Use a custom HTTP client (shared connection pool, other timeouts).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn profile(&self) -> EndpointProfile {
        self.profile
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        join_path(&self.base_url, path).map_err(|e| AuthError::InvalidUrl(e.to_string()))
    }

    async fn read_tokens(
        response: reqwest::Response,
        on_error: fn(String) -> AuthError,
    ) -> Result<TokenResult, AuthError> {
        if !response.status().is_success() {
            let (status, detail) = error_detail(response).await;
            debug!(status, "token endpoint rejected request");
            return Err(on_error(detail));
        }
        response
            .json::<TokenResult>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthClient for HttpAuthClient {
    async fn password_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResult, AuthError> {
        let params = [
            ("username", username),
            ("password", password),
            ("grant_type", "password"),
        ];
        let response = self
            .http
            .post(self.endpoint("auth/token")?)
            .form(&params)
            .send()
            .await?;

        Self::read_tokens(response, AuthError::Authentication).await
    }

    async fn oidc_login(&self) -> Result<OidcLoginStart, AuthError> {
        let response = self
            .http
            .get(self.endpoint("auth/oidc/login")?)
            .send()
            .await?;

        if !response.status().is_success() {
            let (_, detail) = error_detail(response).await;
            return Err(AuthError::Provider(detail));
        }
        response
            .json::<OidcLoginStart>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn oidc_exchange(&self, code: &str, state: &str) -> Result<TokenResult, AuthError> {
        let response = self
            .http
            .get(self.endpoint("auth/oidc/callback")?)
            .query(&[("code", code), ("state", state)])
            .send()
            .await?;

        Self::read_tokens(response, AuthError::Authentication).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResult, AuthError> {
        let response = self
            .http
            .post(self.endpoint(self.profile.refresh_path())?)
            .json(&self.profile.token_body(refresh_token))
            .send()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        Self::read_tokens(response, AuthError::Refresh).await
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint(self.profile.logout_path())?)
            .json(&self.profile.token_body(refresh_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response).await;
            return Err(AuthError::Authorization { status, detail });
        }
        Ok(())
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let response = self
            .http
            .get(self.endpoint("auth/oidc/user")?)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response).await;
            return Err(AuthError::Authorization { status, detail });
        }
        response
            .json::<UserInfo>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}
