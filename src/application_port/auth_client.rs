use crate::domain_model::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("oidc state does not match the one issued")]
    StateMismatch,
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error("missing callback parameter: {0}")]
    MissingParameter(&'static str),
    #[error("token refresh failed: {0}")]
    Refresh(String),
    #[error("request rejected with status {status}: {detail}")]
    Authorization { status: u16, detail: String },
    #[error("no valid session")]
    NotAuthenticated,
    #[error("token decode error: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Transport(err.to_string())
    }
}

/// Network calls against the identity broker. None of these touch local state.
#[async_trait::async_trait]
pub trait AuthClient: Send + Sync {
    async fn password_login(&self, username: &str, password: &str)
    -> Result<TokenResult, AuthError>;
    async fn oidc_login(&self) -> Result<OidcLoginStart, AuthError>;
    async fn oidc_exchange(&self, code: &str, state: &str) -> Result<TokenResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResult, AuthError>;
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
    async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError>;
}
