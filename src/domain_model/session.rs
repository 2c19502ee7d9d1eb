use serde::{Deserialize, Serialize};

/// Names of the persisted session keys for one front-end.
///
/// Both systems share one identity provider but keep separate sessions, so
/// the second system suffixes every key (`access_token2`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access_token: String,
    pub access_expires: String,
    pub refresh_token: String,
    pub refresh_expires: String,
    pub user_info: String,
    pub oidc_state: String,
}

impl StorageKeys {
    pub fn with_suffix(suffix: &str) -> Self {
        StorageKeys {
            access_token: format!("access_token{suffix}"),
            access_expires: format!("access_expires{suffix}"),
            refresh_token: format!("refresh_token{suffix}"),
            refresh_expires: format!("refresh_expires{suffix}"),
            user_info: format!("user_info{suffix}"),
            oidc_state: format!("oidc_state{suffix}"),
        }
    }

    /// Keys that make up a session. The transient OIDC state is not one of them.
    pub fn session_keys(&self) -> [&str; 5] {
        [
            &self.access_token,
            &self.access_expires,
            &self.refresh_token,
            &self.refresh_expires,
            &self.user_info,
        ]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        StorageKeys::with_suffix("")
    }
}

/// Token response shared by password login, code exchange and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds, relative to acquisition.
    pub expires_in: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

/// Profile returned by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcLoginStart {
    pub auth_url: String,
    pub state: String,
}
