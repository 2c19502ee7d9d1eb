use super::SessionManager;
use super::http_util::{error_detail, join_path};
use crate::application_port::ApiError;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// HTTP client for protected API calls.
///
/// Attaches a bearer token when the session can supply one, refreshing first
/// if the token is close to expiry. Without a session the request still goes
/// out, unauthenticated, and the server decides.
pub struct AuthorizedClient {
    session: Arc<SessionManager>,
    http: reqwest::Client,
    base_url: Url,
}

impl AuthorizedClient {
    pub fn new(session: Arc<SessionManager>, base_url: Url) -> Self {
        AuthorizedClient {
            session,
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Send a request; any non-2xx status becomes [`ApiError::Authorization`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = join_path(&self.base_url, path).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let mut request = self.http.request(method.clone(), url);

        if self.session.is_authenticated().await {
            match self.session.ensure_valid_token().await {
                Some(token) => request = request.bearer_auth(token),
                None => debug!("session could not be renewed, sending unauthenticated"),
            }
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, detail) = error_detail(response).await;
        debug!(%method, path, status, "api request rejected");
        Err(ApiError::Authorization { status, detail })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, None).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let response = self.send(Method::POST, path, Some(body)).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }
}
