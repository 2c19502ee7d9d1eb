use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx from a protected endpoint; carries the server's detail text.
    #[error("{detail}")]
    Authorization { status: u16, detail: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authorization { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait TargetService: Send + Sync {
    async fn list(&self) -> Result<Vec<Target>, ApiError>;
    async fn get(&self, id: &TargetId) -> Result<Target, ApiError>;
    async fn create(&self, target: NewTarget) -> Result<Target, ApiError>;
    async fn delete(&self, id: &TargetId) -> Result<(), ApiError>;
}
