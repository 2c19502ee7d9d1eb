use serde::Serialize;
use std::convert::Infallible;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

/// Error body shape of the real backend: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum IdpError {
    #[error("Invalid user credentials")]
    InvalidCredentials,
    #[error("Unsupported grant type")]
    UnsupportedGrant,
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("OIDC authentication failed")]
    InvalidCode,
    #[error("Token refresh failed")]
    RefreshFailed,
    #[error("Target not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdpError {
    pub fn status(&self) -> StatusCode {
        match self {
            IdpError::InvalidCredentials
            | IdpError::NotAuthenticated
            | IdpError::InvalidToken
            | IdpError::TokenExpired => StatusCode::UNAUTHORIZED,
            IdpError::UnsupportedGrant
            | IdpError::InvalidCode
            | IdpError::RefreshFailed
            | IdpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            IdpError::NotFound => StatusCode::NOT_FOUND,
            IdpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for IdpError {}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, detail) = if let Some(e) = err.find::<IdpError>() {
        (e.status(), e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (StatusCode::BAD_REQUEST, format!("Bad request: {:?}", err))
    };

    let json = warp::reply::json(&ErrorBody { detail });
    Ok(warp::reply::with_status(json, status))
}
