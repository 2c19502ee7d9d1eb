use super::error::IdpError;
use super::state::{FakeIdpState, IdpCall};
use crate::domain_model::NewTarget;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use warp::http::{StatusCode, Uri};
use warp::{self, reject};

#[derive(Debug, Deserialize)]
pub struct PasswordGrantForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub grant_type: Option<String>,
}

pub async fn password_grant(
    form: PasswordGrantForm,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    state.record(IdpCall::PasswordLogin);
    if form.grant_type.as_deref().is_some_and(|g| g != "password") {
        return Err(reject::custom(IdpError::UnsupportedGrant));
    }
    if !state.check_password(&form.username, &form.password) {
        return Err(reject::custom(IdpError::InvalidCredentials));
    }

    let tokens = state
        .issue_tokens(&form.username, false)
        .map_err(reject::custom)?;
    info!(username = %form.username, "password grant issued");
    Ok(warp::reply::json(&tokens))
}

pub async fn oidc_login(state: Arc<FakeIdpState>) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&state.start_oidc()))
}

/// The provider's login page, reduced to query parameters.
#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub state: String,
    pub username: String,
    pub password: String,
}

pub async fn oidc_authorize(
    query: AuthorizeQuery,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !state.check_password(&query.username, &query.password) {
        return Err(reject::custom(IdpError::InvalidCredentials));
    }
    let code = state
        .authorize(&query.username, &query.state)
        .ok_or_else(|| reject::custom(IdpError::BadRequest("Unknown login state".to_string())))?;

    let location = format!("{}?code={}&state={}", state.redirect_uri(), code, query.state);
    let uri = location
        .parse::<Uri>()
        .map_err(|e| reject::custom(IdpError::Internal(e.to_string())))?;
    Ok(warp::redirect::found(uri))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

pub async fn oidc_callback(
    query: CallbackQuery,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    state.record(IdpCall::CodeExchange);
    let username = state
        .redeem_code(&query.code, query.state.as_deref())
        .map_err(reject::custom)?;

    let tokens = state.issue_tokens(&username, true).map_err(reject::custom)?;
    info!(%username, "authorization code exchanged");
    Ok(warp::reply::json(&tokens))
}

pub async fn oidc_user(
    username: String,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&state.profile(&username)))
}

/// Both endpoint profiles are served; they only differ in the field name.
#[derive(Debug, Deserialize)]
pub struct RefreshTokenBody {
    #[serde(alias = "refresh_token")]
    pub token: String,
}

pub async fn refresh(
    body: RefreshTokenBody,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    state.record(IdpCall::Refresh);
    let username = state.redeem_refresh(&body.token).map_err(reject::custom)?;

    let tokens = state.issue_tokens(&username, false).map_err(reject::custom)?;
    Ok(warp::reply::json(&tokens))
}

pub async fn logout(
    body: RefreshTokenBody,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    state.record(IdpCall::Revoke);
    let revoked = state.revoke(&body.token);
    Ok(warp::reply::json(&serde_json::json!({ "revoked": revoked })))
}

// region targets

pub async fn list_targets(
    _username: String,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&state.list_targets()))
}

pub async fn create_target(
    input: NewTarget,
    _username: String,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !input.is_complete() {
        return Err(reject::custom(IdpError::BadRequest(
            "first_name and last_name are required".to_string(),
        )));
    }
    let target = state.create_target(input);
    Ok(warp::reply::with_status(
        warp::reply::json(&target),
        StatusCode::CREATED,
    ))
}

pub async fn get_target(
    id: String,
    _username: String,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let target = state
        .get_target(&id)
        .ok_or_else(|| reject::custom(IdpError::NotFound))?;
    Ok(warp::reply::json(&target))
}

pub async fn delete_target(
    id: String,
    _username: String,
    state: Arc<FakeIdpState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !state.delete_target(&id) {
        return Err(reject::custom(IdpError::NotFound));
    }
    Ok(StatusCode::NO_CONTENT)
}

// endregion
