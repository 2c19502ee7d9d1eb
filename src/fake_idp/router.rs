use super::error::*;
use super::handler;
use super::state::FakeIdpState;
use std::convert::Infallible;
use std::sync::Arc;
use warp::filters::BoxedFilter;
use warp::{Filter, Reply, http, reject};

pub fn routes(
    state: Arc<FakeIdpState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let password_grant = warp::post()
        .and(warp::path!("auth" / "token"))
        .and(warp::body::form())
        .and(with(state.clone()))
        .and_then(handler::password_grant);

    let oidc_login = warp::get()
        .and(warp::path!("auth" / "oidc" / "login"))
        .and(with(state.clone()))
        .and_then(handler::oidc_login);

    let oidc_authorize = warp::get()
        .and(warp::path!("auth" / "oidc" / "authorize"))
        .and(warp::query::<handler::AuthorizeQuery>())
        .and(with(state.clone()))
        .and_then(handler::oidc_authorize);

    let oidc_callback = warp::get()
        .and(warp::path!("auth" / "oidc" / "callback"))
        .and(warp::query::<handler::CallbackQuery>())
        .and(with(state.clone()))
        .and_then(handler::oidc_callback);

    let oidc_user = warp::get()
        .and(warp::path!("auth" / "oidc" / "user"))
        .and(with_verification(state.clone()))
        .and(with(state.clone()))
        .and_then(handler::oidc_user);

    let refresh = warp::post()
        .and(warp::path!("auth" / "refresh").or(warp::path!("auth" / "oidc" / "refresh")).unify())
        .and(warp::body::json())
        .and(with(state.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path!("auth" / "logout").or(warp::path!("auth" / "oidc" / "logout")).unify())
        .and(warp::body::json())
        .and(with(state.clone()))
        .and_then(handler::logout);

    let list_targets = warp::get()
        .and(warp::path!("targets"))
        .and(with_verification(state.clone()))
        .and(with(state.clone()))
        .and_then(handler::list_targets);

    let create_target = warp::post()
        .and(warp::path!("targets"))
        .and(warp::body::json())
        .and(with_verification(state.clone()))
        .and(with(state.clone()))
        .and_then(handler::create_target);

    let get_target = warp::get()
        .and(warp::path!("targets" / String))
        .and(with_verification(state.clone()))
        .and(with(state.clone()))
        .and_then(handler::get_target);

    let delete_target = warp::delete()
        .and(warp::path!("targets" / String))
        .and(with_verification(state.clone()))
        .and(with(state))
        .and_then(handler::delete_target);

    password_grant
        .or(oidc_login)
        .or(oidc_authorize)
        .or(oidc_callback)
        .or(oidc_user)
        .or(refresh)
        .or(logout)
        .or(list_targets)
        .or(create_target)
        .or(get_target)
        .or(delete_target)
}

/// All routes mounted under `prefix` (e.g. `"api"`), with `{detail}` error bodies.
pub fn mounted(state: Arc<FakeIdpState>, prefix: &str) -> BoxedFilter<(Box<dyn Reply>,)> {
    let mut api = routes(state)
        .map(|reply| Box::new(reply) as Box<dyn Reply>)
        .boxed();
    for segment in prefix.split('/').filter(|s| !s.is_empty()).rev() {
        api = warp::path(segment.to_string()).and(api).boxed();
    }
    api.recover(recover_error)
        .map(|reply| Box::new(reply) as Box<dyn Reply>)
        .boxed()
}

fn with<T>(value: Arc<T>) -> impl Filter<Extract = (Arc<T>,), Error = Infallible> + Clone
where
    T: Send + Sync + ?Sized,
{
    warp::any().map(move || value.clone())
}

/// Resolve the bearer token to a username. A missing header is a 401, same as a bad token.
fn with_verification(
    state: Arc<FakeIdpState>,
) -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        move |header: Option<String>| {
            let state = state.clone();
            async move {
                let token = header
                    .as_deref()
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .ok_or_else(|| reject::custom(IdpError::NotAuthenticated))?;
                let username = state.verify_access(token).map_err(reject::custom)?;
                Ok::<_, warp::Rejection>(username)
            }
        },
    )
}
