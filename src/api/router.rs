use super::deadline::Deadline;
use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let deadline = Deadline::new(server.request_timeout);

    // Path before method, so an unknown path is a 404 and not a 405.
    let ping = warp::path("ping")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| "pong");

    let signup = warp::path!("auth" / "signup")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_deadline(deadline))
        .and_then(handler::signup);

    let signin = warp::path!("auth" / "signin")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_deadline(deadline))
        .and_then(handler::signin);

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_deadline(deadline))
        .and_then(handler::refresh);

    let signout = warp::path!("auth" / "signout")
        .and(warp::post())
        .and(with_verification(server.auth_service.clone(), deadline))
        .and(with(server.auth_service.clone()))
        .and(with_deadline(deadline))
        .and_then(handler::signout);

    let me = warp::path!("me")
        .and(warp::get())
        .and(with_verification(server.auth_service.clone(), deadline))
        .and_then(handler::me);

    ping.or(signup).or(signin).or(refresh).or(signout).or(me)
}

/// Routes with error recovery and request logging, ready to serve.
pub fn app(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    routes(server)
        .recover(recover_error)
        .with(warp::log::custom(log_request))
}

fn log_request(info: warp::log::Info<'_>) {
    tracing::info!(
        method = %info.method(),
        path = info.path(),
        status = info.status().as_u16(),
        elapsed_ms = info.elapsed().as_millis() as u64,
        "http request"
    );
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_deadline(deadline: Deadline) -> impl Filter<Extract = (Deadline,), Error = Infallible> + Clone {
    warp::any().map(move || deadline)
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
    deadline: Deadline,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        move |header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let token = header
                    .as_deref()
                    .and_then(bearer_token)
                    .ok_or_else(|| reject::custom(ApiError::from(ApiErrorCode::InvalidToken)))?;
                deadline
                    .run(auth_service.authorize(token))
                    .await
                    .map_err(reject::custom)
            }
        },
    )
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
