use super::deadline::Deadline;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct TokenPairResponse {
    access_token: String,
    refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token.raw,
            refresh_token: pair.refresh_token.raw,
        }
    }
}

#[derive(Debug, Serialize)]
struct SignoutResponse {
    message: &'static str,
    revoked: u64,
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user_id: UserId,
}

pub async fn signup(
    body: SignupRequest,
    auth_service: Arc<dyn AuthService>,
    deadline: Deadline,
) -> Result<impl warp::Reply, warp::Rejection> {
    deadline
        .run(auth_service.signup(SignupInput {
            email: body.email,
            password: body.password,
        }))
        .await
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&MessageResponse {
            message: "successfully signed up user",
        }),
        StatusCode::CREATED,
    ))
}

pub async fn signin(
    body: SigninRequest,
    auth_service: Arc<dyn AuthService>,
    deadline: Deadline,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = deadline
        .run(auth_service.signin(SigninInput {
            email: body.email,
            password: body.password,
        }))
        .await
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&TokenPairResponse::from(pair)))
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
    deadline: Deadline,
) -> Result<impl warp::Reply, warp::Rejection> {
    let refresh_token = body.refresh_token.trim();
    if refresh_token.is_empty() {
        return Err(reject::custom(ApiError::new(
            ApiErrorCode::MalformedInput,
            "refresh_token is required",
        )));
    }

    let pair = deadline
        .run(auth_service.refresh(refresh_token))
        .await
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&TokenPairResponse::from(pair)))
}

pub async fn signout(
    user_id: UserId,
    auth_service: Arc<dyn AuthService>,
    deadline: Deadline,
) -> Result<impl warp::Reply, warp::Rejection> {
    let revoked = deadline
        .run(auth_service.signout(user_id))
        .await
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&SignoutResponse {
        message: "successfully signed out",
        revoked,
    }))
}

pub async fn me(user_id: UserId) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&MeResponse { user_id }))
}
