use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(e) = err.find::<ApiError>() {
        e.clone()
    } else if err.is_not_found() {
        ApiError::from(ApiErrorCode::NotFound)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::MalformedInput, e.to_string())
    } else if err.find::<reject::UnsupportedMediaType>().is_some()
        || err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
    {
        ApiError::from(ApiErrorCode::MalformedInput)
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::from(ApiErrorCode::MethodNotAllowed)
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiError::from(ApiErrorCode::InternalError)
    };

    let status = error.code.status();
    let json = warp::reply::json(&ErrorBody { error });
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiErrorCode> for ApiError {
    fn from(code: ApiErrorCode) -> Self {
        Self::new(code, code.to_string())
    }
}

impl reject::Reject for ApiError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    #[error("Request is malformed")]
    MalformedInput,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already taken")]
    EmailTaken,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::MalformedInput => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("Internal error: {}", error);
        ApiError::from(ApiErrorCode::InternalError)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidInput(message) => ApiError::new(ApiErrorCode::MalformedInput, message),
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials.into(),
            AuthError::UserExists => ApiErrorCode::EmailTaken.into(),
            // Expired or forged, the caller gets the same answer.
            AuthError::TokenInvalid | AuthError::TokenExpired => ApiErrorCode::InvalidToken.into(),
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::UserExists, StatusCode::CONFLICT),
            (AuthError::TokenInvalid, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::Store("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).code.status(), status);
        }
    }

    #[test]
    fn internal_details_stay_out_of_the_body() {
        let error = ApiError::from(AuthError::Store("dsn=mysql://root:pw@db".into()));
        assert_eq!(error.code, ApiErrorCode::InternalError);
        assert!(!error.message.contains("mysql"));
    }

    #[test]
    fn codes_serialize_snake_case() {
        let body = serde_json::to_value(ErrorBody {
            error: ApiErrorCode::EmailTaken.into(),
        })
        .unwrap();
        assert_eq!(body["error"]["code"], "email_taken");
        assert_eq!(body["error"]["message"], "Email already taken");
    }
}
