use super::error::*;
use crate::application_port::AuthError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Upper bound on how long a handler may wait on the auth service.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Duration);

impl Deadline {
    pub fn new(timeout: Duration) -> Self {
        Self(timeout)
    }

    pub async fn run<T, F>(self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        match tokio::time::timeout(self.0, fut).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => {
                warn!(timeout_ms = self.0.as_millis() as u64, "request deadline elapsed");
                Err(ApiErrorCode::InternalError.into())
            }
        }
    }
}
