//! API error types.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;

use crate::gateway::ApiError;
use crate::server::processing::ProcessingError;
use crate::server::repository::RepositoryError;
use crate::store::StoreError;

/// Internal server error message.
const INTERNAL_ERROR_MESSAGE: &str =
    "an internal server error occurred; contact the system administrator for more information";

/// API error type. Rendered as the `{errCode, errMsg}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A "bad request" error (`400`).
    #[error("{0}")]
    BadRequest(String),

    /// A "not found" error (`404`).
    #[error("{0}")]
    NotFound(String),

    /// A "conflict" error (`409`).
    #[error("{0}")]
    Conflict(String),

    /// An upload that was received but could not be stored (`500`).
    #[error("{0}")]
    Upload(String),

    /// The processing service failed (`502`).
    #[error(transparent)]
    BadGateway(#[from] ProcessingError),

    /// An "internal server" error (`500`). The detail is logged, not returned.
    #[error("internal server error: {0}")]
    Internal(#[from] StoreError),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => Self::NotFound(err.to_string()),
            RepositoryError::AlreadyProcessing(_) => Self::Conflict(err.to_string()),
            RepositoryError::AlreadyExists(_) | RepositoryError::UploadNotCompleted(_) => {
                Self::BadRequest(err.to_string())
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            Self::Upload(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Self::BadGateway(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            Self::Internal(_) => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from(INTERNAL_ERROR_MESSAGE),
                )
            }
        };

        let body = Json(ApiError::new(status.as_u16(), message));
        (status, body).into_response()
    }
}
