//! Mapping from service errors to HTTP responses.
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rating_engine::{AuthError, ContentError, VotingError};
use tracing::error;

/// Errors a handler can return. Every variant renders as
/// `{ "status": "error", "message": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Voting(#[from] VotingError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Voting(err) => match err {
                VotingError::Unauthenticated => StatusCode::UNAUTHORIZED,
                VotingError::ItemNotFound(_) => StatusCode::NOT_FOUND,
                VotingError::StorageUnavailable(_)
                | VotingError::ConflictRetryExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                VotingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Content(err) => match err {
                ContentError::Unauthenticated => StatusCode::UNAUTHORIZED,
                ContentError::Forbidden => StatusCode::FORBIDDEN,
                ContentError::Validation(_) => StatusCode::BAD_REQUEST,
                ContentError::NotFound(_) => StatusCode::NOT_FOUND,
                ContentError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ContentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Voting(err) => err.user_message().to_string(),
            Self::Content(err) => err.user_message(),
            Self::Auth(_) => "Sign-in is temporarily unavailable. Please try again.".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        }

        (
            status,
            Json(serde_json::json!({
                "status": "error",
                "message": self.user_message(),
            })),
        )
            .into_response()
    }
}
