//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body
//! `{"error": "..."}` with a status derived from the core error.
//!
//! Storage failures are logged with full detail, but only a generic message
//! is returned so SQL and file paths never reach clients.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use playcount_core::CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the tracking core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Core(e) => match e.root() {
                CoreError::NotFound { .. } | CoreError::UnknownUsername(_) => {
                    (StatusCode::NOT_FOUND, e.to_string())
                }
                CoreError::AlreadyExists { .. }
                | CoreError::TrackInProgress
                | CoreError::EmptyFollowList => (StatusCode::CONFLICT, e.to_string()),
                CoreError::ExternalFetch { .. } => (StatusCode::BAD_GATEWAY, e.to_string()),
                CoreError::MalformedHistory { .. }
                | CoreError::ReadOnly
                | CoreError::Database(_)
                | CoreError::Migrate(_)
                | CoreError::Track { .. } => {
                    error!(error = %e, "storage error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
                }
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = self.status_and_message();
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(e: PathRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(e: QueryRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use playcount_core::EntityKind;

    fn status(e: CoreError) -> StatusCode {
        ServerError::from(e).status_and_message().0
    }

    #[test]
    fn core_errors_map_to_statuses() {
        assert_eq!(
            status(CoreError::NotFound { kind: EntityKind::User, id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(CoreError::AlreadyExists { kind: EntityKind::Mapset, id: 1 }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(CoreError::EmptyFollowList), StatusCode::CONFLICT);
        assert_eq!(
            status(CoreError::ExternalFetch { user_id: 1, source: "timeout".into() }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(CoreError::ReadOnly), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn wrapped_track_errors_use_their_root() {
        let wrapped = CoreError::Track {
            user_id: 2,
            source: Box::new(CoreError::AlreadyExists { kind: EntityKind::Beatmap, id: 9 }),
        };
        let (code, message) = ServerError::from(wrapped).status_and_message();
        assert_eq!(code, StatusCode::CONFLICT);
        assert!(message.contains("user 2"));
    }
}
