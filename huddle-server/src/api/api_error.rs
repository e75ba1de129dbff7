use crate::error::{ErrorKind, ServiceError};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, error};

/// Error returned by HTTP handlers, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    BadRequest(&'static str),
    NotFound(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        Self::BadRequest("invalid request body")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Service(e) => e.to_string(),
            Self::BadRequest(msg) | Self::NotFound(msg) => (*msg).to_owned(),
        };

        if status.is_server_error() {
            error!("Request failed: {}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
