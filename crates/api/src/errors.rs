//! Mapping of failures onto HTTP responses.
//!
//! Every error body has the shape `{ "status": "Error", "message", "errors" }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use thiserror::Error;

use userhub_users::{ServiceError, ValidationErrors};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("validation failed")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => ApiError::NotFound("User not found".to_string()),
            ServiceError::Rejected(msg) => ApiError::BadRequest(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Repository(e) => ApiError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "unhandled error while serving request");
                ("Internal Server Error".to_string(), Value::Null)
            }
            ApiError::Validation(errors) => ("Validation failed".to_string(), field_map(&errors)),
            other => (other.to_string(), Value::Null),
        };

        json_error(status, message, errors)
    }
}

fn field_map(errors: &ValidationErrors) -> Value {
    let fields: Map<String, Value> = errors
        .fields()
        .map(|field| (field.to_string(), Value::from(errors.messages(field).to_vec())))
        .collect();
    Value::Object(fields)
}

pub fn json_error(status: StatusCode, message: impl Into<String>, errors: Value) -> Response {
    (
        status,
        Json(json!({
            "status": "Error",
            "message": message.into(),
            "errors": errors,
        })),
    )
        .into_response()
}
