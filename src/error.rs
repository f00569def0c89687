use axum::extract::multipart::MultipartError;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolatilityError {
    #[error("Either provide a CSV file or a directory parameter.")]
    MissingInput,

    #[error("CSV file not found in the specified directory: {path}")]
    DatasetNotFound { path: String },

    #[error("Malformed price data: {0}")]
    MalformedData(String),

    #[error("Insufficient price data: need at least {required} prices, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Insufficient return data: need at least {required} returns, got {actual}")]
    InsufficientReturns { required: usize, actual: usize },

    #[error("Upload exceeds the {limit}-byte request limit")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("Invalid form body: {0}")]
    Form(#[from] FormRejection),
}

impl VolatilityError {
    pub fn status(&self) -> StatusCode {
        match self {
            VolatilityError::MissingInput | VolatilityError::MalformedData(_) => {
                StatusCode::BAD_REQUEST
            }
            VolatilityError::DatasetNotFound { .. } => StatusCode::NOT_FOUND,
            VolatilityError::InsufficientData { .. }
            | VolatilityError::InsufficientReturns { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            VolatilityError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            VolatilityError::Upload(e) => e.status(),
            VolatilityError::Form(e) => e.status(),
        }
    }
}

impl IntoResponse for VolatilityError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
