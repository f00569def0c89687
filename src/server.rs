use axum::extract::multipart::MultipartError;
use axum::extract::rejection::FormRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::calc::calculate_volatility::{compute_volatility_with, VolatilityResult};
use crate::config::AppConfig;
use crate::data::csv_loader::{load_close_prices, load_close_prices_from_path};
use crate::error::VolatilityError;

#[cfg(test)]
#[path = "server_test.rs"]
mod server_test;

/// Where the price table for one request comes from.
#[derive(Debug)]
enum DataSource {
    Upload(Vec<u8>),
    Path(String),
}

pub fn router(config: AppConfig) -> Router {
    let body_limit = config.max_upload_bytes;

    Router::new()
        .route("/compute_volatility", post(compute_volatility_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(Arc::new(config))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn compute_volatility_handler(
    State(config): State<Arc<AppConfig>>,
    request: Request,
) -> Result<Json<VolatilityResult>, VolatilityError> {
    let outcome = compute_for_request(&config, request).await;

    match &outcome {
        Ok(result) => info!(
            "Computed volatility: daily={:.4}, annualized={:.4}",
            result.daily_volatility, result.annualized_volatility
        ),
        Err(e) => warn!("Volatility request rejected ({}): {}", e.status(), e),
    }

    outcome.map(Json)
}

async fn compute_for_request(
    config: &AppConfig,
    request: Request,
) -> Result<VolatilityResult, VolatilityError> {
    let prices = match read_data_source(request, config.max_upload_bytes).await? {
        DataSource::Upload(bytes) => {
            debug!("Reading uploaded CSV ({} bytes)", bytes.len());
            load_close_prices(bytes.as_slice(), &config.close_column)?
        }
        DataSource::Path(path) => {
            debug!("Reading CSV from {}", path);
            load_close_prices_from_path(&path, &config.close_column).await?
        }
    };

    compute_volatility_with(&prices, config.annualization)
}

/// Accepts the fields as `multipart/form-data` or, for `directory` alone,
/// `application/x-www-form-urlencoded`.
async fn read_data_source(request: Request, limit: usize) -> Result<DataSource, VolatilityError> {
    let is_urlencoded = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_urlencoded {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| form_error(e, limit))?;
        return choose_source(None, fields.get("directory").cloned());
    }

    // A request without a multipart body carries neither field
    match Multipart::from_request(request, &()).await {
        Ok(multipart) => read_multipart(multipart, limit).await,
        Err(rejection) => {
            debug!("No form body: {}", rejection);
            Err(VolatilityError::MissingInput)
        }
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    limit: usize,
) -> Result<DataSource, VolatilityError> {
    let mut upload: Option<Vec<u8>> = None;
    let mut path: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let has_filename = field.file_name().is_some_and(|name| !name.is_empty());
                let bytes = field.bytes().await.map_err(|e| upload_error(e, limit))?;
                // Browsers send an empty unnamed part when no file was chosen
                if has_filename || !bytes.is_empty() {
                    upload = Some(bytes.to_vec());
                }
            }
            Some("directory") => {
                path = Some(field.text().await.map_err(|e| upload_error(e, limit))?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    choose_source(upload, path)
}

/// Picks the uploaded `file` over the `directory` path when both are sent.
fn choose_source(
    upload: Option<Vec<u8>>,
    path: Option<String>,
) -> Result<DataSource, VolatilityError> {
    let path = path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    match (upload, path) {
        (Some(bytes), _) => Ok(DataSource::Upload(bytes)),
        (None, Some(path)) => Ok(DataSource::Path(path)),
        (None, None) => Err(VolatilityError::MissingInput),
    }
}

fn upload_error(e: MultipartError, limit: usize) -> VolatilityError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        VolatilityError::PayloadTooLarge { limit }
    } else {
        VolatilityError::Upload(e)
    }
}

fn form_error(e: FormRejection, limit: usize) -> VolatilityError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        VolatilityError::PayloadTooLarge { limit }
    } else {
        VolatilityError::Form(e)
    }
}
