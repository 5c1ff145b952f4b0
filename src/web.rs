//! HTTP front end: an upload form and the endpoint that receives pairs.
//!
//! `POST /` takes a multipart body with repeated `source` and `target` file
//! fields, paired by position. Pairs that fail are skipped; the response lists
//! whatever was written.

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::pipeline::{self, ImageInput};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>EXIF Copy</title>
</head>
<body>
  <h1>EXIF Copy</h1>
  <form method="post" enctype="multipart/form-data">
    <p><label>Source photos (EXIF and aspect ratio)<br>
      <input type="file" name="source" accept="image/jpeg,image/png,image/webp" multiple></label></p>
    <p><label>Target photos (pixels)<br>
      <input type="file" name="target" accept="image/jpeg,image/png,image/webp" multiple></label></p>
    <p><button type="submit">Process</button></p>
  </form>
</body>
</html>
"#;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Body of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    /// Output directory.
    pub path: String,
    /// File names written, in upload order.
    pub processed_files: Vec<String>,
}

/// Body of a rejected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A request-level failure, rendered as JSON.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("{}", self.message);
        } else {
            log::warn!("Rejected upload: {}", self.message);
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Build the application router.
pub fn router(config: Config) -> Router {
    let body_limit = config.server.max_upload_bytes;
    Router::new()
        .route("/", get(index).post(upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState {
            config: Arc::new(config),
        })
}

/// Serve the application on an already-bound listener until the process exits.
pub async fn serve(listener: TcpListener, config: Config) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    log::info!("Listening on http://{addr}");
    log::info!("Results are saved to {}", config.output.directory.display());

    axum::serve(listener, router(config))
        .await
        .context("HTTP server failed")
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut sources = Vec::new();
    let mut targets = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed upload: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name != "source" && name != "target" {
            log::debug!("Ignoring form field {name:?}");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read {name} upload: {e}")))?;

        // An empty file input still submits a nameless, empty part.
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }

        let input = ImageInput::new(file_name, bytes.to_vec());
        if name == "source" {
            sources.push(input);
        } else {
            targets.push(input);
        }
    }

    if sources.is_empty() || targets.is_empty() {
        return Err(ApiError::bad_request("No files selected for upload"));
    }
    if sources.len() != targets.len() {
        return Err(ApiError::bad_request(format!(
            "The number of source and target files must match ({} sources, {} targets)",
            sources.len(),
            targets.len()
        )));
    }

    log::info!("Received {} pair(s)", sources.len());

    let config = Arc::clone(&state.config);
    let report = tokio::task::spawn_blocking(move || {
        pipeline::process_pairs(&sources, &targets, &config)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Processing task failed: {e}")))?
    .map_err(|e| ApiError::internal(format!("{e:#}")))?;

    log::info!(
        "Done: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );

    Ok(Json(UploadResponse {
        message: "Success".to_string(),
        path: report.output_dir.display().to_string(),
        processed_files: report.processed_files(),
    }))
}
