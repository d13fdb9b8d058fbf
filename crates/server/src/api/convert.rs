//! `POST /api/v1/convert`: run one conversion and return or deliver the result.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use convertino_core::{paths::default_target, ConversionOptions, ConversionRequest};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::delivery::{deliver, DeliveryOptions};
use crate::state::AppState;

/// Request body for a conversion.
#[derive(Debug, Deserialize)]
pub struct ConvertBody {
    /// Source file inside the files root; relative paths start there.
    pub source: PathBuf,
    /// Output format, e.g. `pdf`.
    pub format: String,
    /// Target file inside the files root; defaults to the source directory.
    #[serde(default)]
    pub target: Option<PathBuf>,
    #[serde(default)]
    pub cache_key: Option<String>,
    #[serde(default)]
    pub uncached: bool,
    #[serde(default)]
    pub sandbox: bool,
    /// Backend-specific options passed to the convert task.
    #[serde(default)]
    pub options: ConversionOptions,
    /// Stream the converted file back instead of answering with JSON.
    #[serde(default)]
    pub deliver: Option<DeliveryOptions>,
}

pub async fn convert(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Json(body): Json<ConvertBody>,
) -> Result<Response, ApiError> {
    let files = state.files_root();
    let source = files.resolve(&body.source).await?;

    let mut builder = ConversionRequest::builder()
        .file(source)
        .format(body.format)
        .uncached(body.uncached)
        .sandbox(body.sandbox)
        .options(body.options)
        .requested_by(principal);
    if let Some(target) = body.target {
        builder = builder.target(files.resolve(&target).await?);
    }
    if let Some(key) = body.cache_key {
        builder = builder.cache_key(key);
    }

    let request = builder.build()?;
    if request.target().is_none() {
        // A link at the default target could point anywhere.
        files
            .resolve(&default_target(request.source(), request.format()))
            .await?;
    }
    let artifact = state.orchestrator().convert(&request).await?;

    match body.deliver {
        Some(options) => {
            info!(path = %artifact.path.display(), "Delivering converted file");
            deliver(&artifact.path, &options)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to read converted file: {}", e)))
        }
        None => Ok(Json(artifact).into_response()),
    }
}
