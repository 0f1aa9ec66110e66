//! Serving of visualization artifacts from the output store.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::state::GuardedOutputStore;
use super::ApiError;
use crate::output_store::OutputStoreError;

/// GET /api/outputs/{filename}
pub async fn serve_output(
    State(store): State<GuardedOutputStore>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = store.resolve(&filename).map_err(|e| match e {
        OutputStoreError::InvalidFilename(name) => {
            warn!("Rejected output filename {:?}", name);
            ApiError::InvalidFilename(name)
        }
        OutputStoreError::NotFound(name) => ApiError::OutputNotFound(name),
        other => {
            warn!("Failed to resolve output {:?}: {}", filename, other);
            ApiError::Internal
        }
    })?;

    // The file may vanish between resolve and open.
    let file = File::open(&path)
        .await
        .map_err(|_| ApiError::OutputNotFound(filename.clone()))?;
    debug!("Serving output {:?}", path);

    let body = Body::from_stream(ReaderStream::new(file));
    Ok(([(header::CONTENT_TYPE, "image/png")], body).into_response())
}
