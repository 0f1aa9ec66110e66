//! Feature extractor HTTP routes.
//!
//! Provides endpoints for:
//! - Running one detection method on an uploaded image
//! - Running every method on the same image for comparison

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{debug, error, info};

use crate::features::{DetectionMethod, PipelineError, ProcessingResult};
use crate::uploads::{UploadError, UploadStore, UploadedFile};

use super::state::{GuardedFeatureExtractor, GuardedUploadStore, ServerState};
use super::{ApiError, ServerConfig};

pub const FEATURE_EXTRACTOR_PATH: &str = "/api/tools/feature-extractor";
pub const FEATURE_COMPARE_PATH: &str = "/api/tools/feature-extractor/compare";

const IMAGE_FIELD: &str = "image";
const METHOD_FIELD: &str = "method";

/// Raw multipart fields, before validation.
#[derive(Default)]
struct UploadForm {
    image: Option<(String, Bytes)>,
    method: Option<String>,
}

fn map_multipart_error(err: MultipartError, limit: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(limit)
    } else {
        ApiError::MalformedUpload(err.body_text())
    }
}

async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
    limit: u64,
) -> Result<UploadForm, ApiError> {
    // A request that isn't multipart simply carries no file.
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ApiError::PayloadTooLarge(limit))
        }
        Err(_) => return Err(ApiError::MissingFile),
    };

    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(e, limit))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            // Only file parts count as the image, a plain text field does not.
            IMAGE_FIELD if form.image.is_none() => {
                if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| map_multipart_error(e, limit))?;
                    form.image = Some((file_name, bytes));
                }
            }
            METHOD_FIELD if form.method.is_none() => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| map_multipart_error(e, limit))?;
                form.method = Some(value);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// File present, filename non-empty, extension allowed; in that order.
fn validate_image(
    image: Option<(String, Bytes)>,
    uploads: &UploadStore,
) -> Result<(String, Bytes), ApiError> {
    let (filename, data) = image.ok_or(ApiError::MissingFile)?;
    if filename.is_empty() {
        return Err(ApiError::EmptyFilename);
    }
    if !uploads.is_allowed(&filename) {
        return Err(ApiError::InvalidFileType(
            uploads.allowed_extensions().to_vec(),
        ));
    }
    Ok((filename, data))
}

fn parse_method(method: Option<&str>) -> Result<DetectionMethod, ApiError> {
    match method {
        None => Ok(DetectionMethod::default()),
        Some(name) => name.parse().map_err(|_| ApiError::InvalidMethod),
    }
}

async fn save_upload(
    uploads: &UploadStore,
    filename: &str,
    data: &[u8],
) -> Result<UploadedFile, ApiError> {
    uploads.save(filename, data).await.map_err(|e| match e {
        UploadError::FileTooLarge(_, max) => ApiError::PayloadTooLarge(max),
        UploadError::Io(err) => {
            error!("Failed to save upload {}: {}", filename, err);
            ApiError::Processing(err.to_string())
        }
    })
}

/// Runs blocking pipeline work off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            error!("Feature extraction failed: {:?}", err);
            Err(ApiError::Processing(err.to_string()))
        }
        Err(join_err) => {
            error!("Feature extraction task failed: {}", join_err);
            Err(ApiError::Processing(join_err.to_string()))
        }
    }
}

/// POST /api/tools/feature-extractor - Run one method on an uploaded image
async fn extract_features(
    State(config): State<ServerConfig>,
    State(uploads): State<GuardedUploadStore>,
    State(extractor): State<GuardedFeatureExtractor>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessingResult>, ApiError> {
    let form = read_upload_form(multipart, config.max_upload_bytes).await?;
    let (filename, data) = validate_image(form.image, &uploads)?;
    let method = parse_method(form.method.as_deref())?;

    let upload = save_upload(&uploads, &filename, &data).await?;
    debug!("Processing {} with {}", filename, method);

    let path = upload.path().to_path_buf();
    let outcome = run_blocking(move || extractor.process(&path, method)).await;
    drop(upload);

    let result = outcome?;
    info!("Processed {} with {}", filename, method);
    Ok(Json(result))
}

/// POST /api/tools/feature-extractor/compare - Run every method on an uploaded image
async fn compare_features(
    State(config): State<ServerConfig>,
    State(uploads): State<GuardedUploadStore>,
    State(extractor): State<GuardedFeatureExtractor>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BTreeMap<String, ProcessingResult>>, ApiError> {
    let form = read_upload_form(multipart, config.max_upload_bytes).await?;
    let (filename, data) = validate_image(form.image, &uploads)?;

    let upload = save_upload(&uploads, &filename, &data).await?;
    debug!("Comparing all methods on {}", filename);

    let path = upload.path().to_path_buf();
    let outcome = run_blocking(move || Ok(extractor.compare_methods(&path))).await;
    drop(upload);

    Ok(Json(outcome?))
}

/// Build the feature extractor routes, with the upload body limit applied.
pub fn feature_routes(max_upload_bytes: u64) -> Router<ServerState> {
    Router::new()
        .route(FEATURE_EXTRACTOR_PATH, post(extract_features))
        .route(FEATURE_COMPARE_PATH, post(compare_features))
        .layer(DefaultBodyLimit::max(max_upload_bytes as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn store() -> UploadStore {
        UploadStore::new(
            Path::new("unused"),
            1024,
            vec!["png".to_string(), "jpg".to_string()],
        )
    }

    fn image(name: &str) -> Option<(String, Bytes)> {
        Some((name.to_string(), Bytes::from_static(b"data")))
    }

    #[test]
    fn validation_order() {
        let uploads = store();

        assert!(matches!(
            validate_image(None, &uploads),
            Err(ApiError::MissingFile)
        ));
        assert!(matches!(
            validate_image(image(""), &uploads),
            Err(ApiError::EmptyFilename)
        ));
        assert!(matches!(
            validate_image(image("notes.txt"), &uploads),
            Err(ApiError::InvalidFileType(_))
        ));
        assert!(validate_image(image("photo.JPG"), &uploads).is_ok());
    }

    #[test]
    fn method_defaults_to_sift() {
        assert_eq!(parse_method(None).unwrap(), DetectionMethod::Sift);
        assert_eq!(parse_method(Some("BRISK")).unwrap(), DetectionMethod::Brisk);
        assert!(matches!(
            parse_method(Some("FOO")),
            Err(ApiError::InvalidMethod)
        ));
        assert!(matches!(parse_method(Some("")), Err(ApiError::InvalidMethod)));
    }
}
