//! Feature pipeline: decode → grayscale → detect → render → statistics.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use opencv::core::Mat;
use opencv::imgcodecs;
use opencv::imgproc;
use opencv::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    compute_statistics, create_detector, render_visualization, DetectionMethod, DetectorError,
    FeatureSet, Statistics,
};
use crate::output_store::{OutputStore, ReservedArtifact};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Could not load image: {0}")]
    ImageDecode(String),

    #[error("Feature detection failed: {0}")]
    Detection(#[from] DetectorError),

    #[error("Could not render visualization: {0}")]
    Render(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSuccess {
    pub success: bool,
    pub method: DetectionMethod,
    pub image_url: String,
    pub statistics: Statistics,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingFailure {
    pub success: bool,
    pub error: String,
}

/// Response body of a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProcessingResult {
    Success(ProcessingSuccess),
    Failure(ProcessingFailure),
}

impl ProcessingResult {
    pub fn success(method: DetectionMethod, image_url: String, statistics: Statistics) -> Self {
        let message = format!(
            "Successfully detected {} keypoints using {}",
            statistics.num_keypoints, method
        );
        ProcessingResult::Success(ProcessingSuccess {
            success: true,
            method,
            image_url,
            statistics,
            message,
        })
    }

    pub fn failure(error: impl ToString) -> Self {
        ProcessingResult::Failure(ProcessingFailure {
            success: false,
            error: error.to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success(_))
    }
}

/// Turns an image on disk into a [`ProcessingResult`].
///
/// Implementations are blocking; the HTTP layer calls them from `spawn_blocking`.
pub trait FeatureExtractor: Send + Sync {
    fn process(
        &self,
        image_path: &Path,
        method: DetectionMethod,
    ) -> Result<ProcessingResult, PipelineError>;

    /// Runs every method on the same image. A failing method is reported in place.
    fn compare_methods(&self, image_path: &Path) -> BTreeMap<String, ProcessingResult> {
        DetectionMethod::ALL
            .par_iter()
            .map(|method| {
                let result = self
                    .process(image_path, *method)
                    .unwrap_or_else(ProcessingResult::failure);
                (method.to_string(), result)
            })
            .collect()
    }
}

/// OpenCV backed pipeline writing visualizations into an [`OutputStore`].
///
/// The store is shared with the HTTP layer serving the artifacts.
pub struct FeaturePipeline {
    output_store: Arc<OutputStore>,
}

impl FeaturePipeline {
    pub fn new(output_store: Arc<OutputStore>) -> Self {
        Self { output_store }
    }

    /// Renders into the artifact's staging file, then commits it. On any failure the
    /// reservation is discarded so nothing half-written is left behind.
    fn publish(
        gray: &Mat,
        features: &FeatureSet,
        artifact: ReservedArtifact,
    ) -> Result<String, PipelineError> {
        let outcome = render_visualization(gray, features, &artifact.staging_path())
            .map_err(|e| e.to_string())
            .and_then(|()| artifact.commit().map_err(|e| e.to_string()));

        match outcome {
            Ok(()) => Ok(artifact.url()),
            Err(err) => {
                warn!("Rendering {} failed: {}", artifact.filename, err);
                artifact.discard();
                Err(PipelineError::Render(err))
            }
        }
    }

    fn load_grayscale(image_path: &Path) -> Result<Mat, PipelineError> {
        let display = image_path.display().to_string();
        if !image_path.exists() {
            return Err(PipelineError::ImageNotFound(display));
        }
        let path = image_path
            .to_str()
            .ok_or_else(|| PipelineError::ImageDecode(display.clone()))?;

        let image = imgcodecs::imread(path, imgcodecs::IMREAD_COLOR)
            .map_err(|e| PipelineError::ImageDecode(format!("{}: {}", display, e)))?;
        if image.empty() {
            return Err(PipelineError::ImageDecode(display));
        }

        let mut gray = Mat::default();
        imgproc::cvt_color_def(&image, &mut gray, imgproc::COLOR_BGR2GRAY)
            .map_err(|e| PipelineError::ImageDecode(format!("{}: {}", display, e)))?;
        Ok(gray)
    }
}

impl FeatureExtractor for FeaturePipeline {
    fn process(
        &self,
        image_path: &Path,
        method: DetectionMethod,
    ) -> Result<ProcessingResult, PipelineError> {
        let gray = Self::load_grayscale(image_path)?;
        debug!(
            "Decoded {:?} ({}x{}), running {}",
            image_path,
            gray.cols(),
            gray.rows(),
            method
        );

        let mut detector = create_detector(method)?;
        let features = detector.detect_and_compute(&gray)?;

        let artifact = self
            .output_store
            .reserve(method)
            .map_err(|e| PipelineError::Render(e.to_string()))?;
        let image_url = Self::publish(&gray, &features, artifact)?;

        let statistics = compute_statistics(&features.keypoints, features.descriptors.as_ref());
        debug!(
            "{} detected {} keypoints, published {}",
            method, statistics.num_keypoints, image_url
        );

        Ok(ProcessingResult::success(method, image_url, statistics))
    }
}
