//! Feature detection pipeline.
//!
//! Keypoint detection, descriptor extraction and drawing are delegated to OpenCV.
//! This module owns the orchestration around it: detector selection, statistics,
//! visualization artifacts and the result shape returned to HTTP clients.

mod detector;
mod pipeline;
mod statistics;
mod types;
mod visualization;

pub use detector::{create_detector, DetectionMethod, Detector, DetectorError};
pub use pipeline::{
    FeatureExtractor, FeaturePipeline, PipelineError, ProcessingFailure, ProcessingResult,
    ProcessingSuccess,
};
pub use statistics::{compute_statistics, KeypointSummary, Statistics, ValueRange};
pub use types::{DescriptorMatrix, DescriptorType, FeatureSet, Keypoint};
pub use visualization::{render_visualization, title_for};
