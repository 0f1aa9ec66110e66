//! CV Tools Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod features;
pub mod output_store;
pub mod server;
pub mod tools;
pub mod uploads;

// Re-export commonly used types for convenience
pub use features::{DetectionMethod, FeatureExtractor, FeaturePipeline, ProcessingResult};
pub use output_store::OutputStore;
pub use server::{run_server, RequestsLoggingLevel};
pub use uploads::UploadStore;
