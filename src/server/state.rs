use axum::extract::FromRef;

use crate::features::FeatureExtractor;
use crate::output_store::OutputStore;
use crate::uploads::UploadStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedFeatureExtractor = Arc<dyn FeatureExtractor>;
pub type GuardedUploadStore = Arc<UploadStore>;
pub type GuardedOutputStore = Arc<OutputStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub extractor: GuardedFeatureExtractor,
    pub upload_store: GuardedUploadStore,
    pub output_store: GuardedOutputStore,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        extractor: GuardedFeatureExtractor,
        upload_store: GuardedUploadStore,
        output_store: GuardedOutputStore,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            extractor,
            upload_store,
            output_store,
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedFeatureExtractor {
    fn from_ref(input: &ServerState) -> Self {
        input.extractor.clone()
    }
}

impl FromRef<ServerState> for GuardedUploadStore {
    fn from_ref(input: &ServerState) -> Self {
        input.upload_store.clone()
    }
}

impl FromRef<ServerState> for GuardedOutputStore {
    fn from_ref(input: &ServerState) -> Self {
        input.output_store.clone()
    }
}
