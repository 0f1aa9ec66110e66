//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own upload and output directories.

use super::constants::*;
use cv_tools_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use cv_tools_server::uploads::DEFAULT_ALLOWED_EXTENSIONS;
use cv_tools_server::{FeatureExtractor, FeaturePipeline, OutputStore, UploadStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance backed by the real OpenCV pipeline
///
/// When dropped, the server gracefully shuts down and temp directories are removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    #[allow(dead_code)]
    pub port: u16,

    upload_dir: PathBuf,
    output_dir: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the directories can't be created, the port can't be bound
    /// or the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let output_dir = temp_dir.path().join("outputs");

        let upload_store = Arc::new(UploadStore::new(
            &upload_dir,
            cv_tools_server::config::DEFAULT_MAX_UPLOAD_BYTES,
            DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ));
        upload_store
            .init()
            .await
            .expect("Failed to create upload dir");

        let output_store = Arc::new(OutputStore::new(&output_dir));
        output_store.init().expect("Failed to create output dir");

        let extractor: Arc<dyn FeatureExtractor> =
            Arc::new(FeaturePipeline::new(output_store.clone()));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app = make_app(config, extractor, upload_store, output_store);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upload_dir,
            output_dir,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    #[allow(dead_code)]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    #[allow(dead_code)]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of files currently sitting in the upload scratch directory
    #[allow(dead_code)]
    pub fn pending_uploads(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .expect("Failed to read upload dir")
            .count()
    }

    /// Waits for the server to become ready by polling /api/health
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/api/health", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
