use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDateTime, Timelike};
use serde::Serialize;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::info;

use super::feature_routes::feature_routes;
use super::outputs::serve_output;
use super::{handle_panic, log_requests, state::*, ApiError, ServerConfig};
use crate::config::AppConfig;
use crate::features::{FeatureExtractor, FeaturePipeline};
use crate::output_store::OutputStore;
use crate::tools::{available_tools, tool_catalog, ToolDescriptor};
use crate::uploads::UploadStore;

#[derive(Serialize)]
struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: String,
    pub available_tools: Vec<&'static str>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// ISO-8601 with microseconds, fraction left out when it is zero.
fn iso_timestamp(at: &NaiveDateTime) -> String {
    if at.nanosecond() / 1000 == 0 {
        at.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: iso_timestamp(&Local::now().naive_local()),
        uptime: format_uptime(state.start_time.elapsed()),
        available_tools: available_tools(),
    })
}

async fn get_tools() -> Json<Vec<ToolDescriptor>> {
    Json(tool_catalog())
}

async fn endpoint_not_found() -> ApiError {
    ApiError::EndpointNotFound
}

pub fn make_app(
    config: ServerConfig,
    extractor: Arc<dyn FeatureExtractor>,
    upload_store: Arc<UploadStore>,
    output_store: Arc<OutputStore>,
) -> Router {
    let logging_level = config.requests_logging_level.clone();
    let max_upload_bytes = config.max_upload_bytes;
    let state = ServerState::new(config, extractor, upload_store, output_store);

    let api_routes: Router<ServerState> = Router::new()
        .route("/api/health", get(health))
        .route("/api/tools", get(get_tools))
        .route("/api/outputs/{filename}", get(serve_output))
        .merge(feature_routes(max_upload_bytes));

    api_routes
        .fallback(endpoint_not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(logging_level, log_requests))
}

pub async fn run_server(app_config: AppConfig) -> Result<()> {
    let upload_store = Arc::new(UploadStore::new(
        &app_config.upload_dir,
        app_config.max_upload_bytes,
        app_config.allowed_extensions.clone(),
    ));
    upload_store
        .init()
        .await
        .with_context(|| format!("Creating upload dir {:?}", app_config.upload_dir))?;

    let output_store = Arc::new(OutputStore::new(&app_config.output_dir));
    output_store
        .init()
        .with_context(|| format!("Creating output dir {:?}", app_config.output_dir))?;

    let extractor: Arc<dyn FeatureExtractor> =
        Arc::new(FeaturePipeline::new(output_store.clone()));

    let app = make_app(
        ServerConfig::from(&app_config),
        extractor,
        upload_store,
        output_store,
    );

    let address = app_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Ready to serve at {}!", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;
    Ok(())
}
