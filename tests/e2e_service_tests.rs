//! End-to-end tests for the service endpoints: health, tool catalog and fallback

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.health().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["available_tools"], json!(["feature-extractor"]));

    let timestamp = body["timestamp"].as_str().unwrap();
    let parses = |format: &str| chrono::NaiveDateTime::parse_from_str(timestamp, format).is_ok();
    assert!(
        parses("%Y-%m-%dT%H:%M:%S%.6f") || parses("%Y-%m-%dT%H:%M:%S"),
        "{}",
        timestamp
    );
}

#[tokio::test]
async fn test_tool_catalog() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.tools().await;
    assert_eq!(response.status(), StatusCode::OK);

    let tools: Vec<Value> = response.json().await.unwrap();
    let ids: Vec<&str> = tools.iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        vec![
            "feature-extractor",
            "3d-reconstruction-benchmark",
            "underwater-tracking"
        ]
    );

    assert_eq!(tools[0]["status"], "active");
    assert_eq!(tools[0]["methods"], json!(ALL_METHODS));
    assert_eq!(tools[1]["status"], "coming-soon");
    assert!(tools[2].get("methods").is_none());
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_path("/api/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Endpoint not found"}));
}
