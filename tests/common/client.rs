//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides one method per server endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn upload_form(filename: &str, data: Vec<u8>, method: Option<&str>) -> Form {
        let part = Part::bytes(data).file_name(filename.to_string());
        let form = Form::new().part("image", part);
        match method {
            Some(method) => form.text("method", method.to_string()),
            None => form,
        }
    }

    // ========================================================================
    // Service Endpoints
    // ========================================================================

    /// GET /api/health
    pub async fn health(&self) -> Response {
        self.client
            .get(self.url("/api/health"))
            .send()
            .await
            .expect("Health request failed")
    }

    /// GET /api/tools
    pub async fn tools(&self) -> Response {
        self.client
            .get(self.url("/api/tools"))
            .send()
            .await
            .expect("Tools request failed")
    }

    // ========================================================================
    // Feature Extractor Endpoints
    // ========================================================================

    /// POST /api/tools/feature-extractor
    pub async fn extract_features(
        &self,
        filename: &str,
        data: Vec<u8>,
        method: Option<&str>,
    ) -> Response {
        self.client
            .post(self.url("/api/tools/feature-extractor"))
            .multipart(Self::upload_form(filename, data, method))
            .send()
            .await
            .expect("Feature extraction request failed")
    }

    /// POST /api/tools/feature-extractor with only a method field
    pub async fn extract_features_without_image(&self, method: &str) -> Response {
        let form = Form::new().text("method", method.to_string());
        self.client
            .post(self.url("/api/tools/feature-extractor"))
            .multipart(form)
            .send()
            .await
            .expect("Feature extraction request failed")
    }

    /// POST /api/tools/feature-extractor/compare
    pub async fn compare_methods(&self, filename: &str, data: Vec<u8>) -> Response {
        self.client
            .post(self.url("/api/tools/feature-extractor/compare"))
            .multipart(Self::upload_form(filename, data, None))
            .send()
            .await
            .expect("Compare request failed")
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// GET a server-relative URL, as returned in `image_url`
    pub async fn get_path(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// GET /api/outputs/{filename}
    pub async fn get_output(&self, filename: &str) -> Response {
        self.get_path(&format!("/api/outputs/{}", filename)).await
    }
}
