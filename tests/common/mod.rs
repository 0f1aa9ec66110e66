//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{blank_png, TestClient, TestServer};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_extract() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.extract_features("photo.png", blank_png(), Some("ORB")).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{blank_png, textured_png};
pub use server::TestServer;
