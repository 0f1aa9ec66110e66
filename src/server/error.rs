//! Error responses shared by every route.
//!
//! All bodies have the shape `{"error": string, "message"?: string}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image file provided")]
    MissingFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Invalid file type. Allowed: {}", .0.join(", "))]
    InvalidFileType(Vec<String>),

    #[error("Invalid method. Choose from: SIFT, ORB, AKAZE, BRISK")]
    InvalidMethod,

    #[error("Malformed upload")]
    MalformedUpload(String),

    #[error("File too large. Maximum size is {}", format_limit(.0))]
    PayloadTooLarge(u64),

    #[error("Processing failed")]
    Processing(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Output not found: {0}")]
    OutputNotFound(String),

    #[error("Endpoint not found")]
    EndpointNotFound,

    #[error("Internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn format_limit(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{:#}", byte_unit::Byte::from(bytes))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::EmptyFilename
            | ApiError::InvalidFileType(_)
            | ApiError::InvalidMethod
            | ApiError::MalformedUpload(_)
            | ApiError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::OutputNotFound(_) | ApiError::EndpointNotFound => StatusCode::NOT_FOUND,
            ApiError::Processing(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let message = match self {
            ApiError::MalformedUpload(details) | ApiError::Processing(details) => {
                Some(details.clone())
            }
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
