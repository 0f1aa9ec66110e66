//! Turns handler panics into the JSON 500 body instead of a dropped connection.

use std::any::Any;

use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::server::ApiError;

pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Request handler panicked: {}", details);
    ApiError::Internal.into_response()
}
