//! Request logging middleware

use axum::extract::State;
use axum::{
    body::Body,
    http::{header::HeaderMap, Request, Response},
    middleware::Next,
    response::IntoResponse,
};
use std::time::Instant;
use tracing::{error, info};

#[derive(PartialEq, PartialOrd, Clone, Debug, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    Path,
    Headers,
    Body,
}

impl Default for RequestsLoggingLevel {
    fn default() -> Self {
        Self::Path
    }
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

enum ContentLengthParseResult {
    Ok(usize),
    No(&'static str),
}

fn parse_content_length(headers: &HeaderMap) -> ContentLengthParseResult {
    let value = match headers.get("content-length") {
        Some(x) => x,
        None => return ContentLengthParseResult::No("Content-length not set."),
    };

    let str_value = match value.to_str() {
        Ok(x) => x,
        Err(_) => {
            return ContentLengthParseResult::No("Could not get Content-length string value.")
        }
    };

    match str_value.parse::<usize>() {
        Ok(x) => ContentLengthParseResult::Ok(x),
        Err(_) => ContentLengthParseResult::No("Could not parse Content-length numeric value."),
    }
}

fn log_headers(label: &str, headers: &HeaderMap) {
    info!("  {}:", label);
    for header in headers.iter() {
        info!("    {:?}: {:?}", header.0, header.1);
    }
}

/// Logs a small body and hands back an equivalent one.
async fn log_body(label: &str, headers: &HeaderMap, body: Body) -> Result<Body, axum::Error> {
    match parse_content_length(headers) {
        ContentLengthParseResult::No(reason) => {
            info!("  {}: {}", label, reason);
            Ok(body)
        }
        ContentLengthParseResult::Ok(size) if size < MAX_LOGGABLE_BODY_LENGTH => {
            let bytes = axum::body::to_bytes(body, size).await?;
            info!("  {}:\n{}", label, String::from_utf8_lossy(&bytes));
            Ok(Body::from(bytes))
        }
        ContentLengthParseResult::Ok(size) => {
            info!(
                "  {}: Too big to log ({:#})",
                label,
                byte_unit::Byte::from(size)
            );
            Ok(body)
        }
    }
}

fn internal_error() -> Response<Body> {
    crate::server::ApiError::Internal.into_response()
}

pub async fn log_requests(
    State(level): State<RequestsLoggingLevel>,
    mut request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let start = Instant::now();

    if level > RequestsLoggingLevel::None {
        info!(">>> {} {}", request.method(), request.uri());
    }

    if level >= RequestsLoggingLevel::Headers {
        log_headers("Req Headers", request.headers());
    }

    if level >= RequestsLoggingLevel::Body {
        let (parts, body) = request.into_parts();
        let body = match log_body("Req Body", &parts.headers, body).await {
            Ok(body) => body,
            Err(err) => {
                error!("Failed to read request body: {:?}", err);
                return internal_error();
            }
        };
        request = Request::from_parts(parts, body);
    }

    let mut response = next.run(request).await;

    if level >= RequestsLoggingLevel::Headers {
        log_headers("Resp Headers", response.headers());
    }

    if level >= RequestsLoggingLevel::Body {
        let (parts, body) = response.into_parts();
        let body = match log_body("Resp Body", &parts.headers, body).await {
            Ok(body) => body,
            Err(err) => {
                error!("Failed to read response body: {:?}", err);
                return internal_error();
            }
        };
        response = Response::from_parts(parts, body);
    }

    if level > RequestsLoggingLevel::None {
        info!(
            "<<< {} ({}ms)",
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
    }

    response
}
