//! Shared constants for end-to-end tests

// ============================================================================
// Server lifecycle
// ============================================================================

/// How long to wait for a spawned server to answer its health check
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between health check polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Per-request timeout. Generous since detection runs on real images.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Fixture images
// ============================================================================

/// Side of the generated square test images, in pixels
pub const TEST_IMAGE_SIDE: i32 = 100;

/// Gray level of the blank test image
pub const BLANK_GRAY_LEVEL: f64 = 128.0;

/// Checkerboard cell size of the textured test image, in pixels
pub const CHECKER_CELL: i32 = 10;

// ============================================================================
// Expected responses
// ============================================================================

#[allow(dead_code)]
pub const ALLOWED_EXTENSIONS_MESSAGE: &str =
    "Invalid file type. Allowed: png, jpg, jpeg, gif, bmp, webp";

#[allow(dead_code)]
pub const INVALID_METHOD_MESSAGE: &str = "Invalid method. Choose from: SIFT, ORB, AKAZE, BRISK";

#[allow(dead_code)]
pub const ALL_METHODS: [&str; 4] = ["SIFT", "ORB", "AKAZE", "BRISK"];
