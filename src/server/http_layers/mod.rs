mod panic_handler;
mod requests_logging;

pub use panic_handler::handle_panic;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
