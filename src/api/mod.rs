//! HTTP API module for report submission, status queries and health checks.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ErrorResponse;
pub use handlers::AppState;
pub use routes::create_router;
