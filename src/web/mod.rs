//! Web server module
//!
//! Provides the HTTP API for image search and serving stored derivatives.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, Problem};
pub use handlers::{ImageResponse, SearchResponse};
pub use routes::create_router;
pub use state::AppState;
