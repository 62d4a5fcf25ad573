//! HTTP API for the vidmux combine service.
//!
//! Exposes the synchronous and job-based combine endpoints, the download
//! route for polling job results, health probes, and Prometheus metrics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
