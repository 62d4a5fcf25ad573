//! Shared data models for the vidmux backend.
//!
//! This crate provides Serde-serializable types for:
//! - The duration-fitting planner (segments and plans)
//! - Jobs and their state lifecycle
//! - Request/response bodies for the combine endpoints
//! - Encoding configuration

pub mod encoding;
pub mod job;
pub mod plan;
pub mod request;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{Job, JobId, JobState};
pub use plan::{Plan, PlanError, Segment, DURATION_EPSILON};
pub use request::{CombineRequest, JobAccepted, JobStatusBody, DEFAULT_MAX_DURATION};
