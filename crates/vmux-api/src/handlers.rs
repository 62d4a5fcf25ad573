//! HTTP request handlers.

pub mod combine;
pub mod download;
pub mod health;
