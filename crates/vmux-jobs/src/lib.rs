//! In-memory concurrent job registry for vidmux.

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::JobRegistry;
