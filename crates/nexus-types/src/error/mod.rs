//! Typed error definitions for Nexus.
//!
//! Only [`GenerationError`] is meant to reach the web layer. Store and
//! configuration failures stay inside the core: the store is always used
//! fail-open and configuration is validated once at startup.

mod config;
mod generation;
mod store;

pub use config::ConfigError;
pub use generation::GenerationError;
pub use store::StoreError;
