//! # Nexus Types
//!
//! Core types, configuration models, and error definitions for Nexus.
//!
//! - **`error`** - Typed error hierarchy for generation, configuration and the shared store
//! - **`models`** - Domain models (admission decisions, conversation turns, model catalog, config)
//!
//! ## Architecture Role
//!
//! `nexus-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!        nexus-types (this crate)
//!                │
//!                ▼
//!           nexus-core
//!                │
//!                ▼
//!            nexus-cli
//! ```
//!
//! Everything that crosses the boundary to the web layer is serializable via serde,
//! so the caller can render or persist it without depending on `nexus-core`.

pub mod error;
pub mod models;

pub use error::{ConfigError, GenerationError, StoreError};

pub use models::{
    ActionKind, AdmissionConfig, AdmissionDecision, CascadeConfig, ChatMessage, ChatRole,
    Generated, GenerationOutcome, ModelSpec, NexusConfig, OrchestratorConfig, RateScope,
    StoreConfig,
};
