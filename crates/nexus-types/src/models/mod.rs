//! Core domain models for Nexus.

mod admission;
mod config;
mod conversation;
mod generation;
pub mod model_spec;

pub use admission::{ActionKind, AdmissionDecision, RateScope};
pub use config::{AdmissionConfig, CascadeConfig, NexusConfig, OrchestratorConfig, StoreConfig};
pub use conversation::{ChatMessage, ChatRole};
pub use generation::{Generated, GenerationOutcome};
pub use model_spec::ModelSpec;
