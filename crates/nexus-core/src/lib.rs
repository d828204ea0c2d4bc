//! # Nexus Core
//!
//! Admission control, multi-model fallback and response orchestration for
//! the Nexus chat service.
//!
//! ## Architecture
//!
//! ```text
//! nexus-core/src/
//! ├── admission/     # four-gate rate limiting, in-flight permits
//! ├── cascade/       # model fallback state machine, exhaustion latch
//! ├── orchestrator/  # persona selection, history window, prompt assembly
//! ├── upstream/      # Gemini HTTP backend
//! ├── store/         # shared counter store (memory, Redis)
//! ├── best_effort.rs # fail-open wrapper for store calls
//! ├── clock.rs       # time source (system or manual)
//! ├── config.rs      # defaults + JSON file + env overrides
//! ├── logging.rs     # tracing subscriber
//! └── prometheus.rs  # metrics
//! ```
//!
//! All cross-process state (rate counters, the exhaustion flag) lives in the
//! [`store::SharedStore`]; nothing authoritative is held in process memory.

#![allow(
    clippy::module_name_repetitions,
    reason = "Types like ModelCascade and AdmissionGate read better fully named"
)]
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::assertions_on_result_states
    )
)]

pub mod admission;
pub mod best_effort;
pub mod cascade;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod prometheus;
pub mod store;
pub mod upstream;

// Re-export commonly used types
pub use admission::{Admission, AdmissionGate, InFlightPermit, RateLimiter};
pub use cascade::{ExhaustionLatch, ModelBackend, ModelCascade, ServiceAvailability};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, AppResult};
pub use orchestrator::{ChatRequest, ResponseOrchestrator, Retriever};
pub use store::{KeySpace, MemoryStore, RedisStore, SharedStore};
