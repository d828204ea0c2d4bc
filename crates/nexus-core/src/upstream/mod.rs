//! Upstream model APIs.

pub mod gemini;

pub use gemini::{GeminiBackend, DEFAULT_GEMINI_BASE_URL};
