//! Model catalog: identifiers, display names and the default priority order.

use serde::{Deserialize, Serialize};

/// Known models in default priority order, most capable first, with display names.
const MODEL_CATALOG: &[(&str, &str)] = &[
    ("gemini-3-flash-preview", "Gemini 3 Flash"),
    ("gemini-flash-latest", "Gemini Flash Latest"),
    ("gemini-2.5-flash", "Gemini 2.5 Flash"),
    ("gemini-2.0-flash", "Gemini 2.0 Flash"),
    ("gemini-flash-lite-latest", "Gemini Flash Lite Latest"),
    ("gemini-2.5-flash-lite", "Gemini 2.5 Flash Lite"),
    ("gemini-2.0-flash-lite", "Gemini 2.0 Flash Lite"),
    ("gemma-3-27b", "Gemma 3 27B"),
    ("gemma-3-12b", "Gemma 3 12B"),
    ("gemma-3-4b", "Gemma 3 4B"),
    ("gemma-3-2b", "Gemma 3 2B"),
    ("gemma-3-1b", "Gemma 3 1B"),
];

/// One entry of the cascade. Priority is the position in the cascade list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub display_name: String,
}

impl ModelSpec {
    /// Build a spec, resolving the display name from the catalog.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let display_name = display_name_for(&id).to_string();
        Self { id, display_name }
    }
}

/// User-facing name for a model id; unknown ids map to themselves.
pub fn display_name_for(model_id: &str) -> &str {
    MODEL_CATALOG
        .iter()
        .find(|(id, _)| *id == model_id)
        .map(|(_, name)| *name)
        .unwrap_or(model_id)
}

/// Default cascade order.
pub fn default_model_ids() -> Vec<String> {
    MODEL_CATALOG.iter().map(|(id, _)| (*id).to_string()).collect()
}
