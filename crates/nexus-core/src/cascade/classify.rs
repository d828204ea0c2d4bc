//! Three-way classification of model errors.
//!
//! The upstream API does not report structured error codes consistently
//! across models, so the default classifier matches keywords in the error
//! text in three passes: an explicit missing-model marker skips at once,
//! then transient markers retry, then softer "not available" wording skips.
//! Anything else is fatal.

use serde::{Deserialize, Serialize};

use super::backend::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Auth or configuration problem. Stops the cascade.
    Fatal,
    /// Model missing upstream. Skip to the next model without retry.
    NotFound,
    /// Rate limit, overload or timeout. Retry with backoff, then skip.
    Transient,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Fatal => "fatal",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Transient => "transient",
        }
    }
}

pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &BackendError) -> ErrorClass;
}

/// Checked before the transient list.
pub const NOT_FOUND_KEYWORDS: &[&str] = &["404", "not found"];

/// Checked after the transient list, so "overloaded, not available" retries.
pub const UNSUPPORTED_KEYWORDS: &[&str] = &["not_found", "not supported", "not available"];

pub const TRANSIENT_KEYWORDS: &[&str] = &[
    "429",
    "503",
    "rate limit",
    "quota",
    "overloaded",
    "temporarily unavailable",
    "too many requests",
    "timed out",
    "timeout",
];

fn lowercase_all(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Case-insensitive keyword matcher.
///
/// Precedence: `not_found` over `transient` over `unsupported`.
#[derive(Debug, Clone)]
pub struct SubstringClassifier {
    not_found: Vec<String>,
    transient: Vec<String>,
    unsupported: Vec<String>,
}

impl SubstringClassifier {
    pub fn new(not_found: &[&str], transient: &[&str], unsupported: &[&str]) -> Self {
        Self {
            not_found: lowercase_all(not_found),
            transient: lowercase_all(transient),
            unsupported: lowercase_all(unsupported),
        }
    }

    pub fn classify_message(&self, message: &str) -> ErrorClass {
        let message = message.to_lowercase();
        let matches = |words: &[String]| words.iter().any(|k| message.contains(k.as_str()));
        if matches(&self.not_found) {
            ErrorClass::NotFound
        } else if matches(&self.transient) {
            ErrorClass::Transient
        } else if matches(&self.unsupported) {
            ErrorClass::NotFound
        } else {
            ErrorClass::Fatal
        }
    }
}

impl Default for SubstringClassifier {
    fn default() -> Self {
        Self::new(NOT_FOUND_KEYWORDS, TRANSIENT_KEYWORDS, UNSUPPORTED_KEYWORDS)
    }
}

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, error: &BackendError) -> ErrorClass {
        self.classify_message(&error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(message: &str) -> ErrorClass {
        SubstringClassifier::default().classify_message(message)
    }

    #[test]
    fn test_transient_errors() {
        assert_eq!(classify("429 rate limit"), ErrorClass::Transient);
        assert_eq!(classify("503 Service Unavailable"), ErrorClass::Transient);
        assert_eq!(classify("Resource has been exhausted (check QUOTA)"), ErrorClass::Transient);
        assert_eq!(classify("The model is overloaded"), ErrorClass::Transient);
        assert_eq!(classify("Too Many Requests"), ErrorClass::Transient);
        assert_eq!(classify("request timed out"), ErrorClass::Transient);
    }

    #[test]
    fn test_not_found_errors() {
        assert_eq!(classify("404 models/gemma-3-2b is not found"), ErrorClass::NotFound);
        assert_eq!(classify("NOT_FOUND"), ErrorClass::NotFound);
        assert_eq!(
            classify("generateContent is not supported for this model"),
            ErrorClass::NotFound
        );
    }

    #[test]
    fn test_not_found_wins_over_transient() {
        assert_eq!(classify("404 model not available, quota irrelevant"), ErrorClass::NotFound);
        assert_eq!(classify("Model not found (rate limit headers attached)"), ErrorClass::NotFound);
    }

    #[test]
    fn test_transient_wins_over_unsupported() {
        assert_eq!(
            classify("The model is overloaded and not available right now"),
            ErrorClass::Transient
        );
        assert_eq!(classify("429 NOT_FOUND quota bucket"), ErrorClass::Transient);
        assert_eq!(classify("Model is not available in this region"), ErrorClass::NotFound);
    }

    #[test]
    fn test_everything_else_is_fatal() {
        assert_eq!(classify("401 API key not valid"), ErrorClass::Fatal);
        assert_eq!(classify("400 invalid argument"), ErrorClass::Fatal);
        assert_eq!(classify(""), ErrorClass::Fatal);
    }
}
