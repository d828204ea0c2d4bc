//! Generation results as seen by the web layer.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// A successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generated {
    pub text: String,
    pub model_used: String,
}

/// Wire shape of `generate`: either `{text, model_used}` or
/// `{error_kind, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationOutcome {
    Ok(Generated),
    Failed {
        error_kind: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_after_secs: Option<u64>,
    },
}

impl From<Result<Generated, GenerationError>> for GenerationOutcome {
    fn from(result: Result<Generated, GenerationError>) -> Self {
        match result {
            Ok(generated) => GenerationOutcome::Ok(generated),
            Err(err) => GenerationOutcome::Failed {
                error_kind: err.error_kind().to_string(),
                message: err.user_message(),
                retry_after_secs: err.retry_after_secs(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_shape() {
        let outcome = GenerationOutcome::from(Ok(Generated {
            text: "hello".to_string(),
            model_used: "m2".to_string(),
        }));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["model_used"], "m2");
    }

    #[test]
    fn test_failure_shape() {
        let outcome = GenerationOutcome::from(Err(GenerationError::Exhausted {
            message: "Service temporarily unavailable.".to_string(),
            retry_after_secs: 300,
        }));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error_kind"], "exhausted");
        assert_eq!(json["retry_after_secs"], 300);

        let back: GenerationOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
