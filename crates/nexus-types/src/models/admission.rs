//! Admission control types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counter scope. Each scope has its own key space in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateScope {
    /// Requests in flight across all workers
    GlobalParallel,
    /// Mutating requests per user per minute
    UserMinute,
    /// Mutating requests per user per hour
    UserHour,
    /// AI generation calls per user per minute
    UserApiCall,
}

impl RateScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateScope::GlobalParallel => "global_parallel",
            RateScope::UserMinute => "user_minute",
            RateScope::UserHour => "user_hour",
            RateScope::UserApiCall => "user_api_call",
        }
    }

    /// Retry hint returned when this scope denies a request.
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            RateScope::GlobalParallel => 5,
            RateScope::UserMinute => 10,
            RateScope::UserHour => 300,
            RateScope::UserApiCall => 30,
        }
    }

    /// Message shown to the user when this scope denies a request.
    pub fn denial_message(&self) -> &'static str {
        match self {
            RateScope::GlobalParallel => {
                "System is currently at capacity. Please try again in a moment."
            },
            RateScope::UserMinute => {
                "Too many requests. Please wait a moment before sending another message."
            },
            RateScope::UserHour => "Hourly limit reached. Please try again later.",
            RateScope::UserApiCall => {
                "AI API rate limit reached. Please wait before sending another message."
            },
        }
    }
}

impl fmt::Display for RateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user is trying to do. Only mutating kinds pass through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Send a chat message that triggers AI generation
    Generate,
    /// Upload a document
    Upload,
    /// Create, rename or delete a session
    SessionMutation,
    /// Page loads and history reads
    ReadOnly,
    /// Static and media files
    StaticAsset,
    /// Login, logout, admin
    AuthFlow,
}

const EXEMPT_PATH_PREFIXES: &[&str] =
    &["/static/", "/media/", "/accounts/login/", "/accounts/logout/", "/favicon.ico"];

impl ActionKind {
    /// Exempt actions bypass every gate.
    pub fn is_exempt(&self) -> bool {
        matches!(self, ActionKind::ReadOnly | ActionKind::StaticAsset | ActionKind::AuthFlow)
    }

    /// Generation actions are additionally subject to the API-call gate.
    pub fn is_generation(&self) -> bool {
        matches!(self, ActionKind::Generate)
    }

    /// Classify an HTTP request the way the web layer routes it.
    ///
    /// `admin_prefix` is the admin mount point (e.g. `/admin/`). `has_message`
    /// tells whether a POST carries a chat message body.
    pub fn classify(method: &str, path: &str, admin_prefix: &str, has_message: bool) -> Self {
        if path.starts_with("/static/") || path.starts_with("/media/") || path == "/favicon.ico" {
            return ActionKind::StaticAsset;
        }
        if EXEMPT_PATH_PREFIXES.iter().any(|p| path.starts_with(p))
            || (!admin_prefix.is_empty() && path.starts_with(admin_prefix))
        {
            return ActionKind::AuthFlow;
        }
        if !method.eq_ignore_ascii_case("POST") {
            return ActionKind::ReadOnly;
        }
        if path.contains("/chat/") && has_message {
            return ActionKind::Generate;
        }
        if path.contains("upload") {
            return ActionKind::Upload;
        }
        ActionKind::SessionMutation
    }
}

/// Result of `AdmissionGate::admit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub allowed: bool,
    /// Zero when allowed
    pub retry_after_seconds: u64,
    /// Human-readable denial reason; empty when allowed
    pub reason: String,
    /// Scope that denied the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied_by: Option<RateScope>,
}

impl AdmissionDecision {
    pub fn allow() -> Self {
        Self { allowed: true, retry_after_seconds: 0, reason: String::new(), denied_by: None }
    }

    pub fn deny(scope: RateScope) -> Self {
        Self {
            allowed: false,
            retry_after_seconds: scope.retry_after_secs(),
            reason: scope.denial_message().to_string(),
            denied_by: Some(scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_hints() {
        assert_eq!(AdmissionDecision::deny(RateScope::GlobalParallel).retry_after_seconds, 5);
        assert_eq!(AdmissionDecision::deny(RateScope::UserMinute).retry_after_seconds, 10);
        assert_eq!(AdmissionDecision::deny(RateScope::UserHour).retry_after_seconds, 300);
        assert_eq!(AdmissionDecision::deny(RateScope::UserApiCall).retry_after_seconds, 30);
    }

    #[test]
    fn test_classify_exemptions() {
        assert_eq!(ActionKind::classify("GET", "/chat/3/", "/admin/", false), ActionKind::ReadOnly);
        assert_eq!(
            ActionKind::classify("POST", "/static/app.css", "/admin/", false),
            ActionKind::StaticAsset
        );
        assert_eq!(
            ActionKind::classify("POST", "/accounts/login/", "/admin/", false),
            ActionKind::AuthFlow
        );
        assert_eq!(
            ActionKind::classify("POST", "/admin/users/", "/admin/", false),
            ActionKind::AuthFlow
        );
        assert!(ActionKind::classify("POST", "/favicon.ico", "/admin/", false).is_exempt());
    }

    #[test]
    fn test_classify_mutations() {
        let kind = ActionKind::classify("POST", "/chat/3/", "/admin/", true);
        assert_eq!(kind, ActionKind::Generate);
        assert!(kind.is_generation());
        assert_eq!(
            ActionKind::classify("post", "/chat/3/rename/", "/admin/", false),
            ActionKind::SessionMutation
        );
        assert!(!ActionKind::SessionMutation.is_exempt());
    }
}
