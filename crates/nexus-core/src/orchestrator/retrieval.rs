//! Document retrieval seam.

use async_trait::async_trait;

/// Looks up document context relevant to a query within one scope
/// (a chat session's uploaded documents).
///
/// Retrieval is best-effort: implementations return an empty string on any
/// failure instead of erroring.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, scope_id: &str) -> String;
}

/// No document store; always returns no context.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetriever;

#[async_trait]
impl Retriever for NoRetriever {
    async fn retrieve(&self, _query: &str, _scope_id: &str) -> String {
        String::new()
    }
}

/// Returns the same context for every query.
#[derive(Debug, Clone)]
pub struct StaticRetriever {
    context: String,
}

impl StaticRetriever {
    pub fn new(context: impl Into<String>) -> Self {
        Self { context: context.into() }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str, _scope_id: &str) -> String {
        self.context.clone()
    }
}
