//! Builds the generation prompt and hands it to the cascade.
//!
//! The orchestrator never decides how failures are rendered: it returns
//! typed results and the web layer maps them to status codes and templates.

pub mod prompt;
mod retrieval;

pub use prompt::{MessageRejected, Persona};
pub use retrieval::{NoRetriever, Retriever, StaticRetriever};

use nexus_types::{ChatMessage, Generated, GenerationError, GenerationOutcome, OrchestratorConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cascade::ModelCascade;

/// Documents attached to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentScope {
    /// Retrieval scope (the chat session id)
    pub scope_id: String,
    /// Titles of the uploaded documents, cited in the system instruction
    #[serde(default)]
    pub titles: Vec<String>,
}

/// One user turn, as received from the web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentScope>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), history: Vec::new(), documents: None }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_documents(mut self, scope_id: impl Into<String>, titles: Vec<String>) -> Self {
        self.documents = Some(DocumentScope { scope_id: scope_id.into(), titles });
        self
    }
}

pub struct ResponseOrchestrator {
    cascade: Arc<ModelCascade>,
    retriever: Arc<dyn Retriever>,
    config: OrchestratorConfig,
}

impl ResponseOrchestrator {
    pub fn new(
        cascade: Arc<ModelCascade>,
        retriever: Arc<dyn Retriever>,
        config: OrchestratorConfig,
    ) -> Self {
        Self { cascade, retriever, config }
    }

    pub fn cascade(&self) -> &ModelCascade {
        &self.cascade
    }

    /// Trim and bound-check a message before any generation work.
    pub fn validate<'a>(&self, message: &'a str) -> Result<&'a str, MessageRejected> {
        prompt::validate_user_message(message, self.config.max_message_chars)
    }

    fn compose(
        &self,
        user_message: &str,
        history: &[ChatMessage],
        persona: Persona,
        titles: &[String],
        context: &str,
    ) -> String {
        let instruction = prompt::system_instruction(persona, titles, context);
        let transcript = prompt::format_history(
            history,
            self.config.history_turns,
            self.config.history_max_chars,
        );
        prompt::compose_prompt(&instruction, &transcript, user_message)
    }

    /// Generate a reply from a prompt, prior turns and optional grounding
    /// context, in the shape the web layer renders.
    pub async fn generate(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        grounding_context: Option<&str>,
    ) -> GenerationOutcome {
        let context = grounding_context.unwrap_or_default();
        let persona = if context.trim().is_empty() { Persona::General } else { Persona::Grounded };
        let full_prompt = self.compose(prompt, history, persona, &[], context);
        self.cascade.generate(&full_prompt, "").await.into()
    }

    /// Full chat turn: retrieve document context when documents are attached,
    /// pick the persona, compose the prompt and run the cascade.
    pub async fn build_and_generate(
        &self,
        request: &ChatRequest,
    ) -> Result<Generated, GenerationError> {
        let (persona, titles, context) = match &request.documents {
            Some(scope) => {
                let context = self.retriever.retrieve(&request.message, &scope.scope_id).await;
                let persona = Persona::select(true, &context);
                if persona == Persona::NoContextFound {
                    tracing::warn!(
                        scope = %scope.scope_id,
                        "No document context retrieved for query"
                    );
                }
                (persona, scope.titles.as_slice(), context)
            },
            None => (Persona::General, &[][..], String::new()),
        };

        let full_prompt =
            self.compose(&request.message, &request.history, persona, titles, &context);
        let generated = self.cascade.generate(&full_prompt, "").await?;
        tracing::info!(model = %generated.model_used, persona = ?persona, "Chat message processed");
        Ok(generated)
    }
}
