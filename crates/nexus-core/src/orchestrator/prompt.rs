//! Prompt assembly: persona instruction, bounded history, user message.

use nexus_types::ChatMessage;
use thiserror::Error;

const HISTORY_HEADER: &str = "[CONVERSATION HISTORY]";
const SESSION_TITLE_CHARS: usize = 30;

/// Which system instruction to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Documents exist and retrieval found relevant context
    Grounded,
    /// Documents exist but retrieval came back empty
    NoContextFound,
    /// No documents in scope
    General,
}

impl Persona {
    pub fn select(has_documents: bool, context: &str) -> Self {
        match (has_documents, context.trim().is_empty()) {
            (false, _) => Persona::General,
            (true, false) => Persona::Grounded,
            (true, true) => Persona::NoContextFound,
        }
    }
}

pub fn system_instruction(persona: Persona, document_titles: &[String], context: &str) -> String {
    let titles = document_titles.join(", ");
    match persona {
        Persona::Grounded => {
            let uploaded = if titles.is_empty() {
                String::new()
            } else {
                format!("\n\nUPLOADED DOCUMENTS: {}", titles)
            };
            format!(
                "You are Nexus, an intelligent document analysis assistant.{uploaded}

INSTRUCTIONS:
- Answer questions using the DOCUMENT CONTEXT below as your primary source.
- Use CONVERSATION HISTORY to understand follow-up questions and maintain continuity.
- If the answer is in the document, cite it. If not found, clearly state that.
- For questions unrelated to the document (greetings, general knowledge), respond helpfully but note it's not from the document.
- Be concise, accurate, and helpful.

[DOCUMENT CONTEXT]
{context}"
            )
        },
        Persona::NoContextFound => format!(
            "You are Nexus. The user uploaded documents ({titles}) but no relevant content was found for this query.

INSTRUCTIONS:
- If asking about the document: suggest rephrasing or asking about specific topics.
- If general conversation: respond helpfully using conversation history.
- Never fabricate document content."
        ),
        Persona::General => "You are Nexus, a knowledgeable and friendly AI assistant.

INSTRUCTIONS:
- Engage naturally in conversation and answer questions accurately.
- Use conversation history to understand context and follow-ups.
- Be helpful, concise, and informative."
            .to_string(),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Transcript of the last `max_turns` messages, oldest first, each cut to
/// `max_chars`. Empty history yields an empty string.
pub fn format_history(history: &[ChatMessage], max_turns: usize, max_chars: usize) -> String {
    let start = history.len().saturating_sub(max_turns);
    let recent = &history[start..];
    if recent.is_empty() {
        return String::new();
    }

    let mut transcript = format!("\n\n{}\n", HISTORY_HEADER);
    for message in recent {
        transcript.push_str(message.role.transcript_label());
        transcript.push_str(": ");
        transcript.push_str(&truncate_chars(&message.content, max_chars));
        transcript.push('\n');
    }
    transcript
}

pub fn compose_prompt(system_instruction: &str, history: &str, user_message: &str) -> String {
    format!("{}\n{}\n[USER MESSAGE]\n{}", system_instruction, history, user_message)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageRejected {
    #[error("Message cannot be empty")]
    Empty,
    #[error("Message too long. Maximum {max} characters.")]
    TooLong { max: usize },
}

/// Trim and bound-check a user message.
pub fn validate_user_message(message: &str, max_chars: usize) -> Result<&str, MessageRejected> {
    let message = message.trim();
    if message.is_empty() {
        return Err(MessageRejected::Empty);
    }
    if message.chars().count() > max_chars {
        return Err(MessageRejected::TooLong { max: max_chars });
    }
    Ok(message)
}

/// Title for a new session, taken from its first message.
pub fn session_title(first_message: &str) -> String {
    truncate_chars(first_message.trim(), SESSION_TITLE_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_selection() {
        assert_eq!(Persona::select(false, "ctx"), Persona::General);
        assert_eq!(Persona::select(true, "ctx"), Persona::Grounded);
        assert_eq!(Persona::select(true, "  \n"), Persona::NoContextFound);
    }

    #[test]
    fn test_grounded_instruction_embeds_context() {
        let titles = vec!["report.pdf".to_string(), "notes.txt".to_string()];
        let text = system_instruction(Persona::Grounded, &titles, "Revenue grew 12%.");
        assert!(text.contains("UPLOADED DOCUMENTS: report.pdf, notes.txt"));
        assert!(text.ends_with("[DOCUMENT CONTEXT]\nRevenue grew 12%."));

        let untitled = system_instruction(Persona::Grounded, &[], "ctx");
        assert!(!untitled.contains("UPLOADED DOCUMENTS"));
    }

    #[test]
    fn test_no_context_instruction_names_documents() {
        let titles = vec!["report.pdf".to_string()];
        let text = system_instruction(Persona::NoContextFound, &titles, "");
        assert!(text.contains("uploaded documents (report.pdf)"));
        assert!(text.contains("Never fabricate document content."));
    }

    #[test]
    fn test_history_is_bounded() {
        let history: Vec<ChatMessage> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("q{}", i))
                } else {
                    ChatMessage::assistant(format!("a{}", i))
                }
            })
            .collect();

        let transcript = format_history(&history, 10, 500);
        assert!(transcript.starts_with("\n\n[CONVERSATION HISTORY]\n"));
        assert!(!transcript.contains("q0"));
        assert!(!transcript.contains("Nexus: a1\n"));
        assert!(transcript.contains("User: q2\n"));
        assert!(transcript.ends_with("Nexus: a11\n"));
        assert_eq!(transcript.lines().filter(|l| l.contains(": ")).count(), 10);
    }

    #[test]
    fn test_long_turns_are_truncated() {
        let history = vec![ChatMessage::assistant("x".repeat(600))];
        let transcript = format_history(&history, 10, 500);
        assert!(transcript.contains(&format!("Nexus: {}...\n", "x".repeat(500))));

        let exact = vec![ChatMessage::user("y".repeat(500))];
        assert!(!format_history(&exact, 10, 500).contains("..."));
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(format_history(&[], 10, 500), "");
    }

    #[test]
    fn test_compose_prompt_layout() {
        let prompt = compose_prompt("SYS", "\n\n[CONVERSATION HISTORY]\nUser: hi\n", "next?");
        assert_eq!(prompt, "SYS\n\n\n[CONVERSATION HISTORY]\nUser: hi\n\n[USER MESSAGE]\nnext?");
        assert_eq!(compose_prompt("SYS", "", "hello"), "SYS\n\n[USER MESSAGE]\nhello");
    }

    #[test]
    fn test_validate_user_message() {
        assert_eq!(validate_user_message("  hi  ", 5000), Ok("hi"));
        assert_eq!(validate_user_message("   ", 5000), Err(MessageRejected::Empty));
        let long = "a".repeat(5001);
        let err = validate_user_message(&long, 5000).unwrap_err();
        assert_eq!(err.to_string(), "Message too long. Maximum 5000 characters.");
    }

    #[test]
    fn test_session_title() {
        assert_eq!(session_title("Short question"), "Short question");
        assert_eq!(
            session_title("What does the quarterly report say about revenue?"),
            "What does the quarterly report..."
        );
    }
}
