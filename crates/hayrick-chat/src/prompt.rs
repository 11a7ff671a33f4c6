//! The fixed two-message prompt template for grounded answering.

use serde::Serialize;

/// The sentence the model must emit (and the query node returns on
/// empty retrieval) when the context cannot answer the question.
pub const UNKNOWN_ANSWER: &str = "I don't know based on the provided document(s).";

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer using ONLY the provided context. \
     If the context is insufficient, say you don't know.";

/// One chat message on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Build the system + user message pair for a question and its context.
pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    let user = format!(
        "CONTEXT:\n{context}\n\nQUESTION:\n{question}\n\nINSTRUCTIONS:\n\
         - Use the context only\n\
         - Be concise\n\
         - If not found in context, say: \"{UNKNOWN_ANSWER}\"\n"
    );

    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: user,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_shape() {
        let messages = build_messages("what is a vpc?", "[Chunk 1]\nA VPC is...");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_user_message_layout() {
        let messages = build_messages("who wrote it?", "[Chunk 1]\nsome text");
        let user = &messages[1].content;

        assert!(user.starts_with("CONTEXT:\n[Chunk 1]\nsome text"));
        assert!(user.contains("\n\nQUESTION:\nwho wrote it?"));
        assert!(user.contains(UNKNOWN_ANSWER));
    }

    #[test]
    fn test_system_message_demands_grounding() {
        let messages = build_messages("q", "c");
        assert!(messages[0].content.contains("ONLY the provided context"));
    }
}
