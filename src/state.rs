//! Conversation state shared by the controller and the view
//!
//! The conversation is append-only: turns are never edited, removed or
//! reordered once pushed, so a turn's position is its identity.

use serde::{Deserialize, Serialize};

/// Greeting every session opens with
pub const GREETING: &str =
    "🎉 Salut! Je suis ProutGPT! Prêt pour des blagues de pets trop cool? Haha! 💨";

/// Shown in place of a reply whenever a dispatch fails, whatever the cause
pub const APOLOGY: &str = "😅 Oups! J'ai eu un problème (comme un prout qui rate!). Réessaie!";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<ChatMessage>,
}

impl Conversation {
    /// Starts a conversation holding only the greeting
    pub fn new() -> Self {
        Self {
            turns: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn append(&mut self, turn: ChatMessage) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.turns.last()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0], ChatMessage::assistant(GREETING));
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut conversation = Conversation::new();
        conversation.append(ChatMessage::user("un"));
        conversation.append(ChatMessage::assistant("deux"));

        let contents: Vec<&str> = conversation.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec![GREETING, "un", "deux"]);
        assert_eq!(conversation.last().map(|t| t.role), Some(ChatRole::Assistant));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("salut")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"salut"}"#);
    }
}
