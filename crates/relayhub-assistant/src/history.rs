//! Bounded conversation history kept per controller session.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions for the model.
    System,
    /// The person speaking to the assistant.
    User,
    /// The model's answer.
    Assistant,
}

/// One chat turn, in the shape chat APIs expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who is speaking.
    pub role: ChatRole,
    /// What was said.
    pub content: String,
}

impl ChatMessage {
    /// Creates a turn for `role`.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered turns, oldest first, never more than `capacity` of them.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ChatMessage>,
    capacity: usize,
}

impl ConversationHistory {
    /// Creates an empty history holding at most `capacity` turns (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records what the user said. Older turns fall off the front.
    pub fn push_user(&mut self, text: &str) {
        self.push(ChatMessage::new(ChatRole::User, format!("Command: {text}")));
    }

    /// Records the model's raw answer.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::new(ChatRole::Assistant, content));
    }

    fn push(&mut self, message: ChatMessage) {
        self.turns.push_back(message);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// Drops the newest turn if it is an unanswered user turn.
    pub fn pop_pending_user(&mut self) -> Option<ChatMessage> {
        match self.turns.back() {
            Some(last) if last.role == ChatRole::User => self.turns.pop_back(),
            _ => None,
        }
    }

    /// Turns, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.turns.iter()
    }

    /// Number of turns held.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn is held.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
