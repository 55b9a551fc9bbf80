//! UI-agnostic chat state types
//!
//! These are shared between the orchestrator and whatever host renders the
//! conversation (the terminal client in this crate, or any other view).

use serde::{Deserialize, Serialize};

/// Greeting shown as the first transcript entry of every conversation
pub const GREETING: &str = "👋 Hi! I’m your Medical Health AI Assistant.\n🩺 I can run a quick diagnosis based on your weekly health data, or answer any medical-related questions you may have.\n⚠️ Please note: I respond to medical topics only.";

/// Content carried by the typing placeholder. Never shown to the user.
pub const TYPING_SENTINEL: &str = "typing";

/// User-facing text of every transport failure
pub const SERVER_ERROR: &str = "⚠️ Server error";

/// Prefix applied to diagnosis replies before they enter the transcript
pub const DIAGNOSIS_PREFIX: &str = "🩺 Diagnosis:\n";

/// A single entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: Role,
    pub kind: EntryKind,
    pub content: String,
}

/// Who an entry is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// What an entry represents, which drives how a view styles it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Info,
    User,
    Typing,
    Answer,
    Diagnosis,
    Error,
}

impl MessageEntry {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            kind: EntryKind::Info,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            kind: EntryKind::User,
            content: content.into(),
        }
    }

    pub fn typing() -> Self {
        Self {
            role: Role::Assistant,
            kind: EntryKind::Typing,
            content: TYPING_SENTINEL.to_string(),
        }
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            kind: EntryKind::Answer,
            content: content.into(),
        }
    }

    pub fn diagnosis(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            kind: EntryKind::Diagnosis,
            content: content.into(),
        }
    }

    pub fn server_error() -> Self {
        Self {
            role: Role::Assistant,
            kind: EntryKind::Error,
            content: SERVER_ERROR.to_string(),
        }
    }

    pub fn is_typing(&self) -> bool {
        self.kind == EntryKind::Typing
    }
}

/// Notification delivered to transcript subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantEvent {
    /// The transcript changed; carries the full snapshot after the mutation
    Changed(Vec<MessageEntry>),
    /// A dispatch settled and the view should scroll to the newest entry
    ScrollToEnd,
}
