pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod gate;
pub mod logging;
pub mod orchestrator;
pub mod placeholder;
pub mod render;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use api::{AskQuery, AskReply, AssistantBackend, DiagnosisReply, HttpBackend, ReplyPayload, Source};
pub use config::Config;
pub use error::{DispatchError, DispatchOutcome, SkipReason};
pub use orchestrator::Assistant;
pub use state::{AssistantEvent, EntryKind, MessageEntry, Role};
pub use transcript::Transcript;
