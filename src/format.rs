use crate::api::{AskReply, ReplyPayload};

/// Render a reply into the text shown in the transcript.
///
/// Diagnosis text passes through untouched; the dispatcher adds its prefix.
pub fn format(reply: &ReplyPayload) -> String {
    match reply {
        ReplyPayload::Answer(answer) => format_answer(answer),
        ReplyPayload::Diagnosis(diagnosis) => diagnosis.diagnosis.clone(),
    }
}

/// Answer text followed by a sources block, sources in server order.
pub fn format_answer(reply: &AskReply) -> String {
    let mut text = reply.answer.clone();

    let sources = reply.sources.as_deref().unwrap_or_default();
    if !sources.is_empty() {
        text.push_str("\n\n📚 Sources:\n");
        for source in sources {
            text.push_str(&format!("• {} — page {}\n", source.book, source.page));
        }
    }

    text
}
