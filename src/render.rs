//! Terminal rendering of the transcript
//!
//! Entries are printed once, as they are appended. The typing placeholder is
//! drawn as a transient status line and wiped when the request settles.

use colored::*;

use crate::state::{EntryKind, MessageEntry};

const CLEAR_LINE: &str = "\r\x1b[2K";

pub fn render_entry(entry: &MessageEntry) -> String {
    match entry.kind {
        EntryKind::Info => entry.content.cyan().to_string(),
        EntryKind::User => format!("{} {}", "you ›".bold().red(), entry.content),
        EntryKind::Typing => "typing…".dimmed().to_string(),
        EntryKind::Answer => format!("{}\n{}", "RayBand AI".bold(), entry.content),
        EntryKind::Diagnosis => entry.content.black().on_truecolor(255, 224, 204).to_string(),
        EntryKind::Error => entry.content.red().to_string(),
    }
}

/// Tracks what has already been printed so each snapshot only emits the new part.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    printed: usize,
    typing_visible: bool,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, snapshot: &[MessageEntry]) -> String {
        let mut out = String::new();

        if self.typing_visible {
            out.push_str(CLEAR_LINE);
            self.typing_visible = false;
        }

        let settled: Vec<&MessageEntry> = snapshot.iter().filter(|e| !e.is_typing()).collect();
        for entry in settled.iter().skip(self.printed) {
            out.push_str(&render_entry(entry));
            out.push_str("\n\n");
        }
        self.printed = self.printed.max(settled.len());

        if let Some(typing) = snapshot.iter().find(|e| e.is_typing()) {
            out.push_str(&render_entry(typing));
            self.typing_visible = true;
        }

        out
    }
}
