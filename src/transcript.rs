use crate::state::MessageEntry;

/// Ordered conversation transcript.
///
/// Append-only, except for the typing placeholder which is the only entry
/// ever removed. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<MessageEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<MessageEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: MessageEntry) {
        self.entries.push(entry);
    }

    /// Remove the typing placeholder, if present. Returns whether one was removed.
    pub fn remove_typing(&mut self) -> bool {
        match self.entries.iter().position(MessageEntry::is_typing) {
            Some(idx) => {
                // `remove` shifts the tail left, keeping every other entry in order
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn has_typing(&self) -> bool {
        self.entries.iter().any(MessageEntry::is_typing)
    }

    pub fn all(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn snapshot(&self) -> Vec<MessageEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
