//! Typing placeholder bracketing each outbound request

use crate::state::MessageEntry;
use crate::transcript::Transcript;

/// Append the typing placeholder. Showing twice leaves a single placeholder.
pub fn show(transcript: &mut Transcript) {
    if !transcript.has_typing() {
        transcript.append(MessageEntry::typing());
    }
}

/// Remove the typing placeholder if one is showing.
pub fn hide(transcript: &mut Transcript) {
    transcript.remove_typing();
}
