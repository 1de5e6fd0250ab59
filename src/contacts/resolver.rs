//! Recipient resolution against the contact list
//!
//! Matching is exact case-insensitive name equality only. Partial and
//! phonetic matching are deliberately absent: a wrong guess here sends money
//! to the wrong person.

use super::VoiceContact;

/// Resolve a spoken recipient token to a stored phone number
///
/// Returns `None` when no contact's name matches the token exactly under
/// case-folding; the caller must then ask the user to retry or pick manually.
#[must_use]
pub fn resolve(recipient_token: &str, contacts: &[VoiceContact]) -> Option<String> {
    let folded = recipient_token.trim().to_lowercase();
    if folded.is_empty() {
        return None;
    }

    contacts
        .iter()
        .find(|c| c.folded_name() == folded)
        .map(|c| c.phone.clone())
}
