//! Voice contact directory
//!
//! Name-to-phone mappings used for voice-command recipient resolution.
//! Contacts live in an encrypted vault and are mutated only through
//! [`VoiceContactStore`].

mod resolver;
mod store;
mod vault;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use resolver::resolve;
pub use store::{ContactPicker, ContactVault, DirectoryEntry, MemoryVault, VoiceContactStore};
pub use vault::EncryptedFileVault;

/// Accepted phone number shape: digits plus `+`, spaces, `-` and parentheses
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+\d\s\-()]{7,15}$").expect("valid regex"));

/// A stored name-to-phone mapping
///
/// The name is the natural key; uniqueness is enforced case-insensitively
/// by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceContact {
    pub name: String,
    pub phone: String,
}

impl VoiceContact {
    /// Create a contact, trimming both fields
    #[must_use]
    pub fn new(name: &str, phone: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
        }
    }

    /// Case-folded name used for uniqueness and lookup
    #[must_use]
    pub fn folded_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Validate name and phone shape
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name is empty or the phone does
    /// not match the accepted pattern
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        if self.phone.is_empty() {
            return Err(Error::Validation("phone number is required".to_string()));
        }
        if !is_phone_shaped(&self.phone) {
            return Err(Error::Validation(format!(
                "\"{}\" is not a valid phone number",
                self.phone
            )));
        }
        Ok(())
    }
}

/// Check whether a token looks like a phone number
#[must_use]
pub fn is_phone_shaped(token: &str) -> bool {
    PHONE_REGEX.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_shape_accepts_common_forms() {
        assert!(is_phone_shaped("0712345678"));
        assert!(is_phone_shaped("+254 712 345"));
        assert!(is_phone_shaped("(071) 234-56"));
    }

    #[test]
    fn test_phone_shape_rejects_bad_lengths() {
        assert!(!is_phone_shaped("071234"));
        assert!(!is_phone_shaped("0712345678901234"));
        assert!(!is_phone_shaped(""));
    }

    #[test]
    fn test_phone_shape_rejects_foreign_characters() {
        assert!(!is_phone_shaped("07123456a"));
        assert!(!is_phone_shaped("0712.345.678"));
        assert!(!is_phone_shaped("call David"));
    }

    #[test]
    fn test_validate_requires_name_and_phone() {
        assert!(VoiceContact::new("", "0712345678").validate().is_err());
        assert!(VoiceContact::new("David", "").validate().is_err());
        assert!(VoiceContact::new("David", "not a phone").validate().is_err());
        assert!(VoiceContact::new("David", "0712345678").validate().is_ok());
    }

    #[test]
    fn test_new_trims_fields() {
        let contact = VoiceContact::new("  David ", " 0712345678 ");
        assert_eq!(contact.name, "David");
        assert_eq!(contact.phone, "0712345678");
    }
}
