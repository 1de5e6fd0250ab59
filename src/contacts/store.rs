//! In-memory contact list backed by an asynchronous vault

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use super::VoiceContact;
use crate::{Error, Result};

/// Persistence seam for the contact list
///
/// The backing implementation owns encryption and durability; the store only
/// sees whole-list load/persist. Each `persist` is atomic from the caller's
/// perspective.
#[async_trait]
pub trait ContactVault: Send + Sync {
    /// Load the persisted contact list
    async fn load(&self) -> Result<Vec<VoiceContact>>;

    /// Replace the persisted contact list
    async fn persist(&self, contacts: &[VoiceContact]) -> Result<()>;
}

/// Volatile vault for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryVault {
    contacts: Mutex<Vec<VoiceContact>>,
}

impl MemoryVault {
    /// Create an empty in-memory vault
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactVault for MemoryVault {
    async fn load(&self) -> Result<Vec<VoiceContact>> {
        Ok(self.contacts.lock().map(|c| c.clone()).unwrap_or_default())
    }

    async fn persist(&self, contacts: &[VoiceContact]) -> Result<()> {
        if let Ok(mut stored) = self.contacts.lock() {
            *stored = contacts.to_vec();
        }
        Ok(())
    }
}

/// One row from the device contact directory
///
/// Platform pickers return arrays of names and telephone numbers per person;
/// only the first of each is used for import.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "name")]
    pub names: Vec<String>,
    #[serde(rename = "tel")]
    pub tels: Vec<String>,
}

/// Capability-gated device directory picker
#[async_trait]
pub trait ContactPicker: Send + Sync {
    /// Whether the platform exposes a contact picker
    fn is_supported(&self) -> bool;

    /// Open the picker and return the selected entries
    async fn pick(&self) -> Result<Vec<DirectoryEntry>>;
}

/// Contact directory for voice-command recipient resolution
///
/// Keeps the working copy in memory and writes through the vault. A vault
/// failure leaves the in-memory list unchanged.
pub struct VoiceContactStore {
    vault: Arc<dyn ContactVault>,
    contacts: RwLock<Vec<VoiceContact>>,
    initialized: AtomicBool,
}

impl VoiceContactStore {
    /// Create a store over a vault; call [`initialize`](Self::initialize)
    /// before first use
    #[must_use]
    pub fn new(vault: Arc<dyn ContactVault>) -> Self {
        Self {
            vault,
            contacts: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Load persisted contacts into memory
    ///
    /// Idempotent: subsequent calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the vault cannot be read
    pub async fn initialize(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        let loaded = self.vault.load().await?;
        tracing::debug!(count = loaded.len(), "contact store initialized");

        if let Ok(mut contacts) = self.contacts.write() {
            *contacts = loaded;
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Snapshot of the current contact list
    #[must_use]
    pub fn list(&self) -> Vec<VoiceContact> {
        self.contacts.read().map(|c| c.clone()).unwrap_or_default()
    }

    /// Upsert a contact keyed by case-folded name
    ///
    /// Saving the identical contact again is a no-op. A name that folds to an
    /// existing contact's name but is spelled differently is rejected, so
    /// "david" can never shadow "David". Renames are delete-then-save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty name, a malformed phone, or
    /// a case-insensitive name collision; [`Error::Storage`] if persisting
    /// fails (the in-memory list is left unchanged)
    pub async fn save(&self, contact: VoiceContact) -> Result<()> {
        contact.validate()?;

        let folded = contact.folded_name();
        let mut next = self.list();

        if let Some(existing) = next.iter_mut().find(|c| c.folded_name() == folded) {
            if existing.name != contact.name {
                return Err(Error::Validation(format!(
                    "a contact named \"{}\" already exists",
                    existing.name
                )));
            }
            if existing.phone == contact.phone {
                return Ok(());
            }
            existing.phone = contact.phone.clone();
        } else {
            next.push(contact.clone());
        }

        self.vault.persist(&next).await?;
        self.commit(next);

        tracing::info!(name = %contact.name, "contact saved");
        Ok(())
    }

    /// Remove a contact by name (case-insensitive)
    ///
    /// Returns whether a contact was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if persisting fails
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let folded = name.trim().to_lowercase();
        let mut next = self.list();
        let before = next.len();
        next.retain(|c| c.folded_name() != folded);

        if next.len() == before {
            return Ok(false);
        }

        self.vault.persist(&next).await?;
        self.commit(next);

        tracing::info!(name, "contact removed");
        Ok(true)
    }

    /// Remove all contacts
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if persisting fails
    pub async fn clear(&self) -> Result<()> {
        self.vault.persist(&[]).await?;
        self.commit(Vec::new());

        tracing::info!("contact store cleared");
        Ok(())
    }

    /// Import device directory entries, one [`save`](Self::save) per entry
    ///
    /// Uses the first name/telephone pair of each entry. Entries missing
    /// either are skipped silently; entries failing validation are skipped
    /// with a log line. Returns the number of contacts actually saved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the vault fails mid-import
    pub async fn import(&self, entries: &[DirectoryEntry]) -> Result<usize> {
        let mut added = 0;

        for entry in entries {
            let name = entry.names.first().map(|n| n.trim()).unwrap_or_default();
            let tel = entry.tels.first().map(|t| t.trim()).unwrap_or_default();
            if name.is_empty() || tel.is_empty() {
                continue;
            }

            match self.save(VoiceContact::new(name, tel)).await {
                Ok(()) => added += 1,
                Err(Error::Validation(reason)) => {
                    tracing::debug!(name, reason, "skipped directory entry");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(added, total = entries.len(), "directory import finished");
        Ok(added)
    }

    /// Run the platform picker and import its selection
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCapability`] when no picker is available,
    /// or any error from the picker or the import itself
    pub async fn import_from(&self, picker: &dyn ContactPicker) -> Result<usize> {
        if !picker.is_supported() {
            return Err(Error::UnsupportedCapability);
        }
        let entries = picker.pick().await?;
        self.import(&entries).await
    }

    fn commit(&self, next: Vec<VoiceContact>) {
        if let Ok(mut contacts) = self.contacts.write() {
            *contacts = next;
        }
    }
}
