//! Encrypted on-disk contact vault
//!
//! Contacts are serialized to JSON and sealed with AES-256-GCM under a
//! device-local master key. The key file is created on first use with
//! owner-only permissions. Nothing readable ever touches the vault file.

use std::path::{Path, PathBuf};

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use super::VoiceContact;
use super::store::ContactVault;
use crate::{Error, Result};

const VAULT_SCHEMA_VERSION: u8 = 1;
const MASTER_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// On-disk vault document
#[derive(Debug, Serialize, Deserialize)]
struct VaultDocument {
    schema_version: u8,
    nonce_b64: String,
    ciphertext_b64: String,
}

/// File-backed [`ContactVault`] sealed with AES-256-GCM
pub struct EncryptedFileVault {
    vault_path: PathBuf,
    key_path: PathBuf,
    legacy_path: Option<PathBuf>,
}

impl EncryptedFileVault {
    /// Create a vault at explicit paths
    #[must_use]
    pub const fn for_paths(vault_path: PathBuf, key_path: PathBuf) -> Self {
        Self {
            vault_path,
            key_path,
            legacy_path: None,
        }
    }

    /// Create a vault with the standard file names inside `dir`
    ///
    /// Picks up `contacts.json` in the same directory as a legacy plaintext
    /// store to migrate on first load.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            vault_path: dir.join("contacts.vault.json"),
            key_path: dir.join("contacts.master.key"),
            legacy_path: Some(dir.join("contacts.json")),
        }
    }

    /// Set a legacy plaintext file to migrate from
    #[must_use]
    pub fn with_legacy(mut self, path: PathBuf) -> Self {
        self.legacy_path = Some(path);
        self
    }

    async fn ensure_parent_dirs(&self) -> Result<()> {
        if let Some(parent) = self.vault_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(e.to_string()))?;
        }
        if let Some(parent) = self.key_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(e.to_string()))?;
        }
        Ok(())
    }

    async fn load_or_create_master_key(&self) -> Result<[u8; MASTER_KEY_LEN]> {
        if self.key_path.exists() {
            let encoded = tokio::fs::read_to_string(&self.key_path)
                .await
                .map_err(|e| Error::Storage(e.to_string()))?;
            let decoded = BASE64
                .decode(encoded.trim().as_bytes())
                .map_err(|e| Error::Storage(e.to_string()))?;
            if decoded.len() != MASTER_KEY_LEN {
                return Err(Error::Storage("master key has wrong length".to_string()));
            }
            let mut key = [0u8; MASTER_KEY_LEN];
            key.copy_from_slice(&decoded);
            return Ok(key);
        }

        self.ensure_parent_dirs().await?;
        let mut key = [0u8; MASTER_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        write_new_file_restricted(&self.key_path, BASE64.encode(key).as_bytes()).await?;

        tracing::info!(path = %self.key_path.display(), "created contact vault master key");
        Ok(key)
    }

    /// One-time migration from a legacy plaintext contact file
    ///
    /// Keeps existing users' contacts after the move to encrypted storage.
    async fn migrate_legacy(&self) -> Result<Option<Vec<VoiceContact>>> {
        let Some(legacy_path) = &self.legacy_path else {
            return Ok(None);
        };
        if !legacy_path.exists() {
            return Ok(None);
        }

        let raw = tokio::fs::read_to_string(legacy_path)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        let contacts: Vec<VoiceContact> =
            serde_json::from_str(&raw).map_err(|e| Error::Storage(e.to_string()))?;

        self.persist(&contacts).await?;
        if let Err(e) = tokio::fs::remove_file(legacy_path).await {
            tracing::warn!(
                path = %legacy_path.display(),
                error = %e,
                "failed to remove legacy contact file after migration"
            );
        }

        tracing::info!(
            count = contacts.len(),
            path = %legacy_path.display(),
            "migrated legacy plaintext contacts into vault"
        );
        Ok(Some(contacts))
    }
}

#[async_trait]
impl ContactVault for EncryptedFileVault {
    async fn load(&self) -> Result<Vec<VoiceContact>> {
        if !self.vault_path.exists() {
            if let Some(migrated) = self.migrate_legacy().await? {
                return Ok(migrated);
            }
            return Ok(Vec::new());
        }

        let raw = tokio::fs::read_to_string(&self.vault_path)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let doc: VaultDocument =
            serde_json::from_str(&raw).map_err(|e| Error::Storage(e.to_string()))?;
        if doc.schema_version != VAULT_SCHEMA_VERSION {
            return Err(Error::Storage(format!(
                "unsupported vault schema version {}",
                doc.schema_version
            )));
        }

        let key = self.load_or_create_master_key().await?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| Error::Storage("vault cipher init failed".to_string()))?;

        let nonce_raw = BASE64
            .decode(doc.nonce_b64.as_bytes())
            .map_err(|e| Error::Storage(e.to_string()))?;
        if nonce_raw.len() != NONCE_LEN {
            return Err(Error::Storage("vault nonce has wrong length".to_string()));
        }
        let ciphertext = BASE64
            .decode(doc.ciphertext_b64.as_bytes())
            .map_err(|e| Error::Storage(e.to_string()))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_raw), ciphertext.as_slice())
            .map_err(|_| Error::Storage("vault decryption failed".to_string()))?;

        let contacts: Vec<VoiceContact> =
            serde_json::from_slice(&plaintext).map_err(|e| Error::Storage(e.to_string()))?;

        tracing::debug!(count = contacts.len(), "loaded contacts from vault");
        Ok(contacts)
    }

    async fn persist(&self, contacts: &[VoiceContact]) -> Result<()> {
        self.ensure_parent_dirs().await?;

        let key = self.load_or_create_master_key().await?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| Error::Storage("vault cipher init failed".to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let plaintext =
            serde_json::to_vec(contacts).map_err(|e| Error::Storage(e.to_string()))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|_| Error::Storage("vault encryption failed".to_string()))?;

        let doc = VaultDocument {
            schema_version: VAULT_SCHEMA_VERSION,
            nonce_b64: BASE64.encode(nonce_bytes),
            ciphertext_b64: BASE64.encode(ciphertext),
        };
        let serialized =
            serde_json::to_vec_pretty(&doc).map_err(|e| Error::Storage(e.to_string()))?;

        atomic_write(&self.vault_path, &serialized).await?;

        tracing::debug!(count = contacts.len(), "persisted contacts to vault");
        Ok(())
    }
}

/// Write via a temp file and rename so readers never see a torn vault
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");
    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

async fn write_new_file_restricted(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(path, perms)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
    }
    Ok(())
}
