//! Session storage (encrypted file-based)
//!
//! Sign-in sessions are stored encrypted with AES-256-GCM in
//! ~/.config/penchant/credentials.enc, one entry per backend URL.
//! The encryption key is derived from machine-specific identifiers.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Session;
use crate::paths;

const NONCE_SIZE: usize = 12;

/// Get machine ID for key derivation (cross-platform)
fn get_machine_id() -> String {
    // Linux: /etc/machine-id or /var/lib/dbus/machine-id
    #[cfg(target_os = "linux")]
    {
        if let Ok(id) = fs::read_to_string("/etc/machine-id") {
            return id.trim().to_string();
        }
        if let Ok(id) = fs::read_to_string("/var/lib/dbus/machine-id") {
            return id.trim().to_string();
        }
    }

    // macOS: IOPlatformUUID via ioreg
    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(uuid) = stdout
                .lines()
                .find(|line| line.contains("IOPlatformUUID"))
                .and_then(|line| line.split('"').nth(3))
            {
                return uuid.to_string();
            }
        }
    }

    // Fallback: home directory path
    dirs::home_dir().map_or_else(
        || "penchant-fallback-key".to_string(),
        |p| p.to_string_lossy().to_string(),
    )
}

/// Derive encryption key from machine-specific data
fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(get_machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    hasher.update(b"penchant-storefront-v1");
    hasher.finalize().into()
}

/// Encrypted map of stored sessions
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the default location
    pub fn open() -> Result<Self> {
        Ok(Self::at(paths::credentials_path()?))
    }

    /// Store at a specific file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session saved for a backend
    pub fn load_session(&self, backend_url: &str) -> Result<Option<Session>> {
        let entries = self.load()?;
        entries
            .get(&session_key(backend_url))
            .map(|json| serde_json::from_str(json).context("Stored session is corrupt"))
            .transpose()
    }

    /// Save (or replace) the session for a backend
    pub fn save_session(&self, backend_url: &str, session: &Session) -> Result<()> {
        let mut entries = self.load().unwrap_or_default();
        entries.insert(session_key(backend_url), serde_json::to_string(session)?);
        self.save(&entries)
    }

    /// Forget the session for a backend
    pub fn remove_session(&self, backend_url: &str) -> Result<()> {
        let mut entries = self.load().unwrap_or_default();
        if entries.remove(&session_key(backend_url)).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let encrypted = fs::read(&self.path).context("Failed to read credentials file")?;

        if encrypted.len() < NONCE_SIZE {
            return Ok(HashMap::new());
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let key = derive_key();
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| anyhow::anyhow!("Failed to decrypt credentials"))?;

        let json = String::from_utf8(plaintext).context("Invalid UTF-8 in credentials")?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }

        let json = serde_json::to_string(entries)?;

        let key = derive_key();
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, json.as_bytes())
            .map_err(|_| anyhow::anyhow!("Failed to encrypt credentials"))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);

        fs::write(&self.path, output).context("Failed to write credentials file")?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

/// Load the saved session for a backend, refreshing it when expired
///
/// A refreshed session replaces the stored one. When the refresh is
/// rejected the stored session is removed and `None` comes back, as it does
/// when nothing usable is saved.
pub async fn restore_session<F, Fut>(
    credentials: &CredentialStore,
    backend_url: &str,
    refresh: F,
) -> Result<Option<Session>>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = crate::Result<Session>>,
{
    let session = match credentials.load_session(backend_url) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Ignoring saved session: {e:#}");
            None
        }
    };
    let Some(session) = session else {
        return Ok(None);
    };

    if !session.is_expired() {
        return Ok(Some(session));
    }

    match refresh(session.refresh_token).await {
        Ok(fresh) => {
            tracing::debug!("Session refreshed for {}", fresh.user.label());
            credentials.save_session(backend_url, &fresh)?;
            Ok(Some(fresh))
        }
        Err(e) => {
            tracing::warn!("Session expired and could not be refreshed: {e}");
            credentials.remove_session(backend_url)?;
            Ok(None)
        }
    }
}

fn session_key(backend_url: &str) -> String {
    format!("penchant:session:{}", backend_url.trim_end_matches('/'))
}
