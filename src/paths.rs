//! Common paths for Penchant data storage
//!
//! All Penchant data is stored under ~/.config/penchant/ on all platforms:
//! - config.toml - User configuration
//! - credentials.enc - Encrypted sign-in sessions

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the Penchant data directory (~/.config/penchant/)
pub fn penchant_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("penchant");
    fs::create_dir_all(&dir).context("Failed to create penchant directory")?;
    Ok(dir)
}

/// Get the config file path (~/.config/penchant/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(penchant_dir()?.join("config.toml"))
}

/// Get the credentials file path (~/.config/penchant/credentials.enc)
pub fn credentials_path() -> Result<PathBuf> {
    Ok(penchant_dir()?.join("credentials.enc"))
}
