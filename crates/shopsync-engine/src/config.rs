//! # Store Configuration
//!
//! Persistent mapping of tenant id → {store code, Shopify location id}.
//!
//! ## File Format
//! ```toml
//! # stores.toml
//! [stores.store-1]
//! store_code = "STORE-1"
//! location_id = "88049083702"
//!
//! [stores.store-2]
//! store_code = "STORE-2"
//! location_id = "88049083703"
//! ```
//!
//! The file lives in the platform config directory by default
//! (`~/.config/shopsync/stores.toml` on Linux) and is read on startup,
//! written when the user saves a store. Saves go through a temp-file rename
//! so a crash mid-write cannot truncate the existing config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use shopsync_core::validation::{validate_location_id, validate_store_code};

use crate::error::{SyncError, SyncResult};

/// Config file name inside the project config directory.
const CONFIG_FILE: &str = "stores.toml";

// =============================================================================
// Store Entry
// =============================================================================

/// One tenant's saved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    /// Store code used for POS paths, queues, and log files.
    pub store_code: String,

    /// Shopify location id inventory levels are written against.
    pub location_id: String,
}

impl StoreEntry {
    /// Validates both identifiers.
    pub fn validate(&self) -> SyncResult<()> {
        validate_store_code(&self.store_code)?;
        validate_location_id(&self.location_id)?;
        Ok(())
    }
}

// =============================================================================
// Config File
// =============================================================================

/// The on-disk tenant map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfigFile {
    /// Tenant id → saved store entry.
    #[serde(default)]
    pub stores: BTreeMap<String, StoreEntry>,
}

impl StoreConfigFile {
    /// Default config path in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "shopsync", "shopsync")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads the config from a path. A missing file is an empty config,
    /// not an error.
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No store config file, starting empty");
            return Ok(StoreConfigFile::default());
        }

        let text = std::fs::read_to_string(path)?;
        let config: StoreConfigFile = toml::from_str(&text)?;

        info!(
            path = %path.display(),
            stores = config.stores.len(),
            "Loaded store config"
        );
        Ok(config)
    }

    /// Saves the config to a path via temp-file rename.
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let text = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;

        info!(path = %path.display(), stores = self.stores.len(), "Saved store config");
        Ok(())
    }

    /// Looks up a tenant's entry.
    pub fn get(&self, store_id: &str) -> Option<&StoreEntry> {
        self.stores.get(store_id)
    }

    /// Inserts or replaces a tenant's entry after validating it.
    pub fn set_store(&mut self, store_id: impl Into<String>, entry: StoreEntry) -> SyncResult<()> {
        entry.validate()?;
        self.stores.insert(store_id.into(), entry);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
