//! # Printer Profiles
//!
//! A profile is the read-only printer configuration handed to the core by
//! the settings UI: identity, capability set and transport settings.
//!
//! ```json
//! {
//!   "id": "front-counter",
//!   "name": "Front counter",
//!   "capabilities": ["cut", "cash_drawer"],
//!   "settings": { "transport": "bluetooth", "paper_width": "58mm", "device_name_filter": "TM-P20" }
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::settings::{SettingsOverride, TransportKind, TransportSettings};
use crate::error::PrintError;

/// Optional printer hardware features
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Auto-cutter
    Cut,
    /// Cash drawer kick connector
    CashDrawer,
    /// Can print the business logo
    Logo,
}

/// Printer profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    pub settings: TransportSettings,
}

impl PrinterProfile {
    /// Create a profile with no optional capabilities.
    pub fn new(id: &str, name: &str, settings: TransportSettings) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            capabilities: BTreeSet::new(),
            settings,
        }
    }

    /// Builder-style capability addition.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn transport(&self) -> TransportKind {
        self.settings.kind()
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Settings for one call, with overrides applied.
    pub fn effective_settings(&self, overrides: Option<&SettingsOverride>) -> TransportSettings {
        self.settings.merged(overrides)
    }

    pub fn validate(&self) -> Result<(), PrintError> {
        if self.id.trim().is_empty() {
            return Err(PrintError::InvalidConfig("profile id is empty".to_string()));
        }
        self.settings.validate()
    }

    /// Load and validate a profile from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PrintError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&raw).map_err(|e| {
            PrintError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        profile.validate()?;
        Ok(profile)
    }
}
