// ⚙️ Configuration - reference base, product strings, status catalog
// Loaded from JSON; every field has a default so a partial file is fine.

use crate::address::{parse_address, Rebaser};
use crate::error::{AddressError, AddressField};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

// ============================================================================
// STATUS CATALOG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefinition {
    pub code: i32,
    pub label: String,
}

impl StatusDefinition {
    pub fn new(code: i32, label: &str) -> Self {
        StatusDefinition {
            code,
            label: label.to_string(),
        }
    }
}

fn default_statuses() -> Vec<StatusDefinition> {
    vec![
        StatusDefinition::new(0, "Unverified"),
        StatusDefinition::new(1, "Verified"),
        StatusDefinition::new(2, "NeedsReview"),
    ]
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address all stored offsets are relative to
    pub reference_base: String,

    /// Base offered when the user enters none
    pub default_base: String,

    /// Line 2 of the database file
    pub product_banner: String,

    /// Executable named on line 3 of the database file
    pub client_executable: String,

    pub statuses: Vec<StatusDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reference_base: "0x400000".to_string(),
            default_base: "0x400000".to_string(),
            product_banner: "Firefall DISASM Name Manager Database".to_string(),
            client_executable: "FirefallClient.exe".to_string(),
            statuses: default_statuses(),
        }
    }
}

impl Config {
    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_address(&self.reference_base, AddressField::BaseAddress)
            .context("Invalid reference_base")?;
        parse_address(&self.default_base, AddressField::BaseAddress).context("Invalid default_base")?;

        if self.statuses.is_empty() {
            bail!("Status catalog is empty");
        }

        let mut seen = HashSet::new();
        for status in &self.statuses {
            if !seen.insert(status.code) {
                bail!("Duplicate status code {} in catalog", status.code);
            }
        }

        Ok(())
    }

    /// Rebaser for the configured reference base
    pub fn rebaser(&self) -> std::result::Result<Rebaser, AddressError> {
        let reference = parse_address(&self.reference_base, AddressField::BaseAddress)?;
        Ok(Rebaser::new(reference))
    }

    pub fn status_label(&self, code: i32) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.label.as_str())
    }

    pub fn is_known_status(&self, code: i32) -> bool {
        self.status_label(code).is_some()
    }

    /// Resolve a status given as a code ("1") or a label ("Verified", case-insensitive)
    pub fn parse_status(&self, value: &str) -> Option<i32> {
        let value = value.trim();
        if let Ok(code) = value.parse::<i32>() {
            return self.is_known_status(code).then_some(code);
        }

        self.statuses
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(value))
            .map(|s| s.code)
    }

    /// "code: Label" lines, as shown in a status picker
    pub fn status_choices(&self) -> Vec<String> {
        self.statuses
            .iter()
            .map(|s| format!("{}: {}", s.code, s.label))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
