use std::collections::HashMap;
use std::path::Path;

use chrono::{Local, NaiveDate};
use log::debug;
use serde::Deserialize;

use crate::utils::ScanError;

/// Scan settings, loaded from a JSON file and overridden by CLI flags.
///
/// Every key is optional in the file; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Date the century heuristics are anchored to. Today when unset.
    pub reference_date: Option<NaiveDate>,
    /// Birth years before this are treated as misreads.
    pub min_birth_year: i32,
    /// How far in the past a current-century expiry may lie before it rolls
    /// over to the next century.
    pub expiry_past_window_years: i32,
    /// Apply the confusable-character table to numeric MRZ slices.
    pub correct_confusables: bool,
    /// Prefix CSV output with a UTF-8 byte order mark.
    pub csv_bom: bool,
    /// Extra personal number lengths keyed by issuing country code.
    pub personal_number_lengths: HashMap<String, usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            reference_date: None,
            min_birth_year: 1940,
            expiry_past_window_years: 10,
            correct_confusables: false,
            csv_bom: true,
            personal_number_lengths: HashMap::new(),
        }
    }
}

impl ScanConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScanError::IoError(format!("Failed to read config {}: {}", path.display(), e)))?;
        let config = Self::from_json(&contents)?;
        debug!("Loaded scan config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, ScanError> {
        let config: ScanConfig = serde_json::from_str(contents)
            .map_err(|e| ScanError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.expiry_past_window_years < 0 || self.expiry_past_window_years > 99 {
            return Err(ScanError::ConfigError(format!(
                "expiry_past_window_years must be within 0..=99, got {}",
                self.expiry_past_window_years
            )));
        }
        if let Some((code, _)) = self.personal_number_lengths.iter().find(|(_, len)| **len == 0) {
            return Err(ScanError::ConfigError(format!(
                "personal number length for {} must be positive",
                code
            )));
        }
        Ok(())
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().naive_local().date())
    }
}
