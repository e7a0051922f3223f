use crate::error::StoreError;
use crate::palette::PaletteName;
use crate::settings::FieldConfig;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// All field parameters, including the resolved colours
    pub field: FieldConfig,
    /// Palette the colours came from (app-level)
    pub palette: PaletteName,
    /// Field ticks per rendered frame (app-level)
    pub ticks_per_frame: usize,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("config exported to {}", path.display());
        Ok(())
    }

    /// Import config from a JSON file; the field parameters must validate
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.field.validate()?;
        info!("config imported from {}", path.display());
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            field: FieldConfig::default(),
            palette: PaletteName::default(),
            ticks_per_frame: 1,
        }
    }
}
