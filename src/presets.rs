use crate::error::StoreError;
use crate::palette::PaletteName;
use crate::settings::{FieldConfig, PointerForce};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named preset containing field settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub palette: PaletteName,
    pub config: FieldConfig,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        palette: PaletteName,
        config: FieldConfig,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            palette,
            config,
        }
    }
}

/// Sanitize a preset name into a file stem
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus user presets from the platform config directory
    pub fn new() -> Self {
        Self::with_dir(Self::presets_dir())
    }

    /// Built-ins plus user presets from `dir`, if any
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: Self::builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// Field coordinates are Braille dots, so distances are terminal-sized
    fn builtin_presets() -> Vec<Preset> {
        let neon = PaletteName::Neon.colors();
        vec![
            // Ambient - the default backdrop
            Preset::new(
                "Ambient",
                "Drifting neon particles with proximity links",
                PaletteName::Neon,
                FieldConfig {
                    min_size: 0.5,
                    max_size: 1.5,
                    interaction_radius: 30.0,
                    interaction_strength: 0.02,
                    connection_distance: 24.0,
                    colors: neon.clone(),
                    ..Default::default()
                },
            ),
            // Bubble - a few large particles that flee the pointer
            Preset::new(
                "Bubble",
                "Large particles that scatter away from the pointer",
                PaletteName::Portfolio,
                FieldConfig {
                    particle_count: 12,
                    min_size: 1.5,
                    max_size: 3.0,
                    speed: 0.3,
                    colors: PaletteName::Portfolio.colors(),
                    pointer_force: PointerForce::Repel,
                    interaction_radius: 40.0,
                    interaction_strength: 0.08,
                    show_connections: false,
                    ..Default::default()
                },
            ),
            // Nav Trail - sparse field, clicks and drags do the work
            Preset::new(
                "Nav Trail",
                "Sparse field tuned for bursts and spark trails",
                PaletteName::Nav,
                FieldConfig {
                    particle_count: 10,
                    min_size: 0.5,
                    max_size: 1.0,
                    colors: PaletteName::Nav.colors(),
                    interactive: false,
                    show_connections: false,
                    burst_count: 12,
                    burst_decay: 0.04,
                    ..Default::default()
                },
            ),
            // Constellation - dense, slow, heavily linked
            Preset::new(
                "Constellation",
                "Many slow points joined into a web",
                PaletteName::Mono,
                FieldConfig {
                    particle_count: 120,
                    min_size: 0.5,
                    max_size: 1.0,
                    speed: 0.2,
                    colors: PaletteName::Mono.colors(),
                    interaction_radius: 30.0,
                    pointer_force: PointerForce::Attract,
                    connection_distance: 30.0,
                    ..Default::default()
                },
            ),
            // Calm - reduced motion friendly
            Preset::new(
                "Calm",
                "Slow pulse, no pointer force",
                PaletteName::Matrix,
                FieldConfig {
                    particle_count: 30,
                    min_size: 0.5,
                    max_size: 1.5,
                    speed: 0.15,
                    min_pulse_speed: 0.005,
                    max_pulse_speed: 0.01,
                    colors: PaletteName::Matrix.colors(),
                    interactive: false,
                    connection_distance: 20.0,
                    ..Default::default()
                },
            ),
        ]
    }

    /// Get the presets directory path
    fn presets_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-field").join("presets"))
    }

    /// Load user presets from disk; unreadable files are skipped
    fn load_user_presets(&mut self) {
        let Some(dir) = self.dir.as_deref() else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match Self::read_preset(&path) {
                Ok(preset) => self.user.push(preset),
                Err(err) => warn!("skipping preset {}: {}", path.display(), err),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn read_preset(path: &Path) -> Result<Preset, StoreError> {
        let content = fs::read_to_string(path)?;
        let preset: Preset = serde_json::from_str(&content)?;
        preset.config.validate()?;
        Ok(preset)
    }

    /// Save a preset to disk, replacing a user preset of the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<(), StoreError> {
        preset.config.validate()?;
        let dir = self.dir.as_deref().ok_or(StoreError::NoConfigDir)?;

        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", file_stem(&preset.name)));
        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json)?;
        info!("preset '{}' saved to {}", preset.name, path.display());

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }
        Ok(())
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<(), StoreError> {
        let dir = self.dir.as_deref().ok_or(StoreError::NoConfigDir)?;

        self.user.retain(|p| p.name != name);

        let path = dir.join(format!("{}.json", file_stem(name)));
        if path.exists() {
            fs::remove_file(&path)?;
            info!("preset '{}' deleted", name);
        }
        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Get preset names for display
    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtins_are_valid() {
        let manager = PresetManager::with_dir(None);
        assert_eq!(
            manager.preset_names(),
            vec!["Ambient", "Bubble", "Nav Trail", "Constellation", "Calm"]
        );
        for preset in &manager.builtin {
            assert!(preset.config.validate().is_ok(), "{} is invalid", preset.name);
            assert_eq!(preset.config.colors, preset.palette.colors());
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let manager = PresetManager::with_dir(None);
        assert_eq!(manager.find("nav trail").map(|p| p.name.as_str()), Some("Nav Trail"));
        assert!(manager.find("missing").is_none());
    }

    #[test]
    fn test_save_reload_and_delete() {
        let dir = TempDir::new().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let preset = Preset::new(
            "My Field/1",
            "test",
            PaletteName::Matrix,
            FieldConfig {
                particle_count: 9,
                colors: PaletteName::Matrix.colors(),
                ..Default::default()
            },
        );

        manager.save_preset(preset.clone()).unwrap();
        assert!(dir.path().join("My_Field_1.json").exists());

        let reloaded = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert_eq!(reloaded.find("my field/1"), Some(&preset));

        manager.delete_preset("My Field/1").unwrap();
        assert!(manager.user.is_empty());
        assert!(!dir.path().join("My_Field_1.json").exists());
    }

    #[test]
    fn test_save_replaces_same_name() {
        let dir = TempDir::new().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let mut preset = Preset::new("Mine", "v1", PaletteName::Neon, FieldConfig::default());
        manager.save_preset(preset.clone()).unwrap();
        preset.description = "v2".to_string();
        manager.save_preset(preset).unwrap();

        assert_eq!(manager.user.len(), 1);
        assert_eq!(manager.user[0].description, "v2");
    }

    #[test]
    fn test_invalid_user_preset_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert!(manager.user.is_empty());
    }

    #[test]
    fn test_save_without_dir_fails() {
        let mut manager = PresetManager::with_dir(None);
        let preset = Preset::new("X", "", PaletteName::Neon, FieldConfig::default());
        assert!(matches!(
            manager.save_preset(preset),
            Err(StoreError::NoConfigDir)
        ));
    }
}
