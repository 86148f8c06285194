//! Player settings and preferences
//!
//! Persisted outside the simulation (JSON on disk for the native driver).
//! The simulation only ever reads them, once, when a run is constructed.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Roll a difficulty tier per stage; when false the sliders below are used
    pub use_stage_presets: bool,
    /// Manual meteor intensity (1-10)
    pub meteor_intensity: u8,
    /// Manual meteor speed (1-10)
    pub trail_speed: u8,
    /// Cosmetic car skin
    pub selected_skin_id: String,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_stage_presets: true,
            meteor_intensity: 4,
            trail_speed: 4,
            selected_skin_id: "default".to_string(),
            muted: false,
        }
    }
}

impl Settings {
    /// Manual intensity clamped to the valid range
    pub fn effective_intensity(&self) -> u8 {
        self.meteor_intensity.clamp(1, 10)
    }

    /// Manual speed clamped to the valid range
    pub fn effective_speed(&self) -> u8 {
        self.trail_speed.clamp(1, 10)
    }

    /// Parse settings, falling back to defaults on corrupt data.
    /// Missing keys keep their default values.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Ignoring corrupt settings ({err}), using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from disk
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded settings from {}", path.display());
                Self::from_json(&json)
            }
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to disk. Any existing file is left alone when
    /// serialization fails.
    pub fn save(&self, path: &Path) {
        let json = match self.to_json() {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Could not serialize settings: {err}");
                return;
            }
        };
        if let Err(err) = std::fs::write(path, json) {
            log::warn!("Could not save settings to {}: {err}", path.display());
        } else {
            log::info!("Settings saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let settings = Settings::from_json(r#"{ "use_stage_presets": false, "trail_speed": 9 }"#);
        assert!(!settings.use_stage_presets);
        assert_eq!(settings.trail_speed, 9);
        assert_eq!(settings.meteor_intensity, 4);
        assert_eq!(settings.selected_skin_id, "default");
    }

    #[test]
    fn test_corrupt_json_falls_back() {
        assert_eq!(Settings::from_json("{not json"), Settings::default());
    }

    #[test]
    fn test_effective_values_clamped() {
        let settings = Settings {
            meteor_intensity: 0,
            trail_speed: 42,
            ..Default::default()
        };
        assert_eq!(settings.effective_intensity(), 1);
        assert_eq!(settings.effective_speed(), 10);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("space_punch_settings_{}.json", std::process::id()));
        let settings = Settings {
            selected_skin_id: "neon".to_string(),
            muted: true,
            ..Default::default()
        };
        settings.save(&path);
        assert_eq!(Settings::load(&path), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_to_json_reads_back() {
        let settings = Settings {
            use_stage_presets: false,
            meteor_intensity: 7,
            ..Default::default()
        };
        let json = settings.to_json().expect("settings serialize");
        assert!(json.contains("\"meteor_intensity\": 7"));
        assert_eq!(Settings::from_json(&json), settings);
    }

    #[test]
    fn test_save_to_unwritable_path_is_harmless() {
        let path = std::env::temp_dir()
            .join("space_punch_no_such_dir")
            .join("settings.json");
        Settings::default().save(&path);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("space_punch_definitely_missing.json");
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
