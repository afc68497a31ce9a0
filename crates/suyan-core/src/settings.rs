//! Learning-layer tunables loaded from TOML.
//!
//! - Default values are embedded via `include_str!("default_settings.toml")`
//! - `parse_settings_toml` validates a custom file
//! - `load_first` resolves the first readable, valid file from a search list
//!
//! Settings are plain values handed to each component at construction time.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub frequency: FrequencySettings,
    pub merge: MergeSettings,
    pub learning: LearningSettings,
    pub mode: ModeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrequencySettings {
    pub selection_unit: u64,
    pub compound_weight: u64,
    pub journal_compact_threshold: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeSettings {
    pub max_injected: usize,
    pub min_score: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LearningSettings {
    pub enabled: bool,
    pub max_segments: usize,
    pub max_compound_chars: usize,
    pub max_gap_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeSettings {
    pub revert_temporary_on_commit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded settings TOML must be valid")
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

/// Return the settings from the first path that exists and parses, together
/// with that path. Falls back to the embedded defaults.
pub fn load_first(paths: &[PathBuf]) -> (Settings, Option<PathBuf>) {
    for path in paths {
        match read_file(path) {
            Ok(Some(s)) => {
                debug!(path = %path.display(), "settings loaded");
                return (s, Some(path.clone()));
            }
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "settings file ignored"),
        }
    }
    (Settings::default(), None)
}

fn read_file(path: &Path) -> Result<Option<Settings>, SettingsError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_settings_toml(&content).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SettingsError::Parse(e.to_string())),
    }
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive!(frequency.selection_unit);
    check_positive!(frequency.compound_weight);
    check_positive!(frequency.journal_compact_threshold);
    if s.frequency.compound_weight <= s.frequency.selection_unit {
        return Err(SettingsError::InvalidValue {
            field: "frequency.compound_weight".to_string(),
            reason: "must be greater than frequency.selection_unit".to_string(),
        });
    }

    check_positive!(merge.min_score);

    check_positive!(learning.max_segments);
    check_positive!(learning.max_compound_chars);
    if s.learning.max_segments < 2 {
        return Err(SettingsError::InvalidValue {
            field: "learning.max_segments".to_string(),
            reason: "must allow at least two segments".to_string(),
        });
    }

    Ok(())
}
