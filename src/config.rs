//! Application configuration loaded from config.json.
//!
//! Every field has a default, so a partial (or missing) file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ocr::extract::BOILERPLATE_TOKENS;
use crate::ocr::{OcrSettings, RecognitionConfig, RecognitionProfile, StrategySettings};
use crate::plate::{FormatPolicy, ScoreWeights, ScoringMode};
use crate::restriction::TimePolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tesseract location and limits
    pub ocr: OcrSettings,
    /// Candidate scoring and plate acceptance
    pub engine: EngineSettings,
    /// Image variant generation
    pub strategies: StrategySettings,
    /// Day/time rule evaluation
    pub restriction: RestrictionSettings,
    /// Multi-image scans
    pub batch: BatchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// `strict` accepts only 4 digits + 3 letters
    pub format_policy: FormatPolicy,
    pub scoring_mode: ScoringMode,
    pub weights: ScoreWeights,
    /// Named recognition config set, used when `recognition_configs` is empty
    pub profile: RecognitionProfile,
    /// Explicit recognition configs, in enumeration order
    pub recognition_configs: Vec<RecognitionConfig>,
    /// Lines containing any of these words are discarded
    pub denylist: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            format_policy: FormatPolicy::default(),
            scoring_mode: ScoringMode::default(),
            weights: ScoreWeights::default(),
            profile: RecognitionProfile::default(),
            recognition_configs: Vec::new(),
            denylist: BOILERPLATE_TOKENS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EngineSettings {
    /// The recognition configs to run, in order.
    pub fn recognition_configs(&self) -> Vec<RecognitionConfig> {
        if self.recognition_configs.is_empty() {
            self.profile.configs()
        } else {
            self.recognition_configs.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionSettings {
    pub time_policy: TimePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Images processed concurrently
    pub workers: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { workers: 2 }
    }
}

impl AppConfig {
    /// Load config from a JSON file, or return defaults if not found.
    pub fn load(config_path: &Path) -> Self {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => {
                        crate::log(&format!("Loaded config from {}", config_path.display()));
                        return config;
                    }
                    Err(e) => {
                        crate::log(&format!("Failed to parse config: {}. Using defaults.", e));
                    }
                },
                Err(e) => {
                    crate::log(&format!("Failed to read config: {}. Using defaults.", e));
                }
            }
        } else {
            crate::log(&format!(
                "No config at {}, using defaults",
                config_path.display()
            ));
        }
        Self::default()
    }

    /// Save default config to file (for reference).
    pub fn save_default(config_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        fs::write(config_path, json)
            .with_context(|| format!("Failed to write {}", config_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.strategies.enlarge_factor, 2.5);
        assert_eq!(config.restriction.time_policy, TimePolicy::Continuous);
        assert_eq!(config.engine.format_policy, FormatPolicy::Permissive);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "engine": { "format_policy": "strict", "profile": "relaxed" },
                "restriction": { "time_policy": "split" },
                "batch": { "workers": 8 }
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path);
        assert_eq!(config.engine.format_policy, FormatPolicy::Strict);
        assert_eq!(config.engine.scoring_mode, ScoringMode::Strict);
        assert_eq!(config.engine.denylist.len(), 4);
        assert_eq!(config.restriction.time_policy, TimePolicy::Split);
        assert_eq!(config.batch.workers, 8);
        assert_eq!(config.ocr.timeout_ms, 10_000);
        assert_eq!(
            config.engine.recognition_configs(),
            RecognitionProfile::Relaxed.configs()
        );
    }

    #[test]
    fn test_explicit_recognition_configs_win() {
        let engine: EngineSettings = serde_json::from_str(
            r#"{ "recognition_configs": [ { "id": "line", "psm": 7, "whitelist": "0123456789" } ] }"#,
        )
        .unwrap();
        let configs = engine.recognition_configs();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id, "line");
    }

    #[test]
    fn test_save_default_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        AppConfig::save_default(&path).unwrap();
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }
}
