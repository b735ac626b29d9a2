//! Configuration file support.
//!
//! Settings are layered, lowest priority first:
//! - the selected preset (`standard` unless configured otherwise)
//! - a TOML file: `--config <path>`, or the nearest `.clahe.toml` above the cwd
//! - explicit CLI flags (applied by the caller)

use std::path::{Path, PathBuf};

use clahe_core::ClaheParams;
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const PROJECT_CONFIG_NAME: &str = ".clahe.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Equalization settings.
    pub clahe: ClaheConfig,
    /// Batch mode settings.
    pub batch: BatchConfig,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ClaheConfig {
    /// Base preset the remaining keys override.
    pub preset: Option<String>,
    pub tile_length: Option<u32>,
    pub clip_factor: Option<f64>,
    pub blend_factor: Option<f64>,
    pub smoothing: Option<f64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads (default: one per core).
    pub jobs: Option<usize>,
    /// Reprocess up-to-date outputs.
    pub force: Option<bool>,
}

/// Per-invocation overrides collected from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct ParamOverrides {
    pub preset: Option<String>,
    pub tile_length: Option<u32>,
    pub clip_factor: Option<f64>,
    pub blend_factor: Option<f64>,
    pub smoothing: Option<f64>,
}

impl AppConfig {
    /// Load the explicit config file if given, else the nearest project file.
    /// Missing or unparsable files fall back to defaults with a warning.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => find_project_config(),
        };

        let config = match path {
            Some(ref p) => {
                info!("Loading config: {}", p.display());
                load_file(p).unwrap_or_default()
            }
            None => {
                debug!("No config file found");
                Self::default()
            }
        };

        if let Err(e) = config.validate() {
            warn!("{e}");
        }
        config
    }

    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.clahe.tile_length == Some(0) {
            return Err("clahe.tile_length must be greater than 0".into());
        }
        if let Some(b) = self.clahe.blend_factor {
            if !(0.0..=1.0).contains(&b) {
                return Err(format!("clahe.blend_factor must be 0.0-1.0, got {b}"));
            }
        }
        if let Some(s) = self.clahe.smoothing {
            if !(0.0..=1.0).contains(&s) {
                return Err(format!("clahe.smoothing must be 0.0-1.0, got {s}"));
            }
        }
        if let Some(ref name) = self.clahe.preset {
            if ClaheParams::from_preset(name).is_none() {
                return Err(format!(
                    "clahe.preset '{}' is unknown. Available: {}",
                    name,
                    ClaheParams::preset_names().join(", ")
                ));
            }
        }
        Ok(())
    }

    /// Resolve the final parameters: preset < config file < CLI flags.
    ///
    /// Returns the preset name used for output file naming alongside the
    /// parameters.
    pub fn resolve(&self, flags: &ParamOverrides) -> Result<(String, ClaheParams), String> {
        let preset = flags
            .preset
            .clone()
            .or_else(|| self.clahe.preset.clone())
            .unwrap_or_else(|| "standard".to_string());
        let base = ClaheParams::from_preset(&preset).ok_or_else(|| {
            format!(
                "Unknown preset '{}'. Available: {}",
                preset,
                ClaheParams::preset_names().join(", ")
            )
        })?;

        let params = ClaheParams {
            tile_length: flags
                .tile_length
                .or(self.clahe.tile_length)
                .unwrap_or(base.tile_length),
            clip_factor: flags
                .clip_factor
                .or(self.clahe.clip_factor)
                .unwrap_or(base.clip_factor),
            blend_factor: flags
                .blend_factor
                .or(self.clahe.blend_factor)
                .unwrap_or(base.blend_factor),
            smoothing: flags
                .smoothing
                .or(self.clahe.smoothing)
                .unwrap_or(base.smoothing),
        };
        Ok((preset, params))
    }
}

/// Find project-local config by searching up from the current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.clahe.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_NAME))
        .find(|p| p.exists())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_resolves_to_standard() {
        let config = AppConfig::default();
        let (name, params) = config.resolve(&ParamOverrides::default()).unwrap();
        assert_eq!(name, "standard");
        assert_eq!(params, ClaheParams::standard());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[clahe]
preset = "gentle"
tile_length = 16
clip_factor = 3.5
blend_factor = 0.8
smoothing = 0.0

[batch]
jobs = 2
force = true
"#;
        let config: AppConfig = toml::from_str(toml).expect("parse full config");
        assert_eq!(config.clahe.preset.as_deref(), Some("gentle"));
        assert_eq!(config.clahe.tile_length, Some(16));
        assert_eq!(config.batch.jobs, Some(2));
        assert_eq!(config.batch.force, Some(true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_config_override_preset() {
        let toml = r#"
[clahe]
preset = "strong"
tile_length = 16
blend_factor = 0.5
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let flags = ParamOverrides {
            blend_factor: Some(0.25),
            ..Default::default()
        };
        let (name, params) = config.resolve(&flags).unwrap();
        assert_eq!(name, "strong");
        assert_eq!(params.tile_length, 16);
        assert_eq!(params.blend_factor, 0.25);
        assert_eq!(params.clip_factor, ClaheParams::strong().clip_factor);
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let flags = ParamOverrides {
            preset: Some("vivid".into()),
            ..Default::default()
        };
        let err = AppConfig::default().resolve(&flags).unwrap_err();
        assert!(err.contains("Unknown preset 'vivid'"));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = AppConfig::default();
        config.clahe.blend_factor = Some(1.5);
        assert!(config.validate().unwrap_err().contains("blend_factor"));

        let mut config = AppConfig::default();
        config.clahe.tile_length = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let config_path = dir.path().join(PROJECT_CONFIG_NAME);
        std::fs::write(&config_path, "[clahe]\ntile_length = 8\n").unwrap();

        assert_eq!(find_config_in_parents(&nested), Some(config_path.clone()));
        let config = load_file(&config_path).unwrap();
        assert_eq!(config.clahe.tile_length, Some(8));
    }
}
