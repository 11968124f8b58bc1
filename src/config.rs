//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/modtree/modtree.toml`
//! 3. Explicit config file (`--config FILE`)
//! 4. Environment variables: `MODTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::GetMode;

/// Unified configuration for modtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Where fetched modules are stored (default: `<data dir>/modtree/modules`)
    pub storage_dir: PathBuf,
    /// Default get mode for `tree` and `validate`
    pub mode: GetMode,
    /// Load sibling modules in parallel
    pub parallel: bool,
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub storage_dir: Option<PathBuf>,
    pub mode: Option<GetMode>,
    pub parallel: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            mode: GetMode::Get,
            parallel: false,
        }
    }
}

fn default_storage_dir() -> PathBuf {
    ProjectDirs::from("", "", "modtree")
        .map(|dirs| dirs.data_dir().join("modules"))
        .unwrap_or_else(|| PathBuf::from("~/.modtree/modules"))
}

/// Get the XDG config directory for modtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "modtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("modtree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in `storage_dir`.
    fn expand_paths(&mut self) {
        let raw = self.storage_dir.to_string_lossy().into_owned();
        if let Ok(expanded) = shellexpand::full(&raw) {
            self.storage_dir = PathBuf::from(expanded.as_ref());
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            storage_dir: overlay
                .storage_dir
                .clone()
                .unwrap_or_else(|| self.storage_dir.clone()),
            mode: overlay.mode.unwrap_or(self.mode),
            parallel: overlay.parallel.unwrap_or(self.parallel),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("config: global {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = config_file {
            debug!("config: explicit {}", path.display());
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply MODTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("MODTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("storage_dir") {
            settings.storage_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("mode") {
            settings.mode = val.parse().map_err(|message| ApplicationError::Config {
                message: format!("MODTREE_MODE: {message}"),
            })?;
        }
        if let Ok(val) = config.get_bool("parallel") {
            settings.parallel = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# modtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/modtree/modtree.toml
#   Explicit: modtree --config FILE
#   Env:      MODTREE_* environment variables

# Where fetched modules are stored, one directory per source
# storage_dir = "~/.local/share/modtree/modules"

# Default get mode for `tree` and `validate`: none | get | update
# mode = "get"

# Load sibling modules in parallel
# parallel = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_mode_is_get() {
        let settings = Settings::default();
        assert_eq!(settings.mode, GetMode::Get);
        assert!(!settings.parallel);
        assert!(settings.storage_dir.ends_with("modules"));
    }

    #[test]
    fn given_tilde_in_storage_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            storage_dir: PathBuf::from("~/.modtree/modules"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.storage_dir.to_string_lossy();
        assert!(dir.starts_with(&home), "storage_dir should start with home: {dir}");
        assert!(!dir.contains('~'));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unset_fields_are_inherited() {
        let base = Settings {
            storage_dir: PathBuf::from("/base"),
            mode: GetMode::Get,
            parallel: true,
        };
        let overlay = RawSettings {
            mode: Some(GetMode::Update),
            ..RawSettings::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.storage_dir, PathBuf::from("/base"));
        assert_eq!(merged.mode, GetMode::Update);
        assert!(merged.parallel);
    }

    #[test]
    fn given_settings_when_to_toml_then_mode_is_lowercase() {
        let settings = Settings {
            storage_dir: PathBuf::from("/s"),
            mode: GetMode::None,
            parallel: false,
        };
        let toml = settings.to_toml().expect("serialize");
        assert!(toml.contains("mode = \"none\""), "{toml}");
        assert!(toml.contains("storage_dir = \"/s\""), "{toml}");
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_empty_config() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.storage_dir.is_none());
        assert!(raw.mode.is_none());
    }
}
