//! Configuration loading and data file resolution
//!
//! Bootstrap settings come from an optional TOML file. A missing file is not
//! an error: every field has a compiled default.
//!
//! Data file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `SLG_DATA` environment variable
//! 3. `data_path` in the TOML config file
//! 4. Compiled default `game_data.json` (fallback)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::resolve::DEFAULT_FUZZY_CUTOFF;

/// Environment variable overriding the dataset path
pub const DATA_PATH_ENV: &str = "SLG_DATA";
/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SLG_CONFIG";
/// Dataset file used when nothing else is configured
pub const DEFAULT_DATA_FILE: &str = "game_data.json";

/// Bootstrap configuration loaded from `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Normalized dataset (songs, artists, lives)
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Reranker index mappings (`mappings.json`), optional
    #[serde(default)]
    pub mappings_path: Option<PathBuf>,

    /// HTTP port for slg-web
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub game: GameSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Gameplay tuning shared by the front-ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Number of entropy suggestions to show
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Turn cap for automated agents
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Similarity cutoff for fuzzy name matching (0.0-1.0)
    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f64,
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_max_turns() -> usize {
    20
}

fn default_fuzzy_cutoff() -> f64 {
    DEFAULT_FUZZY_CUTOFF
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_turns: default_max_turns(),
            fuzzy_cutoff: default_fuzzy_cutoff(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            mappings_path: None,
            port: default_port(),
            logging: LoggingConfig::default(),
            game: GameSettings::default(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(text: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        if !(0.0..=1.0).contains(&config.game.fuzzy_cutoff) {
            return Err(Error::Config(format!(
                "fuzzy_cutoff must be within 0.0-1.0, got {}",
                config.game.fuzzy_cutoff
            )));
        }
        Ok(config)
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
        let config = Self::parse(&text)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Load the explicit file if given, else the discovered one, else defaults
    ///
    /// An explicit path that cannot be loaded is an error. A discovered file
    /// that fails to parse is logged and replaced by defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match config_file_path() {
            Some(path) => match Self::load(&path) {
                Ok(config) => Ok(config),
                Err(e) => {
                    warn!("Ignoring config file: {}", e);
                    Ok(Self::default())
                }
            },
            None => {
                info!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Locate the config file for the platform
///
/// `SLG_CONFIG` wins; otherwise the user config dir (`slg/config.toml`),
/// then `/etc/slg/config.toml` on Linux. Only existing files are returned.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("slg").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/slg/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Resolve the dataset path in priority order (see module docs)
pub fn resolve_data_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.data_path {
        return path.clone();
    }

    // Priority 4: Compiled default
    PathBuf::from(DEFAULT_DATA_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 5780);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.game.top_k, 5);
        assert_eq!(config.game.max_turns, 20);
        assert_eq!(config.game.fuzzy_cutoff, 0.6);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = TomlConfig::parse(
            r#"
            data_path = "/srv/slg/game_data.json"

            [game]
            top_k = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.data_path, Some(PathBuf::from("/srv/slg/game_data.json")));
        assert_eq!(config.game.top_k, 10);
        assert_eq!(config.game.max_turns, 20);
        assert_eq!(config.port, 5780);
    }

    #[test]
    fn test_parse_empty_file_is_default() {
        assert_eq!(TomlConfig::parse("").unwrap(), TomlConfig::default());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(TomlConfig::parse("port = \"high\""), Err(Error::Config(_))));
        assert!(matches!(
            TomlConfig::parse("[game]\nfuzzy_cutoff = 1.5"),
            Err(Error::Config(_))
        ));
    }
}
