//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.zorkbridge/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Game version id preselected at startup.
    pub default_version: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory holding one subdirectory per game version.
    pub games_dir: Option<String>,
    /// The `mdli` binary of the confusion interpreter.
    pub interpreter: Option<String>,
    /// Where save snapshot collections are written.
    pub saves_dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_VERSION: &str = "mdlzork_810722";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub default_version: String,
    pub games_dir: PathBuf,
    pub interpreter_path: PathBuf,
    pub saves_dir: PathBuf,
    /// `~/.zorkbridge`. Export files and the import drop point live here.
    pub data_dir: PathBuf,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.zorkbridge`, falling back to the current directory when the
/// home directory cannot be determined.
pub fn data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".zorkbridge"),
        None => {
            warn!("Could not determine home directory, using ./.zorkbridge");
            PathBuf::from(".zorkbridge")
        }
    }
}

/// Returns the path to `~/.zorkbridge/config.toml`.
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Load config from `~/.zorkbridge/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and returns
/// `BridgeConfig::default()`. If it exists but is malformed, returns
/// `ConfigError::Parse`.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    let path = config_path();

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(BridgeConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: BridgeConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# zorkbridge Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_version = "mdlzork_810722"   # see `zorkbridge --list` for ids

# [paths]
# games_dir = "~/.zorkbridge/games"    # one subdirectory per game version
# interpreter = "~/.zorkbridge/games/confusion-mdl/mdli"
# saves_dir = "~/.zorkbridge/saves"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Expand a leading `~/` against the home directory.
fn expand_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

/// Resolve the final config by collapsing: defaults → config file → env
/// vars → CLI. `cli_version` and `cli_games_dir` come from CLI flags
/// (None = not specified).
pub fn resolve(
    config: &BridgeConfig,
    cli_version: Option<&str>,
    cli_games_dir: Option<&str>,
) -> ResolvedConfig {
    let data = data_dir();

    // Version: CLI → env → config → default
    let default_version = cli_version
        .map(|s| s.to_string())
        .or_else(|| std::env::var("ZORKBRIDGE_VERSION").ok())
        .or_else(|| config.general.default_version.clone())
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());

    // Games dir: CLI → env → config → default
    let games_dir = cli_games_dir
        .map(|s| s.to_string())
        .or_else(|| std::env::var("ZORKBRIDGE_GAMES_DIR").ok())
        .or_else(|| config.paths.games_dir.clone())
        .map(|raw| expand_path(&raw))
        .unwrap_or_else(|| data.join("games"));

    // Interpreter: env → config → default (inside the games dir)
    let interpreter_path = std::env::var("ZORKBRIDGE_INTERPRETER")
        .ok()
        .or_else(|| config.paths.interpreter.clone())
        .map(|raw| expand_path(&raw))
        .unwrap_or_else(|| games_dir.join("confusion-mdl").join("mdli"));

    // Saves dir: env → config → default
    let saves_dir = std::env::var("ZORKBRIDGE_SAVES_DIR")
        .ok()
        .or_else(|| config.paths.saves_dir.clone())
        .map(|raw| expand_path(&raw))
        .unwrap_or_else(|| data.join("saves"));

    ResolvedConfig {
        default_version,
        games_dir,
        interpreter_path,
        saves_dir,
        data_dir: data,
    }
}
