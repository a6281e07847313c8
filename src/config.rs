//! Configuration loading for closure-indent
//!
//! Loads `.closure-indent.toml` (or `closure-indent.toml`) from the nearest enclosing
//! directory. Command line flags take precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::correction::DEFAULT_MAX_PASSES;
use crate::error::ConfigError;
use crate::models::Severity;

pub const CONFIG_FILE_NAMES: &[&str] = &[".closure-indent.toml", "closure-indent.toml"];

const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".build",
    "Pods",
    "Carthage",
    "DerivedData",
    "node_modules",
];

/// Contents of a config file
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Severity of reported violations
    pub severity: Option<Severity>,

    /// Path fragments to skip while collecting files
    #[serde(default)]
    pub exclude: Vec<String>,

    /// File extensions to lint, without the dot
    pub extensions: Option<Vec<String>>,

    /// Cap on detect-correct passes per file
    pub max_passes: Option<usize>,

    /// Structure command; the file path is appended as the last argument
    pub structure_command: Option<Vec<String>>,

    /// JSON Lines run log
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub severity: Option<Severity>,
    pub exclude: Vec<String>,
    pub max_passes: Option<usize>,
    pub structure_command: Option<Vec<String>>,
    pub log_file: Option<PathBuf>,
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub severity: Severity,
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    pub max_passes: usize,
    pub structure_command: Option<Vec<String>>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            severity: Severity::default(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            extensions: vec!["swift".to_string()],
            max_passes: DEFAULT_MAX_PASSES,
            structure_command: None,
            log_file: None,
        }
    }
}

/// Find a config file starting from a path and walking up
pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let mut current = if start_path.is_file() {
        start_path.parent()?
    } else {
        start_path
    };

    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        current = current.parent()?;
    }
}

/// Load the explicit config file, or the nearest one above `start_dir`.
///
/// A missing explicit file is an error; finding nothing while searching is not.
pub fn load_config(explicit: Option<&Path>, start_dir: &Path) -> Result<Option<Config>, ConfigError> {
    let config_path = match explicit {
        Some(p) if p.is_file() => p.to_path_buf(),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => match find_config_file(start_dir) {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    log::debug!("loading config from {}", config_path.display());
    parse_config_file(&config_path).map(Some)
}

fn parse_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    // a relative log file is relative to the config file
    if let (Some(log_file), Some(dir)) = (config.log_file.as_mut(), path.parent()) {
        if log_file.is_relative() {
            *log_file = dir.join(&*log_file);
        }
    }

    Ok(config)
}

/// Merge command line values with config file settings.
/// CLI values take precedence; default excludes are always appended.
pub fn merge_config(config: Option<&Config>, cli: &Overrides) -> Result<Settings, ConfigError> {
    let defaults = Settings::default();
    let file = config.cloned().unwrap_or_default();

    let mut exclude = file.exclude;
    exclude.extend(cli.exclude.iter().cloned());
    for default in defaults.exclude {
        if !exclude.contains(&default) {
            exclude.push(default);
        }
    }

    let extensions: Vec<String> = file
        .extensions
        .unwrap_or(defaults.extensions)
        .iter()
        .map(|e| e.trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect();
    if extensions.is_empty() {
        return Err(ConfigError::Invalid {
            key: "extensions",
            message: "at least one extension is required".to_string(),
        });
    }

    let max_passes = cli.max_passes.or(file.max_passes).unwrap_or(defaults.max_passes);
    if max_passes == 0 {
        return Err(ConfigError::Invalid {
            key: "max_passes",
            message: "must be at least 1".to_string(),
        });
    }

    let structure_command = cli.structure_command.clone().or(file.structure_command);
    if structure_command.as_ref().is_some_and(|argv| argv.is_empty()) {
        return Err(ConfigError::Invalid {
            key: "structure_command",
            message: "command must not be empty".to_string(),
        });
    }

    Ok(Settings {
        severity: cli.severity.or(file.severity).unwrap_or(defaults.severity),
        exclude,
        extensions,
        max_passes,
        structure_command,
        log_file: cli.log_file.clone().or(file.log_file),
    })
}
