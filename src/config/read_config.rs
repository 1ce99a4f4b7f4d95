//! Configuration file reading and parsing.
//!
//! This module handles locating, reading, and parsing INI-format configuration files,
//! with support for layered overrides.

use std::env;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use thiserror::Error;

use super::{ByteSize, CacheConfig, Config, Limit, LogConfig, MergeConfig};
use crate::caches::DEFAULT_OBJECT_CACHE_SIZE;
use crate::merge::{ConflictStyle, DEFAULT_MARKER_SIZE, OnConflict, UnreadableContent};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_OUR_NAME: &str = "ours";
const DEFAULT_BASE_NAME: &str = "base";
const DEFAULT_THEIR_NAME: &str = "theirs";
const DEFAULT_LOG_LEVEL: &str = "warn";

const ENV_CONFIG_FILE: &str = "TMERGE_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".tmergeconfig";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid byte size '{value}': {message}")]
    InvalidByteSize { value: String, message: String },

    #[error("invalid integer '{value}': {source}")]
    InvalidInteger {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid value '{value}' for '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Specifies how to locate and layer configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit config file path from CLI. If specified and doesn't exist, error.
    /// If None, fall back to TMERGE_CONFIG_FILE env var, then ~/.tmergeconfig.
    pub config_file: Option<PathBuf>,

    /// Additional override config file (layered on top of base config).
    pub override_file: Option<PathBuf>,

    /// Individual key=value overrides (applied last).
    /// Keys use dot-notation: "merge.our-name", "cache.max-size"
    pub overrides: Vec<(String, String)>,
}

/// The configuration that was read, plus any non-fatal warnings.
#[derive(Debug, Clone)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

// =============================================================================
// ByteSize Parsing
// =============================================================================

const BYTE_UNITS: [(&str, u64); 4] = [
    ("G", 1 << 30),
    ("M", 1 << 20),
    ("K", 1 << 10),
    ("", 1),
];

impl ByteSize {
    /// Parse sizes like "1024", "512K", "64MB" or "1gb". Units are powers of
    /// 1024 and an optional trailing "B" is accepted.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |message: String| ConfigError::InvalidByteSize {
            value: s.to_string(),
            message,
        };

        let upper = s.trim().to_ascii_uppercase();
        let body = upper.strip_suffix('B').unwrap_or(&upper);
        let digits_end = body
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(body.len());
        let (digits, unit) = body.split_at(digits_end);

        if digits.is_empty() {
            return Err(invalid("expected a number".to_string()));
        }
        let multiplier = BYTE_UNITS
            .iter()
            .find(|(name, _)| *name == unit.trim())
            .map(|(_, m)| *m)
            .ok_or_else(|| invalid(format!("unknown unit '{}'", unit.trim())))?;
        let count: u64 = digits
            .parse()
            .map_err(|e| invalid(format!("bad number: {}", e)))?;

        Ok(ByteSize(count.saturating_mul(multiplier)))
    }
}

// =============================================================================
// Value Parsing
// =============================================================================

fn parse_limit_value_bytesize(value: &str) -> Result<Limit<ByteSize>> {
    if value.trim().eq_ignore_ascii_case("none") {
        Ok(Limit::Disabled)
    } else {
        Ok(Limit::Value(ByteSize::parse(value)?))
    }
}

fn parse_usize_value(value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidInteger {
            value: value.to_string(),
            source: e,
        })
}

fn parse_conflict_style(key: &str, value: &str) -> Result<ConflictStyle> {
    ConflictStyle::parse(value.trim()).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "merge or diff3".to_string(),
    })
}

fn parse_unreadable_content(key: &str, value: &str) -> Result<UnreadableContent> {
    UnreadableContent::parse(value.trim()).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "empty or fail".to_string(),
    })
}

fn parse_on_conflict(key: &str, value: &str) -> Result<OnConflict> {
    OnConflict::parse(value.trim()).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "fail, keep-markers, delete or abort".to_string(),
    })
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// The base config file chosen for a read.
#[derive(Debug, Default)]
pub struct ResolvedConfigFile {
    pub path: Option<PathBuf>,
    /// Set when `TMERGE_CONFIG_FILE` names a file that does not exist.
    pub warning: Option<String>,
}

/// Pick the base config file.
///
/// An explicit path must exist. Otherwise `TMERGE_CONFIG_FILE` is used, then
/// `~/.tmergeconfig`; a missing file at either is not an error.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    if let Some(path) = &source.config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
        return Ok(ResolvedConfigFile {
            path: Some(path.clone()),
            warning: None,
        });
    }

    if let Some(env_path) = env::var_os(ENV_CONFIG_FILE) {
        let path = PathBuf::from(env_path);
        return Ok(if path.exists() {
            ResolvedConfigFile {
                path: Some(path),
                warning: None,
            }
        } else {
            ResolvedConfigFile {
                path: None,
                warning: Some(format!(
                    "{} points at a missing file, using defaults: {}",
                    ENV_CONFIG_FILE,
                    path.display()
                )),
            }
        });
    }

    let path = env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILENAME))
        .filter(|path| path.exists());
    Ok(ResolvedConfigFile {
        path,
        warning: None,
    })
}

// =============================================================================
// Default Config
// =============================================================================

/// Create a Config with all default values.
fn default_config() -> Config {
    Config {
        merge: MergeConfig {
            our_name: DEFAULT_OUR_NAME.to_string(),
            base_name: DEFAULT_BASE_NAME.to_string(),
            their_name: DEFAULT_THEIR_NAME.to_string(),
            conflict_style: ConflictStyle::default(),
            marker_size: DEFAULT_MARKER_SIZE,
            unreadable_content: UnreadableContent::default(),
            on_conflict: OnConflict::default(),
        },
        cache: CacheConfig {
            max_size: Limit::Value(ByteSize(DEFAULT_OBJECT_CACHE_SIZE as u64)),
        },
        log: LogConfig {
            level: DEFAULT_LOG_LEVEL.to_string(),
        },
    }
}

// =============================================================================
// INI Parsing
// =============================================================================

/// Apply an INI file's contents to a Config, layering on top of existing values.
///
/// Every key that appears in the file goes through the same path as a
/// `--config section.key=value` override.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    for section in ["merge", "cache", "log"] {
        let Some(keys) = ini.get_map_ref().get(section) else {
            continue;
        };
        for (key, value) in keys {
            if let Some(value) = value {
                apply_override(config, &format!("{}.{}", section, key), value)?;
            }
        }
    }
    Ok(())
}

/// Load and parse an INI file.
fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

/// Apply a single key=value override to the config.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.splitn(2, '.').collect();

    match parts.as_slice() {
        // merge.our-name, merge.conflict-style, ...
        ["merge", param] => apply_merge_override(config, param, value),

        // cache.max-size
        ["cache", param] => apply_cache_override(config, param, value),

        // log.level
        ["log", param] => apply_log_override(config, param, value),

        _ => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

fn apply_merge_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    let key = format!("merge.{}", param);
    let merge = &mut config.merge;
    match normalize_param(param).as_str() {
        "our-name" => merge.our_name = value.to_string(),
        "base-name" => merge.base_name = value.to_string(),
        "their-name" => merge.their_name = value.to_string(),
        "conflict-style" => merge.conflict_style = parse_conflict_style(&key, value)?,
        "marker-size" => merge.marker_size = parse_usize_value(value)?,
        "unreadable-content" => {
            merge.unreadable_content = parse_unreadable_content(&key, value)?
        }
        "on-conflict" => merge.on_conflict = parse_on_conflict(&key, value)?,
        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key,
                message: "unknown parameter".to_string(),
            });
        }
    }
    Ok(())
}

fn apply_cache_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    match normalize_param(param).as_str() {
        "max-size" => {
            config.cache.max_size = parse_limit_value_bytesize(value)?;
            Ok(())
        }
        _ => Err(ConfigError::InvalidOverrideKey {
            key: format!("cache.{}", param),
            message: "unknown parameter".to_string(),
        }),
    }
}

fn apply_log_override(config: &mut Config, param: &str, value: &str) -> Result<()> {
    match param {
        "level" => {
            config.log.level = value.trim().to_string();
            Ok(())
        }
        _ => Err(ConfigError::InvalidOverrideKey {
            key: format!("log.{}", param),
            message: "unknown parameter".to_string(),
        }),
    }
}

/// Accept both `our-name` and `our_name`.
fn normalize_param(param: &str) -> String {
    param.to_ascii_lowercase().replace('_', "-")
}

// =============================================================================
// read_config
// =============================================================================

/// Read the application configuration.
///
/// Configuration is layered in this order:
/// 1. Built-in defaults
/// 2. Base config file (from CLI, env var, or ~/.tmergeconfig)
/// 3. Override config file (if specified)
/// 4. Individual overrides (applied last)
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();

    // Start with defaults
    let mut config = default_config();

    // Resolve and apply base config file
    let resolved = resolve_config_file(source)?;
    if let Some(warning) = resolved.warning {
        warnings.push(warning);
    }
    if let Some(ref path) = resolved.path {
        let ini = load_ini(path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    // Apply override config file if specified
    if let Some(ref override_path) = source.override_file {
        if !override_path.exists() {
            return Err(ConfigError::FileNotFound(override_path.clone()));
        }
        let ini = load_ini(override_path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    // Apply individual overrides
    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================
