//! Command-line argument definitions and helpers.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::ConfigSource;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during argument processing.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// I/O error reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for argument operations.
pub type Result<T> = std::result::Result<T, ArgsError>;

// =============================================================================
// Global Arguments
// =============================================================================

/// Global arguments that apply to all commands.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to the main configuration file.
    #[arg(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// Path to the configuration overrides file.
    #[arg(long = "config-file-overrides", global = true)]
    pub config_file_overrides: Option<PathBuf>,

    /// Configuration overrides in the form name=value.
    #[arg(long = "config", value_parser = parse_config_override, global = true)]
    pub config_overrides: Vec<(String, String)>,

    /// Format output as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

impl GlobalArgs {
    /// Convert to a ConfigSource for reading configuration.
    pub fn to_config_source(&self) -> ConfigSource {
        ConfigSource {
            config_file: self.config_file.clone(),
            override_file: self.config_file_overrides.clone(),
            overrides: self.config_overrides.clone(),
        }
    }
}

/// Parse a config override from "name=value" format.
fn parse_config_override(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid config override '{}': expected name=value", s))?;
    Ok((name.to_string(), value.to_string()))
}

// =============================================================================
// Repository Arguments
// =============================================================================

/// Where to find the repository.
///
/// With neither option the git directory is discovered by searching upwards
/// from the current directory.
#[derive(Args, Debug, Default, Clone)]
pub struct RepoArgs {
    /// Working directory of the repository; its git directory is `DIR/.git`.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Git directory of the repository.
    #[arg(long = "git-dir")]
    pub git_dir: Option<PathBuf>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Helper for commands that write output to a file or stdout.
#[derive(Args, Debug, Default)]
pub struct OutputSink {
    /// Write output to this file instead of stdout.
    #[arg(id = "output_file", short = 'o', long = "output-file")]
    pub file: Option<PathBuf>,
}

impl OutputSink {
    /// Write a string value to the output, followed by a newline.
    pub async fn write_str(&self, value: &str) -> Result<()> {
        match &self.file {
            Some(path) => {
                tokio::fs::write(path, format!("{}\n", value)).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(value.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }

    /// Write a value to the output as pretty-printed JSON.
    pub async fn write_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        let output = serde_json::to_string_pretty(value)?;
        self.write_str(&output).await
    }
}
