//! Command-line interface for treemerge.

pub mod args;
mod command_context;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::warn;

use crate::config::{ConfigHelper, read_config};
use crate::logging::init_logging;

pub use args::{GlobalArgs, OutputSink, RepoArgs};
pub use command_context::{CommandContext, CommandContextError, discover_git_dir};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] crate::config::ConfigError),

    /// Logging setup error.
    #[error("{0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Command context error.
    #[error("{0}")]
    Context(#[from] CommandContextError),

    /// Repository error.
    #[error("{0}")]
    Repo(#[from] crate::repo::RepoError),

    /// Merge error.
    #[error("{0}")]
    Merge(#[from] crate::merge::MergeError),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// tmerge - Three-way merge of git trees.
#[derive(Parser, Debug)]
#[command(name = "tmerge", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge three trees and print the id of the merged tree.
    #[command(name = "merge-tree")]
    MergeTree(commands::merge_tree::MergeTreeArgs),

    /// List the entries of a tree.
    #[command(name = "ls-tree")]
    LsTree(commands::ls_tree::LsTreeArgs),
}

impl Command {
    /// Run the command.
    pub async fn run(self, ctx: &CommandContext) -> Result<()> {
        match self {
            Command::MergeTree(args) => args.run(ctx).await,
            Command::LsTree(args) => args.run(ctx).await,
        }
    }
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Read configuration and build the command context.
    ///
    /// Returns the warnings produced while reading configuration alongside
    /// the context, since logging is not installed yet at this point.
    pub fn context(&self) -> Result<(CommandContext, Vec<String>)> {
        let result = read_config(&self.global.to_config_source())?;
        let ctx = CommandContext::new(ConfigHelper::new(result.config), self.global.json);
        Ok((ctx, result.warnings))
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let (ctx, warnings) = self.context()?;
        init_logging(&ctx.config.config().log)?;
        for warning in warnings {
            warn!("{}", warning);
        }

        self.command.run(&ctx).await
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.run().await
}
