//! The `merge-tree` command.

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::cli::{CommandContext, OutputSink, RepoArgs, Result};
use crate::merge::{ConflictStyle, OnConflict, merge_tree};

/// Arguments for the merge-tree command.
#[derive(Args, Debug)]
pub struct MergeTreeArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Our tree or commit.
    pub ours: String,

    /// Merge base tree or commit.
    pub base: String,

    /// Their tree or commit.
    pub theirs: String,

    /// Label for our side in conflict markers.
    #[arg(long = "ours-name")]
    pub our_name: Option<String>,

    /// Label for the base in diff3 conflict markers.
    #[arg(long = "base-name")]
    pub base_name: Option<String>,

    /// Label for their side in conflict markers.
    #[arg(long = "theirs-name")]
    pub their_name: Option<String>,

    /// Compute the merged tree id without writing any object.
    #[arg(long)]
    pub dry_run: bool,

    /// What to do with conflicted files: fail, keep-markers, delete or abort.
    #[arg(long = "on-conflict", value_parser = parse_on_conflict)]
    pub on_conflict: Option<OnConflict>,

    /// Conflict marker style: merge or diff3.
    #[arg(long = "conflict-style", value_parser = parse_conflict_style)]
    pub conflict_style: Option<ConflictStyle>,

    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Debug, Serialize)]
struct MergeTreeOutput {
    tree: String,
    dry_run: bool,
}

impl MergeTreeArgs {
    pub async fn run(self, ctx: &CommandContext) -> Result<()> {
        let repo = ctx.open_repo(&self.repo)?;

        let (ours, base, theirs) = tokio::try_join!(
            repo.peel_to_tree(&self.ours),
            repo.peel_to_tree(&self.base),
            repo.peel_to_tree(&self.theirs),
        )?;
        debug!(%ours, %base, %theirs, "resolved input trees");

        let mut options = ctx.config.merge_options(ours, base, theirs);
        if let Some(name) = self.our_name {
            options.our_name = name;
        }
        if let Some(name) = self.base_name {
            options.base_name = name;
        }
        if let Some(name) = self.their_name {
            options.their_name = name;
        }
        if let Some(on_conflict) = self.on_conflict {
            options.conflict_resolver = on_conflict.resolver();
        }
        if let Some(style) = self.conflict_style {
            options.format = style;
        }
        options.dry_run = self.dry_run;

        let tree = merge_tree(repo, options).await?;

        if ctx.json {
            self.output
                .write_json(&MergeTreeOutput {
                    tree,
                    dry_run: self.dry_run,
                })
                .await?;
        } else {
            self.output.write_str(&tree).await?;
        }
        Ok(())
    }
}

fn parse_on_conflict(s: &str) -> std::result::Result<OnConflict, String> {
    OnConflict::parse(s).ok_or_else(|| {
        format!(
            "invalid value '{}': expected fail, keep-markers, delete or abort",
            s
        )
    })
}

fn parse_conflict_style(s: &str) -> std::result::Result<ConflictStyle, String> {
    ConflictStyle::parse(s)
        .ok_or_else(|| format!("invalid value '{}': expected merge or diff3", s))
}
