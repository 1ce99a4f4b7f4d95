//! The `ls-tree` command.

use clap::Args;
use serde::Serialize;

use crate::cli::{CommandContext, OutputSink, RepoArgs, Result};
use crate::repository::TreeEntry;

/// Arguments for the ls-tree command.
#[derive(Args, Debug)]
pub struct LsTreeArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Tree or commit to list.
    pub tree: String,

    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Debug, Serialize)]
struct LsTreeEntry {
    mode: String,
    kind: String,
    oid: String,
    name: String,
}

impl From<&TreeEntry> for LsTreeEntry {
    fn from(entry: &TreeEntry) -> Self {
        Self {
            mode: entry.mode.to_string(),
            kind: entry.kind().as_str().to_string(),
            oid: entry.oid.clone(),
            name: entry.name.clone(),
        }
    }
}

impl LsTreeArgs {
    pub async fn run(self, ctx: &CommandContext) -> Result<()> {
        let repo = ctx.open_repo(&self.repo)?;
        let tree_id = repo.peel_to_tree(&self.tree).await?;
        let tree = repo.read_tree(&tree_id).await?;

        if ctx.json {
            let entries: Vec<LsTreeEntry> = tree.entries().iter().map(LsTreeEntry::from).collect();
            self.output.write_json(&entries).await?;
        } else {
            let lines: Vec<String> = tree.entries().iter().map(format_entry).collect();
            self.output.write_str(&lines.join("\n")).await?;
        }
        Ok(())
    }
}

/// Format an entry the way `git ls-tree` does.
fn format_entry(entry: &TreeEntry) -> String {
    format!(
        "{} {} {}\t{}",
        entry.mode,
        entry.kind().as_str(),
        entry.oid,
        entry.name
    )
}
