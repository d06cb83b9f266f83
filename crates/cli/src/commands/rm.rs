// `cowrite rm`: delete a document.

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Args)]
pub struct RmArgs {
    /// Document id, path, or name.
    doc: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmResult {
    pub id: String,
    pub path: String,
}

pub fn run(args: RmArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::block_on(call_rm(format, args.doc))?;
    super::finish(format, result, format_human)
}

async fn call_rm(format: OutputFormat, query: String) -> anyhow::Result<RmResult> {
    let workspace = Workspace::restored(format).await?;
    let document = workspace.resolve(&query).await?;
    workspace
        .manager
        .delete_document(&document.id)
        .await
        .with_context(|| format!("failed to delete `{}`", document.path))?;
    Ok(RmResult { id: document.id.to_string(), path: document.path })
}

fn format_human(result: &RmResult) -> String {
    format!("Deleted {}", result.path)
}
