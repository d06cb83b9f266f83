// `cowrite read`: select a document and print its content.

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use cowrite_core::workspace::SaveStatus;

use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Document id, path, or name.
    doc: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResult {
    pub id: String,
    pub name: String,
    pub path: String,
    pub content: String,
}

pub fn run(args: ReadArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::block_on(call_read(format, args.doc))?;
    super::finish(format, result, format_human)
}

async fn call_read(format: OutputFormat, query: String) -> anyhow::Result<ReadResult> {
    let workspace = Workspace::restored(format).await?;
    let document = workspace.resolve(&query).await?;
    let manager = &workspace.manager;

    manager
        .select_document(Some(&document.id))
        .await
        .with_context(|| format!("failed to select `{}`", document.name))?;
    manager.content_ready().await;

    let current = manager.current_document().await.context("selection was cleared while loading")?;
    if let SaveStatus::Error(error) = manager.status() {
        // A failed lazy fetch leaves the content empty.
        if current.content.is_empty() {
            let message = format!("failed to load `{}`", current.name);
            return Err(anyhow::Error::new(error).context(message));
        }
    }

    Ok(ReadResult {
        id: current.id.to_string(),
        name: current.name,
        path: current.path,
        content: current.content,
    })
}

fn format_human(result: &ReadResult) -> String {
    result.content.trim_end_matches('\n').to_string()
}
