// `cowrite write`: replace a document's content.
//
// By default the write is immediate. `--debounce` routes it through the
// auto-save path instead and waits for the debounced save to land.

use anyhow::Context;
use clap::Args;

use cowrite_core::workspace::SaveStatus;

use super::new::SavedDocument;
use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Document id, path, or name.
    doc: String,

    /// New content. Read from stdin when omitted.
    #[arg(long)]
    content: Option<String>,

    /// Save through the debounced auto-save instead of immediately.
    #[arg(long)]
    debounce: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: WriteArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let content = super::read_content(args.content)?
        .context("no content given; pass --content or pipe it on stdin")?;
    let result = super::block_on(call_write(format, args.doc, content, args.debounce))?;
    super::finish(format, result, format_human)
}

async fn call_write(
    format: OutputFormat,
    query: String,
    content: String,
    debounce: bool,
) -> anyhow::Result<SavedDocument> {
    let workspace = Workspace::restored(format).await?;
    let document = workspace.resolve(&query).await?;
    let manager = &workspace.manager;

    manager
        .select_document(Some(&document.id))
        .await
        .with_context(|| format!("failed to select `{}`", document.name))?;
    manager.content_ready().await;

    if !debounce {
        let saved = manager
            .save_now(&content)
            .await
            .with_context(|| format!("failed to save `{}`", document.name))?;
        return Ok(saved.into());
    }

    let mut status = manager.subscribe();
    manager.update_content(&content).await.context("failed to record the edit")?;
    let settled = status
        .wait_for(|s| matches!(s, SaveStatus::Saved { .. } | SaveStatus::Error(_)))
        .await
        .context("workspace closed before the save finished")?
        .clone();
    if let SaveStatus::Error(error) = settled {
        let message = format!("failed to save `{}`", document.name);
        return Err(anyhow::Error::new(error).context(message));
    }

    let current = manager.current_document().await.context("selection was cleared while saving")?;
    Ok(current.into())
}

fn format_human(result: &SavedDocument) -> String {
    format!("Saved {} ({} bytes)", result.path, result.bytes)
}
