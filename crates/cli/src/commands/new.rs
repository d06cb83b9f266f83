// `cowrite new`: create a document and select it.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};

use cowrite_core::document::Document;

use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Document name; `.md` is appended when missing.
    name: String,

    /// Initial content. Read from stdin when piped; empty otherwise.
    #[arg(long)]
    content: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDocument {
    pub id: String,
    pub name: String,
    pub path: String,
    pub bytes: usize,
    pub last_modified: DateTime<Utc>,
}

impl From<Document> for SavedDocument {
    fn from(document: Document) -> Self {
        Self {
            id: document.id.to_string(),
            bytes: document.content.len(),
            name: document.name,
            path: document.path,
            last_modified: document.last_modified,
        }
    }
}

pub fn run(args: NewArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let content = super::read_content(args.content)?.unwrap_or_default();
    let result = super::block_on(call_new(format, args.name, content))?;
    super::finish(format, result, format_human)
}

async fn call_new(format: OutputFormat, name: String, content: String) -> anyhow::Result<SavedDocument> {
    let workspace = Workspace::restored(format).await?;
    let document = workspace
        .manager
        .create_document_with_content(&name, &content)
        .await
        .with_context(|| format!("failed to create `{name}`"))?;
    Ok(document.into())
}

fn format_human(result: &SavedDocument) -> String {
    format!("Created {} ({} bytes)", result.path, result.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowrite_common::types::DocumentId;

    #[test]
    fn saved_document_from_remote_uses_numeric_id() {
        let document = Document {
            id: DocumentId::Remote(12),
            name: "Todo.md".into(),
            path: "Todo.md".into(),
            content: "- [ ] ship".into(),
            last_modified: Utc::now(),
            handle: None,
        };
        let saved = SavedDocument::from(document);
        assert_eq!(saved.id, "12");
        assert_eq!(saved.bytes, 10);
        assert_eq!(format_human(&saved), "Created Todo.md (10 bytes)");
    }
}
