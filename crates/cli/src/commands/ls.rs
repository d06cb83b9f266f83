// `cowrite ls`: list workspace documents.

use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};

use cowrite_common::types::WorkspaceKind;

use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsResult {
    pub kind: WorkspaceKind,
    #[serde(default)]
    pub documents: Vec<DocEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub selected: bool,
}

pub fn run(args: LsArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::block_on(call_ls(format))?;
    super::finish(format, result, format_human)
}

async fn call_ls(format: OutputFormat) -> anyhow::Result<LsResult> {
    let workspace = Workspace::restored(format).await?;
    let kind = workspace.ready_kind().await?;
    let manager = &workspace.manager;

    let selected = manager.current_document().await.map(|d| d.id);
    let documents = manager
        .documents()
        .await
        .into_iter()
        .map(|d| DocEntry {
            selected: selected.as_ref() == Some(&d.id),
            id: d.id.to_string(),
            name: d.name,
            path: d.path,
            last_modified: d.last_modified,
        })
        .collect();

    Ok(LsResult { kind, documents })
}

fn format_human(result: &LsResult) -> String {
    if result.documents.is_empty() {
        return format!("No documents in the {} workspace.", result.kind);
    }

    let mut lines = Vec::new();
    lines.push(format!("{} document(s)", result.documents.len()));
    for d in &result.documents {
        let marker = if d.selected { "*" } else { " " };
        let modified = d.last_modified.format("%Y-%m-%d %H:%M");
        if result.kind == WorkspaceKind::Cloud {
            lines.push(format!("{marker} {:>6}  {}  {modified}", d.id, d.name));
        } else {
            lines.push(format!("{marker} {}  {modified}", d.path));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output;

    fn entry(id: &str, path: &str, selected: bool) -> DocEntry {
        DocEntry {
            id: id.into(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            path: path.into(),
            last_modified: "2024-03-02T17:30:00Z".parse().unwrap(),
            selected,
        }
    }

    #[test]
    fn human_format_marks_selection() {
        let result = LsResult {
            kind: WorkspaceKind::Local,
            documents: vec![entry("docs/guide.md", "docs/guide.md", true), entry("todo.md", "todo.md", false)],
        };
        let output = format_human(&result);
        assert!(output.contains("2 document(s)"));
        assert!(output.contains("* docs/guide.md  2024-03-02 17:30"));
        assert!(output.contains("  todo.md"));
    }

    #[test]
    fn human_format_shows_cloud_ids() {
        let result = LsResult { kind: WorkspaceKind::Cloud, documents: vec![entry("7", "Notes.md", false)] };
        let output = format_human(&result);
        assert!(output.contains("     7  Notes.md"));
    }

    #[test]
    fn human_format_empty() {
        let result = LsResult { kind: WorkspaceKind::Cloud, documents: vec![] };
        assert_eq!(format_human(&result), "No documents in the cloud workspace.");
    }

    #[test]
    fn json_format_roundtrips() {
        let result = LsResult { kind: WorkspaceKind::Local, documents: vec![entry("a.md", "a.md", true)] };
        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &result, format_human).unwrap();
        let parsed: LsResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.kind, WorkspaceKind::Local);
        assert!(parsed.documents[0].selected);
    }
}
