// `cowrite status`: show workspace and save state.

use clap::Args;
use serde::Serialize;

use cowrite_core::config::global_config_path;
use cowrite_core::workspace::{SaveStatus, WorkspacePhase};

use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub phase: WorkspacePhase,
    pub workspace: Option<String>,
    pub documents: usize,
    pub selected: Option<String>,
    pub save: SaveStatus,
    pub cloud_configured: bool,
    pub config_path: Option<String>,
    pub session_db: Option<String>,
}

pub fn run(args: StatusArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::block_on(call_status(format))?;
    super::finish(format, result, format_human)
}

async fn call_status(format: OutputFormat) -> anyhow::Result<StatusResult> {
    let workspace = Workspace::restored(format).await?;
    let manager = &workspace.manager;

    Ok(StatusResult {
        phase: manager.phase().await,
        workspace: manager.workspace_name().await,
        documents: manager.documents().await.len(),
        selected: manager.current_document().await.map(|d| d.path),
        save: manager.status(),
        cloud_configured: workspace.config.cloud.base_url.is_some(),
        config_path: global_config_path().map(|p| p.display().to_string()),
        session_db: workspace.config.session_db_path().map(|p| p.display().to_string()),
    })
}

fn format_human(result: &StatusResult) -> String {
    let mut lines = Vec::new();
    match result.phase {
        WorkspacePhase::Unselected => lines.push("No workspace open.".to_string()),
        WorkspacePhase::TypeChosen(kind) => {
            lines.push(format!("{kind} workspace chosen; waiting for folder access."))
        }
        WorkspacePhase::Ready(kind) => {
            let name = result.workspace.as_deref().map(|n| format!(" {n}")).unwrap_or_default();
            lines.push(format!("{kind} workspace{name}: {} document(s)", result.documents));
        }
    }

    if let Some(selected) = &result.selected {
        lines.push(format!("  Selected: {selected}"));
    }
    match &result.save {
        SaveStatus::Idle => {}
        SaveStatus::Unsaved => lines.push("  Unsaved changes".into()),
        SaveStatus::Saving => lines.push("  Saving...".into()),
        SaveStatus::Saved { at } => lines.push(format!("  Saved at {}", at.format("%H:%M:%S"))),
        SaveStatus::Error(error) => lines.push(format!("  Error: {}", error.message)),
    }
    lines.push(format!(
        "  Cloud store: {}",
        if result.cloud_configured { "configured" } else { "not configured" }
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowrite_common::types::WorkspaceKind;
    use cowrite_core::error::{ErrorKind, ReportedError};

    fn sample(phase: WorkspacePhase, save: SaveStatus) -> StatusResult {
        StatusResult {
            phase,
            workspace: Some("notes".into()),
            documents: 2,
            selected: Some("todo.md".into()),
            save,
            cloud_configured: false,
            config_path: None,
            session_db: None,
        }
    }

    #[test]
    fn human_format_ready_workspace() {
        let output = format_human(&sample(WorkspacePhase::Ready(WorkspaceKind::Local), SaveStatus::Idle));
        assert!(output.contains("local workspace notes: 2 document(s)"));
        assert!(output.contains("Selected: todo.md"));
        assert!(output.contains("Cloud store: not configured"));
    }

    #[test]
    fn human_format_waiting_for_folder() {
        let output =
            format_human(&sample(WorkspacePhase::TypeChosen(WorkspaceKind::Local), SaveStatus::Idle));
        assert!(output.contains("waiting for folder access"));
    }

    #[test]
    fn human_format_shows_save_error() {
        let error = ReportedError::new(ErrorKind::PermissionDenied, "select the folder again");
        let output = format_human(&sample(
            WorkspacePhase::TypeChosen(WorkspaceKind::Local),
            SaveStatus::Error(error),
        ));
        assert!(output.contains("Error: select the folder again"));
    }

    #[test]
    fn json_format_tags_phase() {
        let result = sample(WorkspacePhase::Ready(WorkspaceKind::Cloud), SaveStatus::Unsaved);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["phase"]["phase"], "ready");
        assert_eq!(value["phase"]["kind"], "cloud");
        assert_eq!(value["documents"], 2);
    }
}
