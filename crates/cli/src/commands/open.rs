// `cowrite open`: use a local folder as the workspace.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use cowrite_common::types::WorkspaceKind;
use cowrite_core::local::PathPicker;

use crate::output::OutputFormat;
use crate::workspace::{format_summary, load_config, Workspace, WorkspaceSummary};

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Folder holding the markdown documents.
    path: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: OpenArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::block_on(call_open(args.path))?;
    super::finish(format, result, format_summary)
}

async fn call_open(path: PathBuf) -> anyhow::Result<WorkspaceSummary> {
    let workspace = Workspace::from_config(load_config()?)?;
    let manager = &workspace.manager;

    manager
        .choose_workspace(WorkspaceKind::Local)
        .await
        .context("failed to choose the local workspace")?;
    let granted = manager
        .grant_local_folder(&PathPicker::new(&path))
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    if !granted {
        anyhow::bail!("folder selection was cancelled");
    }

    Ok(workspace.summary().await)
}
