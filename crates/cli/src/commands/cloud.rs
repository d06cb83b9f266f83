// `cowrite cloud`: use the cloud document store as the workspace.

use anyhow::Context;
use clap::Args;

use cowrite_common::types::WorkspaceKind;

use crate::output::OutputFormat;
use crate::workspace::{format_summary, load_config, Workspace, WorkspaceSummary};

#[derive(Debug, Args)]
pub struct CloudArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(args: CloudArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::block_on(call_cloud())?;
    super::finish(format, result, format_summary)
}

async fn call_cloud() -> anyhow::Result<WorkspaceSummary> {
    let workspace = Workspace::from_config(load_config()?)?;
    workspace
        .manager
        .choose_workspace(WorkspaceKind::Cloud)
        .await
        .context("failed to open the cloud workspace")?;
    Ok(workspace.summary().await)
}
