// `cowrite switch`: leave the current workspace.
//
// Forgets the recorded workspace kind. A recorded local folder and each
// backend's last selection are kept, so a later start still restores the
// local folder when one was granted.

use clap::Args;
use serde::{Deserialize, Serialize};

use cowrite_common::types::WorkspaceKind;

use crate::output::OutputFormat;
use crate::workspace::Workspace;

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchResult {
    pub previous: Option<WorkspaceKind>,
}

pub fn run(args: SwitchArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = super::block_on(call_switch(format))?;
    super::finish(format, result, format_human)
}

async fn call_switch(format: OutputFormat) -> anyhow::Result<SwitchResult> {
    let workspace = Workspace::restored(format).await?;
    let previous = workspace.manager.phase().await.kind();
    workspace.manager.switch_workspace().await;
    Ok(SwitchResult { previous })
}

fn format_human(result: &SwitchResult) -> String {
    match result.previous {
        Some(kind) => format!("Left the {kind} workspace."),
        None => "No workspace was open.".into(),
    }
}
