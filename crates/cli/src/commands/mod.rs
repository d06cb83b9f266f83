// CLI subcommand dispatch.

use std::future::Future;
use std::io::{self, IsTerminal, Read};

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;

use crate::output::{self, OutputFormat};

pub mod cloud;
pub mod ls;
pub mod new;
pub mod open;
pub mod read;
pub mod rm;
pub mod status;
pub mod switch;
pub mod write;

#[derive(Subcommand)]
pub enum Command {
    /// Use a local folder as the workspace
    Open(open::OpenArgs),
    /// Use the cloud document store as the workspace
    Cloud(cloud::CloudArgs),
    /// Leave the current workspace
    Switch(switch::SwitchArgs),
    /// List workspace documents
    Ls(ls::LsArgs),
    /// Select a document and print its content
    Read(read::ReadArgs),
    /// Create a document and select it
    New(new::NewArgs),
    /// Replace a document's content
    Write(write::WriteArgs),
    /// Delete a document
    Rm(rm::RmArgs),
    /// Show workspace and save state
    Status(status::StatusArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Open(args) => open::run(args),
        Command::Cloud(args) => cloud::run(args),
        Command::Switch(args) => switch::run(args),
        Command::Ls(args) => ls::run(args),
        Command::Read(args) => read::run(args),
        Command::New(args) => new::run(args),
        Command::Write(args) => write::run(args),
        Command::Rm(args) => rm::run(args),
        Command::Status(args) => status::run(args),
    }
}

/// Drive one command future on a fresh current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// Print a command result, or its mapped error, in the selected format.
pub(crate) fn finish<T, F>(format: OutputFormat, result: anyhow::Result<T>, human_fn: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match result {
        Ok(value) => {
            output::print_output(format, &value, human_fn)?;
            Ok(())
        }
        Err(e) => {
            output::print_anyhow_error(format, &e);
            Err(e)
        }
    }
}

/// Content from `--content`, or from stdin when it is piped. `None` when
/// neither was given.
pub(crate) fn read_content(content: Option<String>) -> anyhow::Result<Option<String>> {
    if content.is_some() {
        return Ok(content);
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf).context("failed to read content from stdin")?;
    Ok(Some(buf))
}
