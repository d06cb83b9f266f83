// cowrite CLI entry point.

use std::process;

use clap::Parser;

mod commands;
mod exit_code;
mod output;
mod workspace;

use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "cowrite", about = "Markdown workspaces on a local folder or the cloud")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(cli.command) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            tracing::debug!(error = %format!("{error:#}"), "command failed");
            ExitCode::from_error(&error).into()
        }
    }
}
