//! acuctl -- command-line client for the vulnerability scanner API.

use std::process::ExitCode;

use clap::Parser;

use acuctl_cli::cli::Cli;
use acuctl_cli::commands;
use acuctl_cli::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let writer = OutputWriter::new(cli.output);

    match commands::run(cli, &writer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
