//! CLI entrypoint for `kubetype-gen`.

use std::process::ExitCode;

use clap::Parser;
use kubetype_cli::cli::Cli;
use kubetype_cli::{logging, run};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "kubetype-gen failed");
            ExitCode::FAILURE
        }
    }
}
