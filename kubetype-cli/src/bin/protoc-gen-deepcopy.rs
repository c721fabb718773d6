//! `protoc` plugin emitting deep-copy methods for tagged messages.
//!
//! Reads a `CodeGeneratorRequest` from stdin and writes the response to
//! stdout. Logs go to stderr.

use std::io::{Read, Write};
use std::process::ExitCode;

use kubetype_cli::error::CliError;
use kubetype_cli::{logging, plugin};

fn main() -> ExitCode {
    logging::init(0);
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "protoc-gen-deepcopy failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), CliError> {
    let mut input = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut input)
        .map_err(|err| CliError::io("<stdin>", err))?;
    let output = plugin::handle(&input)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .map_err(|err| CliError::io("<stdout>", err))
}
