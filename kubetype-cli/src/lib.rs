//! Command-line front ends for `kubetype-gen`.
//!
//! The `kubetype-gen` binary runs either pipeline over files on disk and
//! writes the resulting units below an output directory. The
//! `protoc-gen-deepcopy` binary speaks the `protoc` plugin protocol on
//! stdin/stdout. Both share [`config::Settings`] and [`logging::init`].

pub mod cli;
pub mod config;
pub mod error;
mod fs;
pub mod logging;
pub mod output;
pub mod plugin;
pub mod sources;

use std::collections::BTreeSet;

use camino::Utf8PathBuf;
use kubetype_gen::{GenerationReport, generate_deepcopy, generate_types};
use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};

use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::OutputSummary;
use crate::sources::{Boundary, collect_sources};

/// Runs the pipeline selected by `cli` and writes or verifies its output.
///
/// Unreadable or rejected modules and candidates are logged; they do not
/// fail the run.
///
/// # Errors
///
/// Returns an error when configuration cannot be loaded, inputs cannot be
/// read, output cannot be written, or `--verify-only` finds stale files.
pub fn run(cli: &Cli) -> Result<OutputSummary, CliError> {
    let settings = Settings::load(cli)?;
    let options = settings.synth_options()?;
    let report = match &cli.command {
        Command::Types(args) => {
            let collected = collect_sources(&args.sources, &Boundary::new(&args.boundary))?;
            let mut report =
                generate_types(&collected.sources, &settings.defaults.to_tag_config(), &options);
            report.diagnostics.extend(collected.unreadable);
            report
        }
        Command::Deepcopy(args) => {
            let files = load_descriptor_sets(&args.descriptor_sets)?;
            let wanted = (!args.files.is_empty()).then_some(args.files.as_slice());
            generate_deepcopy(&files, wanted, &options)
        }
    };
    log_report(&report);

    let units = output::dedupe(&report.units)?;
    if cli.output.should_verify_only {
        let stale = output::stale_units(&settings.out_dir, &units)?;
        if !stale.is_empty() {
            return Err(CliError::Stale(stale));
        }
        tracing::info!(files = units.len(), "generated files are up to date");
        return Ok(OutputSummary {
            written: Vec::new(),
            unchanged: units.iter().map(|unit| unit.path.clone()).collect(),
        });
    }
    let summary = output::write_units(&settings.out_dir, &units)?;
    tracing::info!(
        out_dir = %settings.out_dir,
        written = summary.written.len(),
        unchanged = summary.unchanged.len(),
        "generation complete"
    );
    Ok(summary)
}

/// Reads and merges encoded `FileDescriptorSet`s.
///
/// A file that appears in several sets is kept once, from the first set
/// naming it.
///
/// # Errors
///
/// Returns [`CliError::Io`] or [`CliError::Decode`] for unreadable sets.
pub fn load_descriptor_sets(paths: &[Utf8PathBuf]) -> Result<Vec<FileDescriptorProto>, CliError> {
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();
    for path in paths {
        let bytes = fs::read(path)?;
        let set = FileDescriptorSet::decode(bytes.as_slice()).map_err(|source| CliError::Decode {
            what: "FileDescriptorSet",
            path: path.clone(),
            source,
        })?;
        tracing::debug!(%path, files = set.file.len(), "loaded descriptor set");
        files.extend(
            set.file
                .into_iter()
                .filter(|file| seen.insert(file.name().to_owned())),
        );
    }
    Ok(files)
}

fn log_report(report: &GenerationReport) {
    for error in report.diagnostics.iter() {
        tracing::warn!(%error, "skipped during generation");
    }
    if report.candidates == 0 {
        tracing::warn!("no declarations carry the +kubetype-gen marker");
    }
}
