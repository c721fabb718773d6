//! Command-line interface definitions for `kubetype-gen`.

use camino::Utf8PathBuf;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};

/// Parsed CLI arguments for `kubetype-gen`.
#[derive(Debug, Parser)]
#[command(name = "kubetype-gen")]
#[command(about = "Generate Kubernetes-style wrapper, list and deep-copy code")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to `kubetype-gen.toml` when present).
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<Utf8PathBuf>,
    /// Increase log verbosity (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Shared synthesis and output flags.
    #[command(flatten)]
    pub output: OutputArgs,
    /// Pipeline to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available pipelines.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate wrapper and list types from tagged Rust declarations.
    Types(TypesArgs),
    /// Generate deep-copy methods for tagged protobuf messages.
    Deepcopy(DeepcopyArgs),
}

/// Flags shared by both pipelines. Each one overrides configuration.
#[derive(Debug, Default, Clone, ClapArgs)]
pub struct OutputArgs {
    /// Directory generated files are written below.
    #[arg(long, global = true, value_name = "path")]
    pub out_dir: Option<Utf8PathBuf>,
    /// File prepended to every generated file.
    #[arg(long, global = true, value_name = "path")]
    pub boilerplate: Option<Utf8PathBuf>,
    /// Replace the generator name in the "Code generated by" line.
    #[arg(long, global = true, value_name = "name")]
    pub generated_by: Option<String>,
    /// Compare with files on disk instead of writing; fail when any differ.
    #[arg(long = "verify-only", global = true)]
    pub should_verify_only: bool,
}

/// Arguments for the `types` pipeline.
#[derive(Debug, Clone, ClapArgs)]
pub struct TypesArgs {
    /// Source root to scan for tagged declarations (repeatable).
    #[arg(long = "source", value_name = "path", required = true)]
    pub sources: Vec<Utf8PathBuf>,
    /// Only scan modules below this module path, e.g. `apis/v1` (repeatable).
    #[arg(long, value_name = "module")]
    pub boundary: Vec<String>,
    /// Path prefix used when importing spec types (for example `my_crate`).
    #[arg(long, value_name = "path")]
    pub crate_root: Option<String>,
    /// Module providing `TypeMeta`, `ObjectMeta` and `ListMeta`.
    #[arg(long, value_name = "path")]
    pub meta_module: Option<String>,
    /// Name of each generated file.
    #[arg(long, value_name = "name")]
    pub file_name: Option<String>,
}

/// Arguments for the `deepcopy` pipeline.
#[derive(Debug, Clone, ClapArgs)]
pub struct DeepcopyArgs {
    /// Encoded `FileDescriptorSet` to read (repeatable).
    #[arg(long = "descriptor-set", value_name = "path", required = true)]
    pub descriptor_sets: Vec<Utf8PathBuf>,
    /// Restrict generation to these proto file names (repeatable).
    #[arg(long = "file", value_name = "name")]
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    #![allow(
        unfulfilled_lint_expectations,
        reason = "clippy::expect_used is denied globally; tests may not hit those branches"
    )]
    #![expect(
        clippy::expect_used,
        clippy::indexing_slicing,
        reason = "tests panic to surface fixture mistakes"
    )]
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_types_invocation() {
        let cli = Cli::try_parse_from([
            "kubetype-gen",
            "-vv",
            "types",
            "--source",
            "src",
            "--source",
            "other/src",
            "--boundary",
            "apis",
            "--out-dir",
            "generated",
        ])
        .expect("arguments parse");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output.out_dir.as_deref().map(|p| p.as_str()), Some("generated"));
        let Command::Types(args) = cli.command else {
            panic!("expected the types command");
        };
        assert_eq!(args.sources.len(), 2);
        assert_eq!(args.boundary, ["apis"]);
    }

    #[rstest]
    fn deepcopy_requires_a_descriptor_set() {
        assert!(Cli::try_parse_from(["kubetype-gen", "deepcopy"]).is_err());
    }

    #[rstest]
    fn verify_only_is_global() {
        let cli = Cli::try_parse_from([
            "kubetype-gen",
            "deepcopy",
            "--descriptor-set",
            "api.pb",
            "--verify-only",
        ])
        .expect("arguments parse");
        assert!(cli.output.should_verify_only);
    }
}
