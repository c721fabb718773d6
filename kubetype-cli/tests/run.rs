//! End-to-end runs of the `kubetype-gen` pipelines against temporary trees.
#![allow(
    unfulfilled_lint_expectations,
    reason = "clippy::expect_used is denied globally; tests may not hit those branches"
)]
#![expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests panic to surface fixture mistakes"
)]

use anyhow::{Result, anyhow, ensure};
use clap::Parser;
use kubetype_cli::cli::Cli;
use kubetype_cli::error::CliError;
use kubetype_cli::output::OutputSummary;
use kubetype_cli::run;
use rstest::{fixture, rstest};
use test_helpers::jail::{jail_error, with_jail};
use test_helpers::proto::{descriptor_set_bytes, file, message, with_comments};
use test_helpers::tree::TempTree;

const WIDGETS: &str = "//! +kubetype-gen:groupVersion=widgets.example.com/v1

/// Widget is a test type.
///
/// +kubetype-gen
pub struct Widget {
    pub replicas: u32,
}
";

#[fixture]
fn tree() -> TempTree {
    TempTree::new().expect("temp tree")
}

fn run_in_jail(args: &[String]) -> Result<Result<OutputSummary, CliError>> {
    let mut argv = vec!["kubetype-gen".to_owned()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv)?;
    with_jail(|_| Ok(run(&cli)))
}

fn types_args(tree: &TempTree, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        "types".to_owned(),
        "--source".to_owned(),
        tree.root().join("src").to_string(),
        "--out-dir".to_owned(),
        tree.root().join("out").to_string(),
    ];
    args.extend(extra.iter().map(|arg| (*arg).to_owned()));
    args
}

#[rstest]
fn types_run_writes_then_verifies(tree: TempTree) -> Result<()> {
    tree.write("src/apis/widgets.rs", WIDGETS)?;

    let first = run_in_jail(&types_args(&tree, &[]))??;
    ensure!(first.written.len() == 1, "unexpected summary {first:?}");
    let text = tree.read("out/apis/widgets/widgets/v1/types.rs")?;
    ensure!(text.starts_with("// Code generated by kubetype-gen. DO NOT EDIT.\n"));
    ensure!(text.contains("pub spec: widgets::Widget,"));

    let second = run_in_jail(&types_args(&tree, &[]))??;
    ensure!(second.written.is_empty() && second.unchanged.len() == 1);

    let verified = run_in_jail(&types_args(&tree, &["--verify-only"]))??;
    ensure!(verified.unchanged.len() == 1);
    Ok(())
}

#[rstest]
fn verify_only_reports_stale_files_without_writing(tree: TempTree) -> Result<()> {
    tree.write("src/apis/widgets.rs", WIDGETS)?;
    let outcome = run_in_jail(&types_args(&tree, &["--verify-only"]))?;
    let Err(CliError::Stale(paths)) = &outcome else {
        return Err(anyhow!("expected stale files, got {outcome:?}"));
    };
    ensure!(paths.len() == 1);
    ensure!(!tree.exists("out/apis/widgets/widgets/v1/types.rs"));
    Ok(())
}

#[rstest]
fn boilerplate_and_generator_flags_shape_the_header(tree: TempTree) -> Result<()> {
    tree.write("src/apis/widgets.rs", WIDGETS)?;
    let header = tree.write("header.txt", "// Copyright Example Authors\n")?;
    let header_arg = header.to_string();
    run_in_jail(&types_args(
        &tree,
        &["--boilerplate", &header_arg, "--generated-by", "widget-gen"],
    ))??;
    let text = tree.read("out/apis/widgets/widgets/v1/types.rs")?;
    ensure!(text.starts_with(
        "// Copyright Example Authors\n\n// Code generated by widget-gen. DO NOT EDIT.\n"
    ));
    Ok(())
}

#[rstest]
fn broken_sources_do_not_fail_the_run(tree: TempTree) -> Result<()> {
    tree.write("src/apis/widgets.rs", WIDGETS)?;
    tree.write("src/apis/broken.rs", "pub struct {")?;
    let summary = run_in_jail(&types_args(&tree, &[]))??;
    ensure!(summary.written.len() == 1);
    Ok(())
}

#[rstest]
fn unreadable_source_files_do_not_fail_the_run(tree: TempTree) -> Result<()> {
    tree.write("src/apis/widgets.rs", WIDGETS)?;
    tree.write("src/apis/zz/v1.rs", [0xff_u8, 0xfe, b'\n'])?;
    let summary = run_in_jail(&types_args(&tree, &[]))??;
    ensure!(summary.written.len() == 1, "unexpected summary {summary:?}");
    ensure!(tree.exists("out/apis/widgets/widgets/v1/types.rs"));
    Ok(())
}

#[rstest]
fn configuration_file_supplies_defaults(tree: TempTree) -> Result<()> {
    tree.write(
        "src/apis/plain.rs",
        "/// +kubetype-gen\npub struct Plain {\n    pub value: u8,\n}\n",
    )?;
    let out = tree.root().join("out");
    let src = tree.root().join("src");
    let summary = with_jail(|jail| {
        jail.create_file(
            "kubetype-gen.toml",
            &format!(
                "out_dir = \"{out}\"\n\n[defaults]\ngroupVersion = \"config.example.com/v2\"\npackage = \"generated/apis\"\n"
            ),
        )?;
        let cli = Cli::try_parse_from(["kubetype-gen", "types", "--source", src.as_str()])
            .map_err(|e| jail_error(&e))?;
        run(&cli).map_err(|e| jail_error(&e))
    })?;
    ensure!(summary.written.len() == 1);
    ensure!(tree.exists("out/generated/apis/config/v2/types.rs"));
    Ok(())
}

#[rstest]
fn deepcopy_run_reads_descriptor_sets(tree: TempTree) -> Result<()> {
    let proto = with_comments(
        file(
            "demo/v1/demo.proto",
            "demo.v1",
            vec![message("Tagged"), message("Plain")],
        ),
        &[4, 0],
        "+kubetype-gen",
        &[],
    );
    let set = tree.write("demo.pb", descriptor_set_bytes(vec![proto]))?;
    let summary = run_in_jail(&[
        "deepcopy".to_owned(),
        "--descriptor-set".to_owned(),
        set.to_string(),
        "--out-dir".to_owned(),
        tree.root().join("out").to_string(),
    ])??;
    ensure!(summary.written.len() == 1);
    let text = tree.read("out/demo.v1.deepcopy.rs")?;
    ensure!(text.contains("impl Tagged {"));
    ensure!(!text.contains("impl Plain {"));
    Ok(())
}

#[rstest]
fn undecodable_descriptor_set_fails(tree: TempTree) -> Result<()> {
    let set = tree.write("broken.pb", [0xff_u8, 0xff, 0xff])?;
    let outcome = run_in_jail(&[
        "deepcopy".to_owned(),
        "--descriptor-set".to_owned(),
        set.to_string(),
    ])?;
    ensure!(matches!(outcome, Err(CliError::Decode { .. })), "got {outcome:?}");
    Ok(())
}
