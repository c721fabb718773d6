//! Glue between `protoc` and the deep-copy pipeline.
//!
//! The plugin parameter (`--deepcopy_opt=key=value,...`) is merged over the
//! usual configuration layers, so `generated_by` and `boilerplate_file` work
//! as they do for the main binary.

use std::collections::BTreeMap;

use figment::providers::Serialized;
use kubetype_gen::SynthOptions;
use kubetype_gen::proto::plugin::respond;
use prost::Message;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

use crate::config::Settings;
use crate::error::CliError;

/// Splits a plugin parameter into key/value pairs.
///
/// Empty entries are ignored.
///
/// # Errors
///
/// Returns [`CliError::PluginParameter`] for an entry without `=`.
pub fn parse_parameter(parameter: &str) -> Result<BTreeMap<String, String>, CliError> {
    parameter
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_owned(), value.trim().to_owned()))
            }
            _ => Err(CliError::PluginParameter(entry.to_owned())),
        })
        .collect()
}

/// Synthesis options for a request carrying `parameter`.
///
/// # Errors
///
/// Returns an error when the parameter, a configuration layer or the
/// boilerplate file is invalid.
pub fn plugin_options(parameter: &str) -> Result<SynthOptions, CliError> {
    let overrides = parse_parameter(parameter)?;
    let settings: Settings = Settings::figment(None)?
        .merge(Serialized::defaults(overrides))
        .extract()?;
    settings.synth_options()
}

/// Decodes a request, runs the pipeline and returns the encoded response.
///
/// Option problems are reported to `protoc` through the response.
///
/// # Errors
///
/// Returns [`CliError::Decode`] when `input` is not a `CodeGeneratorRequest`.
pub fn handle(input: &[u8]) -> Result<Vec<u8>, CliError> {
    let request = CodeGeneratorRequest::decode(input).map_err(|source| CliError::Decode {
        what: "CodeGeneratorRequest",
        path: "<stdin>".into(),
        source,
    })?;
    let response = match plugin_options(request.parameter()) {
        Ok(options) => respond(&request, &options),
        Err(err) => CodeGeneratorResponse {
            error: Some(err.to_string()),
            ..Default::default()
        },
    };
    if let Some(error) = &response.error {
        tracing::warn!(%error, "deep-copy generation reported errors");
    }
    tracing::info!(
        requested = request.file_to_generate.len(),
        written = response.file.len(),
        "protoc-gen-deepcopy finished"
    );
    Ok(response.encode_to_vec())
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
    use test_helpers::jail::{jail_error, with_jail};
    use test_helpers::proto::{file, message, with_comments};

    #[rstest]
    #[case("", &[])]
    #[case("generated_by=custom", &[("generated_by", "custom")])]
    #[case(" a = 1 ,, b=2 ", &[("a", "1"), ("b", "2")])]
    fn parameters_split_into_pairs(#[case] parameter: &str, #[case] expected: &[(&str, &str)]) {
        let parsed = parse_parameter(parameter).expect("parameter parses");
        let pairs: Vec<(&str, &str)> = parsed.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, expected);
    }

    #[rstest]
    fn bare_words_are_rejected() {
        assert!(matches!(
            parse_parameter("verbose"),
            Err(CliError::PluginParameter(entry)) if entry == "verbose"
        ));
    }

    #[rstest]
    fn request_round_trip_uses_parameter() {
        let proto = with_comments(
            file("demo/v1/demo.proto", "demo.v1", vec![message("Widget")]),
            &[4, 0],
            "+kubetype-gen",
            &[],
        );
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["demo/v1/demo.proto".to_owned()],
            parameter: Some("generated_by=custom-gen".to_owned()),
            proto_file: vec![proto],
            ..Default::default()
        };

        let response = with_jail(|_| {
            let bytes = handle(&request.encode_to_vec()).map_err(|e| jail_error(&e))?;
            CodeGeneratorResponse::decode(bytes.as_slice()).map_err(|e| jail_error(&e))
        })
        .expect("plugin responds");

        assert_eq!(response.error, None);
        let [generated] = response.file.as_slice() else {
            panic!("expected one file, got {}", response.file.len());
        };
        assert_eq!(generated.name(), "demo.v1.deepcopy.rs");
        assert!(
            generated
                .content()
                .starts_with("// Code generated by custom-gen. DO NOT EDIT.\n")
        );
    }

    #[rstest]
    fn malformed_parameter_is_reported_in_the_response() {
        let request = CodeGeneratorRequest {
            parameter: Some("oops".to_owned()),
            ..Default::default()
        };
        let response = with_jail(|_| {
            let bytes = handle(&request.encode_to_vec()).map_err(|e| jail_error(&e))?;
            CodeGeneratorResponse::decode(bytes.as_slice()).map_err(|e| jail_error(&e))
        })
        .expect("plugin responds");
        assert!(response.error.is_some_and(|e| e.contains("oops")));
        assert!(response.file.is_empty());
    }

    #[rstest]
    fn garbage_input_is_a_decode_error() {
        assert!(matches!(
            handle(&[0xff, 0xff, 0xff]),
            Err(CliError::Decode { .. })
        ));
    }
}
