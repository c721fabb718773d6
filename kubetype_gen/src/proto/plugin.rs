//! `protoc` plugin protocol.
//!
//! Converts a decoded `CodeGeneratorRequest` into the response `protoc`
//! expects. Reading stdin and writing stdout stays with the binary.

use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

use crate::pipeline::{GenerationReport, generate_deepcopy};
use crate::synth::SynthOptions;

/// Runs the deep-copy pipeline over the files `protoc` asked for.
///
/// Per-message failures are reported through the response's `error` field
/// while any units that were produced are still returned.
#[must_use]
pub fn respond(request: &CodeGeneratorRequest, options: &SynthOptions) -> CodeGeneratorResponse {
    let report = generate_deepcopy(
        &request.proto_file,
        Some(request.file_to_generate.as_slice()),
        options,
    );
    into_response(report)
}

/// Packages a report as a `CodeGeneratorResponse`.
#[must_use]
pub fn into_response(report: GenerationReport) -> CodeGeneratorResponse {
    let error = (!report.diagnostics.is_empty()).then(|| report.diagnostics.to_string());
    let file = report
        .units
        .into_iter()
        .map(|unit| File {
            name: Some(unit.path.into_string()),
            content: Some(unit.text),
            ..Default::default()
        })
        .collect();
    CodeGeneratorResponse {
        error,
        supported_features: Some(Feature::Proto3Optional as u64),
        file,
        ..Default::default()
    }
}
