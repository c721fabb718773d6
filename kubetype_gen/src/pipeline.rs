//! End-to-end passes: scan, resolve, group and synthesise.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;

use prost_types::FileDescriptorProto;

use crate::error::{AggregatedErrors, Diagnostics, KubetypeError};
use crate::group::{Destination, DestinationKey, group};
use crate::model::{ModulePath, RawDeclaration, SourceModule};
use crate::proto::{load_file, synthesize_package};
use crate::resolve::{TagLayers, resolve};
use crate::scan::rust::RustSource;
use crate::scan::{load_rust_sources, scan_modules};
use crate::synth::{GeneratedUnit, SynthOptions, synthesize, unit_path};
use crate::tags::TagConfig;

/// Outcome of one generation pass.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Generated units in destination order.
    pub units: Vec<GeneratedUnit>,
    /// Module and candidate errors collected during the pass.
    pub diagnostics: AggregatedErrors,
    /// Number of candidates discovered, including rejected ones.
    pub candidates: usize,
}

impl GenerationReport {
    /// Returns `true` when nothing was rejected.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Runs the types pipeline over Rust sources.
///
/// Files that fail to parse are reported and skipped.
#[must_use]
pub fn generate_types(
    sources: &[RustSource],
    defaults: &TagConfig,
    options: &SynthOptions,
) -> GenerationReport {
    let mut diagnostics = Diagnostics::new();
    let modules = load_rust_sources(sources, &mut diagnostics);
    types_pass(&modules, defaults, options, diagnostics)
}

/// Runs the types pipeline over modules loaded by another frontend.
#[must_use]
pub fn generate_types_from_modules(
    modules: &[SourceModule],
    defaults: &TagConfig,
    options: &SynthOptions,
) -> GenerationReport {
    types_pass(modules, defaults, options, Diagnostics::new())
}

fn types_pass(
    modules: &[SourceModule],
    defaults: &TagConfig,
    options: &SynthOptions,
    mut diagnostics: Diagnostics,
) -> GenerationReport {
    let candidates = scan_modules(modules);
    let mut resolved = Vec::with_capacity(candidates.len());
    for (scanned, candidate) in candidates.iter() {
        let layers = TagLayers::for_candidate(defaults, &scanned.tags, &candidate.tags);
        match resolve(candidate.declaration, &layers, &options.generic_status) {
            Ok(config) => resolved.push((candidate.declaration, config)),
            Err(error) => diagnostics.push(error),
        }
    }

    let destinations = group(resolved, &mut diagnostics);
    let units: Vec<GeneratedUnit> = claim_paths(&destinations, options, &mut diagnostics)
        .into_iter()
        .map(|destination| synthesize(destination, options))
        .collect();

    tracing::info!(
        modules = modules.len(),
        candidates = candidates.len(),
        units = units.len(),
        rejected = diagnostics.len(),
        "types pass complete"
    );
    GenerationReport {
        units,
        diagnostics: diagnostics.into_aggregate(),
        candidates: candidates.len(),
    }
}

/// Keeps the first destination, in key order, for each unit path.
///
/// Destinations whose groups share a first label land on the same path; the
/// members of every later one are rejected.
fn claim_paths<'d, 'm>(
    destinations: &'d [Destination<'m>],
    options: &SynthOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<&'d Destination<'m>> {
    let mut claimed: BTreeMap<Utf8PathBuf, &DestinationKey> = BTreeMap::new();
    let mut kept = Vec::with_capacity(destinations.len());
    for destination in destinations {
        let path = unit_path(destination, options);
        if let Some(owner) = claimed.get(&path) {
            for member in destination.members() {
                diagnostics.push(KubetypeError::PathCollision {
                    declaration: member.declaration.qualified_name(),
                    path: path.to_string(),
                    destination: destination.key().to_string(),
                    owner: owner.to_string(),
                });
            }
            continue;
        }
        claimed.insert(path, destination.key());
        kept.push(destination);
    }
    kept
}

/// Runs the deep-copy pipeline over protobuf file descriptors.
///
/// When `to_generate` is given, only files named in it are scanned; the rest
/// only serve as dependencies. Packages spread over several files produce a
/// single unit.
#[must_use]
pub fn generate_deepcopy(
    files: &[FileDescriptorProto],
    to_generate: Option<&[String]>,
    options: &SynthOptions,
) -> GenerationReport {
    let modules: Vec<SourceModule> = files
        .iter()
        .filter(|file| to_generate.is_none_or(|names| names.iter().any(|n| n == file.name())))
        .map(load_file)
        .collect();
    let candidates = scan_modules(&modules);

    let mut packages: BTreeMap<&ModulePath, Vec<&RawDeclaration>> = BTreeMap::new();
    for (scanned, candidate) in candidates.iter() {
        packages
            .entry(&scanned.module.path)
            .or_default()
            .push(candidate.declaration);
    }
    let units: Vec<GeneratedUnit> = packages
        .iter()
        .map(|(package, messages)| synthesize_package(package, messages, options))
        .collect();

    tracing::info!(
        files = modules.len(),
        candidates = candidates.len(),
        units = units.len(),
        "deep-copy pass complete"
    );
    GenerationReport {
        units,
        diagnostics: AggregatedErrors::default(),
        candidates: candidates.len(),
    }
}
