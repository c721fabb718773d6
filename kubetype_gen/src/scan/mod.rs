//! Candidate discovery over pre-loaded source modules.
//!
//! A declaration is a candidate when its attached comment carries the
//! [`MARKER`](crate::tags::MARKER), or when a detached comment block directly
//! above it does. Detached blocks are looked up by [`LocationPath`] through a
//! per-module index, built on first use and reused for the rest of that
//! module's scan.

pub mod rust;
mod type_utils;

use std::collections::HashMap;

use crate::error::Diagnostics;
use crate::model::{LocationPath, RawDeclaration, SourceModule};
use crate::tags::TagConfig;

/// A declaration eligible for generation.
#[derive(Debug, Clone)]
pub struct Candidate<'m> {
    /// The scanned declaration.
    pub declaration: &'m RawDeclaration,
    /// Tags from the declaration's attached and detached comments.
    pub tags: TagConfig,
}

/// Candidates discovered in one module, with that module's own tags.
#[derive(Debug, Clone)]
pub struct ScannedModule<'m> {
    /// The module the candidates were found in.
    pub module: &'m SourceModule,
    /// Module-level tags.
    pub tags: TagConfig,
    /// Candidates in declaration order.
    pub candidates: Vec<Candidate<'m>>,
}

/// Result of scanning a set of modules.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet<'m> {
    modules: Vec<ScannedModule<'m>>,
}

impl<'m> CandidateSet<'m> {
    /// Modules that contributed at least one candidate, in scan order.
    #[must_use]
    pub fn modules(&self) -> &[ScannedModule<'m>] {
        &self.modules
    }

    /// All candidates in discovery order, paired with their module tags.
    pub fn iter(&self) -> impl Iterator<Item = (&ScannedModule<'m>, &Candidate<'m>)> {
        self.modules
            .iter()
            .flat_map(|module| module.candidates.iter().map(move |c| (module, c)))
    }

    /// Total number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.iter().map(|m| m.candidates.len()).sum()
    }

    /// Returns `true` when no candidate was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lookup table from declaration location to its detached comment blocks.
#[derive(Debug, Default)]
struct DetachedIndex<'m> {
    by_location: HashMap<&'m LocationPath, Vec<&'m str>>,
}

impl<'m> DetachedIndex<'m> {
    fn build(module: &'m SourceModule) -> Self {
        let mut by_location: HashMap<&'m LocationPath, Vec<&'m str>> = HashMap::new();
        for block in &module.detached {
            by_location
                .entry(&block.location)
                .or_default()
                .push(block.text.as_str());
        }
        Self { by_location }
    }

    fn blocks(&self, location: &LocationPath) -> &[&'m str] {
        self.by_location.get(location).map_or(&[], Vec::as_slice)
    }
}

/// Scans `modules` for candidates.
///
/// Modules are visited in module-path order so discovery order does not
/// depend on the order the caller found them in.
#[must_use]
pub fn scan_modules(modules: &[SourceModule]) -> CandidateSet<'_> {
    let mut ordered: Vec<&SourceModule> = modules.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.origin.cmp(&b.origin)));

    let mut set = CandidateSet::default();
    for module in ordered {
        let scanned = scan_module(module);
        if !scanned.candidates.is_empty() {
            set.modules.push(scanned);
        }
    }
    tracing::debug!(candidates = set.len(), "scan complete");
    set
}

/// Scans a single module.
#[must_use]
pub fn scan_module(module: &SourceModule) -> ScannedModule<'_> {
    let tags = TagConfig::parse(&module.comment);
    warn_malformed(&module.path.to_string(), &tags);

    let mut index: Option<DetachedIndex<'_>> = None;
    let mut candidates = Vec::new();
    for declaration in &module.declarations {
        let attached = TagConfig::parse(&declaration.comment);
        let detached = if module.detached.is_empty() {
            TagConfig::default()
        } else {
            let lookup = index.get_or_insert_with(|| DetachedIndex::build(module));
            lookup
                .blocks(&declaration.location)
                .iter()
                .fold(TagConfig::default(), |acc, block| {
                    acc.overlay(&TagConfig::parse(block))
                })
        };
        let merged = detached.overlay(&attached);
        if !merged.is_enabled() {
            continue;
        }
        warn_malformed(&declaration.qualified_name(), &merged);
        tracing::debug!(
            declaration = %declaration.qualified_name(),
            location = %declaration.location,
            via_detached = !attached.is_enabled(),
            "found candidate"
        );
        candidates.push(Candidate {
            declaration,
            tags: merged,
        });
    }

    ScannedModule {
        module,
        tags,
        candidates,
    }
}

/// Loads Rust sources, reporting modules that fail to parse.
///
/// Successfully loaded modules are returned so callers can scan them with
/// [`scan_modules`]; each failure lands in `diagnostics`.
pub fn load_rust_sources<'s, I>(sources: I, diagnostics: &mut Diagnostics) -> Vec<SourceModule>
where
    I: IntoIterator<Item = &'s rust::RustSource>,
{
    let mut modules = Vec::new();
    for source in sources {
        match rust::parse_source(source) {
            Ok(mut loaded) => modules.append(&mut loaded),
            Err(error) => diagnostics.push(error),
        }
    }
    modules
}

fn warn_malformed(owner: &str, tags: &TagConfig) {
    for line in tags.malformed() {
        tracing::warn!(%owner, %line, "ignoring malformed kubetype-gen tag");
    }
}
