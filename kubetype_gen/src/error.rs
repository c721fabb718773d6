//! Error types produced while scanning, resolving and synthesising.
//!
//! Nothing in the core aborts a run on a single bad module or candidate.
//! Failures are pushed into [`Diagnostics`] and surfaced together as an
//! [`AggregatedErrors`] batch once the pass completes.

use std::{error::Error, fmt, sync::Arc};

use thiserror::Error;

/// Errors reported by the generation core.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubetypeError {
    /// A source module could not be parsed.
    #[error("failed to load module '{module}' from {origin}: {message}")]
    ModuleLoad {
        /// Module path the source would have defined.
        module: String,
        /// File or descriptor name the module came from.
        origin: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A `groupVersion` value did not split into two non-empty segments.
    #[error("{declaration}: invalid groupVersion '{value}', expected 'group/version'")]
    InvalidGroupVersion {
        /// Qualified declaration name.
        declaration: String,
        /// Offending value.
        value: String,
    },

    /// No `groupVersion` was configured and none could be inferred.
    #[error(
        "{declaration}: no groupVersion configured and module '{module}' has fewer than two segments"
    )]
    UninferableGroupVersion {
        /// Qualified declaration name.
        declaration: String,
        /// Defining module path.
        module: String,
    },

    /// A `package` value is not a usable module path.
    #[error("{declaration}: invalid package '{value}': {message}")]
    InvalidPackage {
        /// Qualified declaration name.
        declaration: String,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A `status` value does not name a module-qualified type.
    #[error("{declaration}: cannot resolve status type '{value}': {message}")]
    UnresolvableStatus {
        /// Qualified declaration name.
        declaration: String,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        message: String,
    },

    /// Two candidates produce the same kind inside one destination.
    #[error("{declaration}: kind '{kind}' already generated for destination {destination}")]
    DuplicateKind {
        /// Qualified declaration name of the rejected candidate.
        declaration: String,
        /// Generated kind name.
        kind: String,
        /// Destination rendered as `package (group/version)`.
        destination: String,
    },

    /// Two destinations map onto the same unit path; the later one loses.
    #[error("{declaration}: destination {destination} would overwrite {path}, already generated for {owner}")]
    PathCollision {
        /// Qualified declaration name of the rejected candidate.
        declaration: String,
        /// Unit path both destinations map to.
        path: String,
        /// Destination of the rejected candidate.
        destination: String,
        /// Destination that keeps the path.
        owner: String,
    },

    /// Several failures collected during one pass.
    #[error("multiple generation errors:\n{0}")]
    Aggregate(Box<AggregatedErrors>),
}

impl KubetypeError {
    /// Folds a candidate's errors into one.
    ///
    /// A single error is returned unchanged; several become
    /// [`KubetypeError::Aggregate`].
    #[must_use]
    pub fn aggregate(mut errors: Vec<Self>) -> Self {
        match (errors.pop(), errors.is_empty()) {
            (Some(only), true) => only,
            (last, _) => {
                errors.extend(last);
                Self::Aggregate(Box::new(errors.into_iter().collect()))
            }
        }
    }
}

/// Errors collected over one pass, in the order they were found.
#[derive(Debug, Default, Clone)]
pub struct AggregatedErrors(Vec<Arc<KubetypeError>>);

impl AggregatedErrors {
    /// Iterate over the contained errors.
    #[must_use = "iterators should be consumed to inspect errors"]
    pub fn iter(&self) -> impl Iterator<Item = &KubetypeError> {
        self.0.iter().map(Arc::as_ref)
    }

    /// Number of errors in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing was collected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<KubetypeError> for AggregatedErrors {
    fn extend<I: IntoIterator<Item = KubetypeError>>(&mut self, errors: I) {
        self.0.extend(errors.into_iter().map(Arc::new));
    }
}

impl FromIterator<KubetypeError> for AggregatedErrors {
    fn from_iter<I: IntoIterator<Item = KubetypeError>>(errors: I) -> Self {
        let mut batch = Self::default();
        batch.extend(errors);
        batch
    }
}

impl fmt::Display for AggregatedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .iter()
            .zip(1_usize..)
            .map(|(error, n)| format!("{n}: {error}"))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

impl Error for AggregatedErrors {}

/// Accumulates per-module and per-candidate failures for the batch report.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: AggregatedErrors,
}

impl Diagnostics {
    /// Create an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: AggregatedErrors(Vec::new()),
        }
    }

    /// Records `error` and logs it at debug level.
    pub fn push(&mut self, error: KubetypeError) {
        tracing::debug!(%error, "skipping after generation error");
        self.errors.extend([error]);
    }

    /// Number of collected errors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` when nothing was collected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the collector and return the batch.
    #[must_use]
    pub fn into_aggregate(self) -> AggregatedErrors {
        self.errors
    }
}
