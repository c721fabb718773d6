//! Partitioning of resolved candidates into destinations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Diagnostics, KubetypeError};
use crate::model::{ModulePath, RawDeclaration};
use crate::resolve::ResolvedConfig;

/// Identity of one generated unit.
///
/// Ordering is lexicographic by package, then group, then version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DestinationKey {
    /// Destination module path.
    pub package: ModulePath,
    /// API group.
    pub group: String,
    /// API version.
    pub version: String,
}

impl DestinationKey {
    /// Key a resolved candidate belongs to.
    #[must_use]
    pub fn of(config: &ResolvedConfig) -> Self {
        Self {
            package: config.package.clone(),
            group: config.group_version.group.clone(),
            version: config.group_version.version.clone(),
        }
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.package, self.group, self.version)
    }
}

/// A candidate assigned to a destination.
#[derive(Debug, Clone)]
pub struct Member<'m> {
    /// The source declaration.
    pub declaration: &'m RawDeclaration,
    /// Its resolved configuration.
    pub config: ResolvedConfig,
}

/// Candidates sharing one destination, in discovery order.
#[derive(Debug, Clone)]
pub struct Destination<'m> {
    key: DestinationKey,
    members: Vec<Member<'m>>,
}

impl<'m> Destination<'m> {
    /// Creates an empty destination.
    #[must_use]
    pub const fn new(key: DestinationKey) -> Self {
        Self {
            key,
            members: Vec::new(),
        }
    }

    /// Destination identity.
    #[must_use]
    pub const fn key(&self) -> &DestinationKey {
        &self.key
    }

    /// Members in discovery order.
    #[must_use]
    pub fn members(&self) -> &[Member<'m>] {
        &self.members
    }

    /// Distinct modules defining the members' spec types.
    #[must_use]
    pub fn spec_modules(&self) -> BTreeSet<&ModulePath> {
        self.members.iter().map(|m| &m.declaration.module).collect()
    }

    /// Distinct modules defining typed status types.
    #[must_use]
    pub fn status_modules(&self) -> BTreeSet<&str> {
        self.members
            .iter()
            .filter_map(|m| m.config.status.module())
            .collect()
    }

    /// Adds a member unless its kind is already present.
    ///
    /// # Errors
    ///
    /// Returns [`KubetypeError::DuplicateKind`] for a repeated kind.
    pub fn push(
        &mut self,
        declaration: &'m RawDeclaration,
        config: ResolvedConfig,
    ) -> Result<(), KubetypeError> {
        if self.members.iter().any(|m| m.config.kind == config.kind) {
            return Err(KubetypeError::DuplicateKind {
                declaration: declaration.qualified_name(),
                kind: config.kind,
                destination: self.key.to_string(),
            });
        }
        self.members.push(Member {
            declaration,
            config,
        });
        Ok(())
    }

    /// Returns `true` when no member survived.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Groups resolved candidates by destination.
///
/// Input order is taken as discovery order. Duplicate kinds are reported in
/// `diagnostics` and excluded.
pub fn group<'m, I>(resolved: I, diagnostics: &mut Diagnostics) -> Vec<Destination<'m>>
where
    I: IntoIterator<Item = (&'m RawDeclaration, ResolvedConfig)>,
{
    let mut by_key: BTreeMap<DestinationKey, Destination<'m>> = BTreeMap::new();
    for (declaration, config) in resolved {
        let key = DestinationKey::of(&config);
        let destination = by_key
            .entry(key.clone())
            .or_insert_with(|| Destination::new(key));
        if let Err(error) = destination.push(declaration, config) {
            diagnostics.push(error);
        }
    }
    by_key
        .into_values()
        .filter(|destination| !destination.is_empty())
        .collect()
}
