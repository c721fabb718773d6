//! Three-layer tag resolution.
//!
//! Every candidate sees up to three [`TagConfig`] layers: the process-wide
//! defaults, its module's tags and its own tags. [`TagLayers`] keeps them as an
//! ordered provider list and [`resolve`] asks that list for each
//! [`TagOption`] in turn, falling back to a value computed from the
//! declaration when no layer answers.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::KubetypeError;
use crate::model::{ModulePath, RawDeclaration};
use crate::tags::{TagConfig, TagOption};

/// Origin of a resolved option value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum LayerProvenance {
    /// Tags on the declaration itself.
    Declaration,
    /// Tags on the defining module.
    Module,
    /// Process-wide defaults from settings.
    Default,
    /// Value computed from the declaration when no layer supplied one.
    Fallback,
}

impl fmt::Display for LayerProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Declaration => "declaration",
            Self::Module => "module",
            Self::Default => "default",
            Self::Fallback => "fallback",
        })
    }
}

#[derive(Clone, Debug)]
struct TagLayer<'a> {
    provenance: LayerProvenance,
    tags: &'a TagConfig,
}

/// Ordered stack of tag layers, highest precedence first.
#[derive(Clone, Debug, Default)]
pub struct TagLayers<'a> {
    layers: Vec<TagLayer<'a>>,
}

impl<'a> TagLayers<'a> {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Builds the usual three-layer stack for one candidate.
    #[must_use]
    pub fn for_candidate(
        defaults: &'a TagConfig,
        module: &'a TagConfig,
        declaration: &'a TagConfig,
    ) -> Self {
        let mut layers = Self::new();
        layers.push(LayerProvenance::Default, defaults);
        layers.push(LayerProvenance::Module, module);
        layers.push(LayerProvenance::Declaration, declaration);
        layers
    }

    /// Adds a layer.
    ///
    /// Layers are kept sorted by precedence, so push order does not matter.
    /// Two layers of the same provenance are consulted most recent first.
    pub fn push(&mut self, provenance: LayerProvenance, tags: &'a TagConfig) {
        let at = self
            .layers
            .iter()
            .position(|layer| layer.provenance >= provenance)
            .unwrap_or(self.layers.len());
        self.layers.insert(at, TagLayer { provenance, tags });
    }

    /// Returns the first non-empty value for `option` and the layer it came
    /// from.
    #[must_use]
    pub fn lookup(&self, option: TagOption) -> Option<(&'a str, LayerProvenance)> {
        self.layers.iter().find_map(|layer| {
            let tags: &'a TagConfig = layer.tags;
            tags.get(option).map(|value| (value, layer.provenance))
        })
    }

    /// Number of layers on the stack.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` when no layer was pushed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// API group and version pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupVersion {
    /// API group, e.g. `networking.istio.io`.
    pub group: String,
    /// API version, e.g. `v1alpha3`.
    pub version: String,
}

impl GroupVersion {
    /// Parses `group/version`.
    ///
    /// Returns `None` unless the value splits into exactly two non-empty
    /// segments.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('/');
        let group = parts.next()?.trim();
        let version = parts.next()?.trim();
        if parts.next().is_some() || group.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self {
            group: group.to_owned(),
            version: version.to_owned(),
        })
    }

    /// Infers the pair from the last two segments of `module`.
    #[must_use]
    pub fn infer(module: &ModulePath) -> Option<Self> {
        let mut tail = module.segments().rev();
        let version = tail.next()?;
        let group = tail.next()?;
        Some(Self {
            group: group.to_owned(),
            version: version.to_owned(),
        })
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.version)
    }
}

/// Status type placed on a generated wrapper.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusType {
    /// The generic status envelope, written verbatim.
    Generic(String),
    /// A module-qualified type that the generated unit imports.
    Typed {
        /// Rust path of the defining module, e.g. `crate::status::v1`.
        module: String,
        /// Type name inside that module.
        ident: String,
    },
}

impl StatusType {
    /// Parses a `module::Type` path.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when `value` is not a Rust path
    /// with at least a module and a type segment.
    pub fn parse_typed(value: &str) -> Result<Self, String> {
        let path: syn::Path = syn::parse_str(value.trim()).map_err(|err| err.to_string())?;
        if path.segments.len() < 2 {
            return Err("expected a module-qualified type such as `crate::status::Status`".into());
        }
        if path
            .segments
            .iter()
            .any(|segment| !segment.arguments.is_none())
        {
            return Err("generic arguments are not supported".into());
        }
        let mut segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let ident = segments.pop().unwrap_or_default();
        let prefix = if path.leading_colon.is_some() { "::" } else { "" };
        Ok(Self::Typed {
            module: format!("{prefix}{}", segments.join("::")),
            ident,
        })
    }

    /// Module the generated unit must import, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::Generic(_) => None,
            Self::Typed { module, .. } => Some(module),
        }
    }
}

/// Effective configuration for one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Generated kind name; the declaration's identifier.
    pub kind: String,
    /// Target API group and version.
    pub group_version: GroupVersion,
    /// Destination module path.
    pub package: ModulePath,
    /// Status type for the wrapper.
    pub status: StatusType,
    provenance: BTreeMap<TagOption, LayerProvenance>,
}

impl ResolvedConfig {
    /// Layer that supplied `option`.
    #[must_use]
    pub fn provenance(&self, option: TagOption) -> LayerProvenance {
        self.provenance
            .get(&option)
            .copied()
            .unwrap_or(LayerProvenance::Fallback)
    }

    /// `group/version` string used for `API_VERSION`.
    #[must_use]
    pub fn api_version(&self) -> String {
        self.group_version.to_string()
    }
}

/// Resolves every recognised option for `declaration`.
///
/// All problems with the candidate are reported together.
///
/// # Errors
///
/// Returns [`KubetypeError::InvalidGroupVersion`],
/// [`KubetypeError::UninferableGroupVersion`],
/// [`KubetypeError::InvalidPackage`] or
/// [`KubetypeError::UnresolvableStatus`], aggregated when more than one
/// applies.
pub fn resolve(
    declaration: &RawDeclaration,
    layers: &TagLayers<'_>,
    generic_status: &str,
) -> Result<ResolvedConfig, KubetypeError> {
    let name = declaration.qualified_name();
    let mut provenance = BTreeMap::new();
    let mut errors = Vec::new();

    let group_version = match layers.lookup(TagOption::GroupVersion) {
        Some((value, from)) => {
            provenance.insert(TagOption::GroupVersion, from);
            GroupVersion::parse(value).ok_or_else(|| KubetypeError::InvalidGroupVersion {
                declaration: name.clone(),
                value: value.to_owned(),
            })
        }
        None => GroupVersion::infer(&declaration.module).ok_or_else(|| {
            KubetypeError::UninferableGroupVersion {
                declaration: name.clone(),
                module: declaration.module.to_string(),
            }
        }),
    }
    .map_err(|err| errors.push(err))
    .ok();

    let package = match layers.lookup(TagOption::Package) {
        Some((value, from)) => {
            provenance.insert(TagOption::Package, from);
            validate_package(value).map_err(|message| KubetypeError::InvalidPackage {
                declaration: name.clone(),
                value: value.to_owned(),
                message,
            })
        }
        None => Ok(declaration.module.clone()),
    }
    .map_err(|err| errors.push(err))
    .ok();

    let status = match layers.lookup(TagOption::Status) {
        Some((value, from)) => {
            provenance.insert(TagOption::Status, from);
            StatusType::parse_typed(value).map_err(|message| KubetypeError::UnresolvableStatus {
                declaration: name.clone(),
                value: value.to_owned(),
                message,
            })
        }
        None => Ok(StatusType::Generic(generic_status.to_owned())),
    }
    .map_err(|err| errors.push(err))
    .ok();

    let (Some(group_version), Some(package), Some(status)) = (group_version, package, status)
    else {
        return Err(KubetypeError::aggregate(errors));
    };

    for option in TagOption::ALL {
        tracing::debug!(
            declaration = %name,
            %option,
            from = %provenance.get(&option).copied().unwrap_or(LayerProvenance::Fallback),
            "resolved option"
        );
    }

    Ok(ResolvedConfig {
        kind: declaration.ident.clone(),
        group_version,
        package,
        status,
        provenance,
    })
}

/// Validates a slash-separated destination module path.
///
/// Reserved words are accepted since they remain usable as raw identifiers.
fn validate_package(value: &str) -> Result<ModulePath, String> {
    let path = ModulePath::new(value);
    if path.is_root() {
        return Err("package has no path segments".into());
    }
    for segment in path.segments() {
        if syn::parse_str::<syn::Ident>(&format!("r#{segment}")).is_err() {
            return Err(format!("segment '{segment}' is not a Rust identifier"));
        }
    }
    Ok(path)
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
    use crate::model::LocationPath;
    use rstest::{fixture, rstest};

    const GENERIC: &str = "serde_json::Value";

    #[fixture]
    fn declaration() -> RawDeclaration {
        RawDeclaration {
            ident: "Widget".to_owned(),
            module: ModulePath::new("apis/networking/v1alpha3"),
            location: LocationPath::new(vec![0]),
            fields: Vec::new(),
            comment: String::new(),
            derives_copy: false,
        }
    }

    fn tags(lines: &str) -> TagConfig {
        TagConfig::parse(lines)
    }

    #[rstest]
    #[case("", "", "", "networking/v1alpha3", LayerProvenance::Fallback)]
    #[case("+kubetype-gen:groupVersion=d/v1", "", "", "d/v1", LayerProvenance::Default)]
    #[case(
        "+kubetype-gen:groupVersion=d/v1",
        "+kubetype-gen:groupVersion=m/v1",
        "",
        "m/v1",
        LayerProvenance::Module
    )]
    #[case(
        "+kubetype-gen:groupVersion=d/v1",
        "+kubetype-gen:groupVersion=m/v1",
        "+kubetype-gen:groupVersion=x/v2",
        "x/v2",
        LayerProvenance::Declaration
    )]
    #[case("", "+kubetype-gen:groupVersion=m/v1", "+kubetype-gen:groupVersion=", "m/v1", LayerProvenance::Module)]
    fn group_version_follows_precedence(
        declaration: RawDeclaration,
        #[case] defaults: &str,
        #[case] module: &str,
        #[case] own: &str,
        #[case] expected: &str,
        #[case] from: LayerProvenance,
    ) {
        let (defaults, module, own) = (tags(defaults), tags(module), tags(own));
        let layers = TagLayers::for_candidate(&defaults, &module, &own);
        let resolved = resolve(&declaration, &layers, GENERIC).expect("resolves");
        assert_eq!(resolved.api_version(), expected);
        assert_eq!(resolved.provenance(TagOption::GroupVersion), from);
    }

    #[rstest]
    fn fallbacks_come_from_the_declaration(declaration: RawDeclaration) {
        let empty = TagConfig::default();
        let layers = TagLayers::for_candidate(&empty, &empty, &empty);
        let resolved = resolve(&declaration, &layers, GENERIC).expect("resolves");
        assert_eq!(resolved.package, declaration.module);
        assert_eq!(resolved.status, StatusType::Generic(GENERIC.to_owned()));
        assert_eq!(resolved.kind, "Widget");
        for option in TagOption::ALL {
            assert_eq!(resolved.provenance(option), LayerProvenance::Fallback);
        }
    }

    #[rstest]
    fn push_order_does_not_change_precedence(declaration: RawDeclaration) {
        let module = tags("+kubetype-gen:package=from/module");
        let own = tags("+kubetype-gen:package=from/declaration");
        let mut layers = TagLayers::new();
        layers.push(LayerProvenance::Declaration, &own);
        layers.push(LayerProvenance::Module, &module);
        let resolved = resolve(&declaration, &layers, GENERIC).expect("resolves");
        assert_eq!(resolved.package.as_str(), "from/declaration");
        assert_eq!(layers.len(), 2);
    }

    #[rstest]
    fn typed_status_splits_module_and_ident(declaration: RawDeclaration) {
        let own = tags("+kubetype-gen:status=crate::meta::v1alpha1::IstioStatus");
        let empty = TagConfig::default();
        let layers = TagLayers::for_candidate(&empty, &empty, &own);
        let resolved = resolve(&declaration, &layers, GENERIC).expect("resolves");
        assert_eq!(
            resolved.status,
            StatusType::Typed {
                module: "crate::meta::v1alpha1".to_owned(),
                ident: "IstioStatus".to_owned(),
            }
        );
        assert_eq!(resolved.status.module(), Some("crate::meta::v1alpha1"));
    }

    #[rstest]
    fn keyword_package_segments_are_accepted(declaration: RawDeclaration) {
        let own = tags("+kubetype-gen:package=success/defaults/override");
        let empty = TagConfig::default();
        let layers = TagLayers::for_candidate(&empty, &empty, &own);
        let resolved = resolve(&declaration, &layers, GENERIC).expect("resolves");
        assert_eq!(resolved.package.as_str(), "success/defaults/override");
    }

    #[rstest]
    #[case("+kubetype-gen:groupVersion=a/b/c")]
    #[case("+kubetype-gen:groupVersion=/v1")]
    #[case("+kubetype-gen:groupVersion=noslash")]
    fn malformed_group_versions_are_rejected(declaration: RawDeclaration, #[case] line: &str) {
        let own = tags(line);
        let empty = TagConfig::default();
        let layers = TagLayers::for_candidate(&empty, &empty, &own);
        let err = resolve(&declaration, &layers, GENERIC).expect_err("invalid");
        assert!(matches!(err, KubetypeError::InvalidGroupVersion { .. }));
    }

    #[rstest]
    fn shallow_modules_cannot_infer_a_group_version(mut declaration: RawDeclaration) {
        declaration.module = ModulePath::new("apis");
        let empty = TagConfig::default();
        let layers = TagLayers::for_candidate(&empty, &empty, &empty);
        let err = resolve(&declaration, &layers, GENERIC).expect_err("uninferable");
        assert!(matches!(err, KubetypeError::UninferableGroupVersion { .. }));
    }

    #[rstest]
    fn every_invalid_option_is_reported(declaration: RawDeclaration) {
        let own = tags(
            "+kubetype-gen:package=bad-name/x\n+kubetype-gen:status=Status\n+kubetype-gen:groupVersion=g",
        );
        let empty = TagConfig::default();
        let layers = TagLayers::for_candidate(&empty, &empty, &own);
        let err = resolve(&declaration, &layers, GENERIC).expect_err("invalid");
        let KubetypeError::Aggregate(batch) = err else {
            panic!("expected an aggregate, got {err}");
        };
        assert_eq!(batch.len(), 3);
    }
}
