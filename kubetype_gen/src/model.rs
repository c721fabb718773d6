//! Pre-loaded source model handed to the scanner.
//!
//! Frontends (the `syn` loader in [`crate::scan::rust`] and the descriptor
//! loader in [`crate::proto::descriptor`]) produce these values; everything
//! downstream treats them as immutable.

use std::fmt;

/// Slash-separated module path, e.g. `apis/networking/v1alpha3`.
///
/// The empty path denotes a crate root or a proto file without a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModulePath(String);

impl ModulePath {
    /// Builds a path from a slash-separated string, dropping empty segments.
    #[must_use]
    pub fn new(path: &str) -> Self {
        let joined = path
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Builds a path from individual segments.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Returns the path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a child segment.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        Self::from_segments(self.segments().chain(std::iter::once(segment)))
    }

    /// Returns `true` if `prefix` is an ancestor of, or equal to, this path.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        let mut own = self.segments();
        prefix
            .segments()
            .all(|segment| own.next().is_some_and(|candidate| candidate == segment))
    }

    /// Renders the path as a Rust path below `root` (`crate::a::b`).
    #[must_use]
    pub fn to_rust_path(&self, root: &str) -> String {
        std::iter::once(root)
            .filter(|r| !r.is_empty())
            .chain(self.segments())
            .collect::<Vec<_>>()
            .join("::")
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Structural position of a declaration inside its source file.
///
/// For protobuf descriptors this is the `SourceCodeInfo` path (`4,0,3,1`);
/// for Rust sources it is the chain of item indices through inline modules.
/// It never depends on line numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationPath(Vec<i32>);

impl LocationPath {
    /// Wraps raw path components.
    #[must_use]
    pub const fn new(components: Vec<i32>) -> Self {
        Self(components)
    }

    /// Returns a new path extended by `components`.
    #[must_use]
    pub fn join(&self, components: &[i32]) -> Self {
        let mut path = self.0.clone();
        path.extend_from_slice(components);
        Self(path)
    }

    /// Raw path components.
    #[must_use]
    pub fn components(&self) -> &[i32] {
        &self.0
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

/// Coarse classification of a field type, used to plan deep copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Plain value type (integers, floats, `bool`, `char`).
    Scalar,
    /// Owned text.
    Text,
    /// Ordered sequence such as `Vec<T>` or a repeated proto field.
    Sequence,
    /// Keyed collection such as `BTreeMap<K, V>` or a proto map.
    Map,
    /// Optional value.
    Optional,
    /// Heap indirection such as `Box<T>`.
    Boxed,
    /// Any other named type.
    Named,
}

impl FieldShape {
    /// Returns `true` if copying the field by bitwise assignment would alias
    /// or move owned storage.
    #[must_use]
    pub const fn requires_clone(self) -> bool {
        !matches!(self, Self::Scalar)
    }
}

/// One field of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name as written in source.
    pub name: String,
    /// Normalised type reference.
    pub ty: String,
    /// Shape classification of `ty`.
    pub shape: FieldShape,
    /// Qualifying `+tags` found in the field's comments.
    pub tags: Vec<String>,
}

/// A discovered type-like unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    /// Identifier, relative to its module (`Inner` or `outer::Inner`).
    pub ident: String,
    /// Defining module.
    pub module: ModulePath,
    /// Structural position inside the source file.
    pub location: LocationPath,
    /// Ordered field list.
    pub fields: Vec<FieldDecl>,
    /// Comment text attached directly to the declaration.
    pub comment: String,
    /// Whether the declaration derives `Copy`.
    pub derives_copy: bool,
}

impl RawDeclaration {
    /// Returns `module::Ident` for diagnostics.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.module.is_root() {
            self.ident.clone()
        } else {
            format!("{}::{}", self.module.to_rust_path(""), self.ident)
        }
    }

    /// Returns `true` when copying a value of this type must go through its
    /// own clone rather than a plain assignment.
    #[must_use]
    pub fn requires_clone(&self) -> bool {
        !self.derives_copy || self.fields.iter().any(|field| field.shape.requires_clone())
    }

    /// Attached comment lines with trailing whitespace removed.
    pub fn doc_lines(&self) -> impl Iterator<Item = &str> {
        self.comment.lines().map(str::trim_end)
    }
}

/// A comment block that is separated from the declaration it precedes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedComment {
    /// Location of the declaration the block precedes.
    pub location: LocationPath,
    /// Text of the block.
    pub text: String,
}

/// A pre-loaded source module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceModule {
    /// Module path.
    pub path: ModulePath,
    /// File or descriptor name the module was read from.
    pub origin: String,
    /// Module-level comment text (`//!` docs or a proto package comment).
    pub comment: String,
    /// Declarations in source order.
    pub declarations: Vec<RawDeclaration>,
    /// Detached comment blocks in source order.
    pub detached: Vec<DetachedComment>,
}
