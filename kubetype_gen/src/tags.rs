//! Parsing of `+kubetype-gen` comment tags.
//!
//! A comment block enables generation when it contains the bare marker token.
//! Option lines of the form `+kubetype-gen:name=value` populate a key/value
//! map. Unknown option names are retained so newer tags keep round-tripping
//! through older builds, but the resolver only consults [`TagOption`]s.

use std::collections::BTreeMap;
use std::fmt;

/// Marker token enabling generation for a declaration.
pub const MARKER: &str = "+kubetype-gen";

/// Options the resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagOption {
    /// Target API `group/version`.
    GroupVersion,
    /// Destination module path.
    Package,
    /// Fully-qualified status type.
    Status,
}

impl TagOption {
    /// Every recognised option, in resolution order.
    pub const ALL: [Self; 3] = [Self::GroupVersion, Self::Package, Self::Status];

    /// Name of the option as written in a tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GroupVersion => "groupVersion",
            Self::Package => "package",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for TagOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options extracted from one comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagConfig {
    enabled: bool,
    options: BTreeMap<String, String>,
    malformed: Vec<String>,
}

impl TagConfig {
    /// Parses a comment block.
    ///
    /// Lines may still carry comment leaders (`//`, `///`, `*`); they are
    /// stripped before matching.
    ///
    /// ```
    /// use kubetype_gen::{TagConfig, TagOption};
    ///
    /// let tags = TagConfig::parse(
    ///     "Widget is a test type.\n+kubetype-gen\n+kubetype-gen:groupVersion=apps/v1",
    /// );
    /// assert!(tags.is_enabled());
    /// assert_eq!(tags.get(TagOption::GroupVersion), Some("apps/v1"));
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut out = Self::default();
        for raw in text.lines() {
            out.apply_line(strip_comment_leader(raw));
        }
        out
    }

    /// Builds a configuration from explicit option values.
    ///
    /// Used for the process-wide default layer, which is read from settings
    /// rather than comments. Empty values are ignored.
    #[must_use]
    pub fn from_options<I, K, V>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        Self {
            enabled: false,
            options,
            malformed: Vec::new(),
        }
    }

    fn apply_line(&mut self, line: &str) {
        if line.split_whitespace().any(|token| token == MARKER) {
            self.enabled = true;
            return;
        }
        let Some(rest) = line.strip_prefix(MARKER).and_then(|r| r.strip_prefix(':')) else {
            return;
        };
        match rest.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                if !value.trim().is_empty() {
                    self.options
                        .insert(key.trim().to_owned(), value.trim().to_owned());
                }
            }
            _ => self.malformed.push(line.to_owned()),
        }
    }

    /// Whether the block carried the enabling marker.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Value of a recognised option, if present and non-empty.
    #[must_use]
    pub fn get(&self, option: TagOption) -> Option<&str> {
        self.raw(option.as_str())
    }

    /// Value of any option, recognised or not, if present and non-empty.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Option names that the resolver does not recognise.
    pub fn unknown_options(&self) -> impl Iterator<Item = &str> {
        self.options
            .keys()
            .map(String::as_str)
            .filter(|name| TagOption::ALL.iter().all(|known| known.as_str() != *name))
    }

    /// Option lines that could not be parsed and were skipped.
    #[must_use]
    pub fn malformed(&self) -> &[String] {
        &self.malformed
    }

    /// Returns a configuration where options from `over` replace ours.
    ///
    /// An empty value in `over` leaves ours in place. The enabling flag is set
    /// when either side carries it.
    #[must_use]
    pub fn overlay(&self, over: &Self) -> Self {
        let mut options = self.options.clone();
        options.extend(
            over.options
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let mut malformed = self.malformed.clone();
        malformed.extend(over.malformed.iter().cloned());
        Self {
            enabled: self.enabled || over.enabled,
            options,
            malformed,
        }
    }
}

fn strip_comment_leader(line: &str) -> &str {
    let trimmed = line.trim();
    let without = trimmed
        .strip_prefix("///")
        .or_else(|| trimmed.strip_prefix("//!"))
        .or_else(|| trimmed.strip_prefix("//"))
        .or_else(|| trimmed.strip_prefix('*'))
        .unwrap_or(trimmed);
    without.trim()
}
