//! Import aliasing for generated units.

use std::collections::{BTreeMap, BTreeSet};

/// Module imports of one unit with their assigned aliases.
///
/// Paths are processed in sorted order, so aliases depend only on the set of
/// paths and the reserved names.
#[derive(Debug, Clone, Default)]
pub(crate) struct ImportPlan {
    aliases: BTreeMap<String, String>,
}

impl ImportPlan {
    /// Plans imports for `paths`, avoiding every name in `reserved`.
    pub(crate) fn build<'a, I>(paths: I, reserved: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sorted: BTreeSet<&str> = paths.into_iter().collect();
        let mut taken = reserved.clone();
        let mut aliases = BTreeMap::new();
        for path in sorted {
            let segments: Vec<&str> = path
                .trim_start_matches("::")
                .split("::")
                .filter(|s| !s.is_empty())
                .collect();
            let Some((last, parents)) = segments.split_last() else {
                continue;
            };
            if parents.is_empty() {
                continue;
            }
            let alias = pick_alias(last, parents.last().copied(), &taken);
            taken.insert(alias.clone());
            aliases.insert(path.to_owned(), alias);
        }
        Self { aliases }
    }

    /// Name that refers to the module at `path` inside the unit.
    ///
    /// Single-segment paths such as `crate` are used as written.
    pub(crate) fn qualifier(&self, path: &str) -> String {
        self.aliases
            .get(path)
            .map_or_else(|| escape_path(path), |alias| escape_segment(alias))
    }

    /// `use` lines in path order.
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        for (path, alias) in &self.aliases {
            let last = path.rsplit("::").next().unwrap_or_default();
            let line = if last == alias {
                format!("use {};\n", escape_path(path))
            } else {
                format!("use {} as {};\n", escape_path(path), escape_segment(alias))
            };
            out.push_str(&line);
        }
        out
    }

    /// Returns `true` when nothing needs importing.
    pub(crate) fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn pick_alias(last: &str, parent: Option<&str>, taken: &BTreeSet<String>) -> String {
    if !taken.contains(last) {
        return last.to_owned();
    }
    let base = parent.map_or_else(|| last.to_owned(), |p| format!("{p}_{last}"));
    if !taken.contains(&base) {
        return base;
    }
    (2_usize..)
        .map(|n| format!("{base}_{n}"))
        .find(|alias| !taken.contains(alias))
        .unwrap_or(base)
}

/// Writes `segment` as an identifier, using the raw form for reserved words.
pub(crate) fn escape_segment(segment: &str) -> String {
    let plain = syn::parse_str::<syn::Ident>(segment).is_ok();
    let keeps_plain = plain || matches!(segment, "crate" | "self" | "super" | "Self");
    if keeps_plain {
        segment.to_owned()
    } else {
        format!("r#{segment}")
    }
}

/// Escapes every segment of a `::` path.
pub(crate) fn escape_path(path: &str) -> String {
    let prefix = if path.starts_with("::") { "::" } else { "" };
    let body = path
        .trim_start_matches("::")
        .split("::")
        .map(escape_segment)
        .collect::<Vec<_>>()
        .join("::");
    format!("{prefix}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reserved(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[rstest]
    fn last_segment_is_the_default_alias() {
        let plan = ImportPlan::build(["crate::apis::defaults"], &reserved(&[]));
        assert_eq!(plan.qualifier("crate::apis::defaults"), "defaults");
        assert_eq!(plan.render(), "use crate::apis::defaults;\n");
    }

    #[rstest]
    fn colliding_aliases_take_the_parent_segment() {
        let plan = ImportPlan::build(
            ["crate::networking::v1", "crate::meta::v1", "crate::x::meta_v1"],
            &reserved(&[]),
        );
        assert_eq!(plan.qualifier("crate::meta::v1"), "v1");
        assert_eq!(plan.qualifier("crate::networking::v1"), "networking_v1");
        assert_eq!(plan.qualifier("crate::x::meta_v1"), "meta_v1");
        assert_eq!(
            plan.render(),
            "use crate::meta::v1;\nuse crate::networking::v1 as networking_v1;\nuse crate::x::meta_v1;\n"
        );
    }

    #[rstest]
    fn reserved_names_force_a_numbered_alias() {
        let plan = ImportPlan::build(["a::serde"], &reserved(&["serde", "a_serde"]));
        assert_eq!(plan.qualifier("a::serde"), "a_serde_2");
    }

    #[rstest]
    fn single_segment_paths_are_not_imported() {
        let plan = ImportPlan::build(["crate"], &reserved(&[]));
        assert!(plan.is_empty());
        assert_eq!(plan.qualifier("crate"), "crate");
    }

    #[rstest]
    fn keywords_are_written_as_raw_identifiers() {
        let plan = ImportPlan::build(["crate::success::defaults::override"], &reserved(&[]));
        assert_eq!(plan.qualifier("crate::success::defaults::override"), "r#override");
        assert_eq!(plan.render(), "use crate::success::defaults::r#override;\n");
    }
}
