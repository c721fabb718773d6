//! Rust source synthesis for wrapper, list and deep-copy declarations.
//!
//! Each [`Destination`] becomes one [`GeneratedUnit`]. The text is assembled
//! from small string-producing helpers in a fixed order so that identical
//! input always yields byte-identical output.

mod deepcopy;
mod imports;

use std::collections::BTreeSet;

use camino::Utf8PathBuf;
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::group::{Destination, Member};
use crate::resolve::StatusType;
use deepcopy::CopyStrategy;
use imports::ImportPlan;

pub(crate) use deepcopy::whole_value_methods;
pub(crate) use imports::escape_path;

/// Generator name used in the header of types units.
pub const TYPES_GENERATOR: &str = "kubetype-gen";

/// Knobs controlling synthesised text and file placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthOptions {
    /// Rust path that spec module paths are rooted at.
    pub crate_root: String,
    /// Module providing `TypeMeta`, `ObjectMeta` and `ListMeta`.
    pub meta_module: String,
    /// Status type used when no `status` tag applies.
    pub generic_status: String,
    /// File name of each types unit.
    pub file_name: String,
    /// Generator named in the "generated" marker line; each pipeline uses its
    /// own name when unset.
    pub generated_by: Option<String>,
    /// Text placed verbatim above the marker line.
    pub boilerplate: Option<String>,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            crate_root: "crate".to_owned(),
            meta_module: "kube::core".to_owned(),
            generic_status: "serde_json::Value".to_owned(),
            file_name: "types.rs".to_owned(),
            generated_by: None,
            boilerplate: None,
        }
    }
}

impl SynthOptions {
    /// Header lines: boilerplate, then the marker naming the generator.
    #[must_use]
    pub fn header(&self, default_generator: &str) -> String {
        let mut header = String::new();
        if let Some(boilerplate) = self.boilerplate.as_deref().map(str::trim_end) {
            if !boilerplate.is_empty() {
                header.push_str(boilerplate);
                header.push_str("\n\n");
            }
        }
        let generator = self.generated_by.as_deref().unwrap_or(default_generator);
        header.push_str(&format!("// Code generated by {generator}. DO NOT EDIT.\n"));
        header
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Destination path, relative to the output directory.
    pub path: Utf8PathBuf,
    /// Full file contents.
    pub text: String,
}

/// Relative path of the unit for `destination`.
///
/// The group directory is the first dot-separated label of the API group in
/// snake case.
#[must_use]
pub fn unit_path(destination: &Destination<'_>, options: &SynthOptions) -> Utf8PathBuf {
    let key = destination.key();
    let group_label = key.group.split('.').next().unwrap_or_default();
    let mut path: Utf8PathBuf = key.package.segments().collect();
    path.push(group_label.to_snake_case());
    path.push(&key.version);
    path.push(&options.file_name);
    path
}

/// Synthesises the unit for one destination.
#[must_use]
pub fn synthesize(destination: &Destination<'_>, options: &SynthOptions) -> GeneratedUnit {
    let plan = import_plan(destination, options);
    let mut text = options.header(TYPES_GENERATOR);
    text.push('\n');
    text.push_str("use serde::{Deserialize, Serialize};\n\n");
    text.push_str(&format!(
        "use {}::{{ListMeta, ObjectMeta, TypeMeta}};\n",
        escape_path(&options.meta_module)
    ));
    if !plan.is_empty() {
        text.push('\n');
        text.push_str(&plan.render());
    }

    for member in destination.members() {
        let spec = format!(
            "{}::{}",
            plan.qualifier(&spec_module(member, options)),
            member.declaration.ident
        );
        let status = status_type(&member.config.status, &plan);
        text.push('\n');
        text.push_str(&wrapper_struct(member, &spec, &status));
        text.push('\n');
        text.push_str(&list_struct(&member.config.kind));
        text.push('\n');
        text.push_str(&wrapper_impl(member));
        text.push('\n');
        text.push_str(&list_impl(&member.config.kind));
    }

    let path = unit_path(destination, options);
    tracing::debug!(%path, kinds = destination.members().len(), "synthesised unit");
    GeneratedUnit { path, text }
}

fn spec_module(member: &Member<'_>, options: &SynthOptions) -> String {
    member.declaration.module.to_rust_path(&options.crate_root)
}

fn import_plan(destination: &Destination<'_>, options: &SynthOptions) -> ImportPlan {
    let mut reserved: BTreeSet<String> = [
        "serde",
        "Serialize",
        "Deserialize",
        "TypeMeta",
        "ObjectMeta",
        "ListMeta",
        "Vec",
        "Self",
        "std",
        "core",
        "alloc",
        "crate",
        "self",
        "super",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();
    for root in [&options.meta_module, &options.generic_status] {
        if let Some(first) = root.trim_start_matches("::").split("::").next() {
            reserved.insert(first.to_owned());
        }
    }
    for member in destination.members() {
        reserved.insert(member.config.kind.clone());
        reserved.insert(format!("{}List", member.config.kind));
    }

    let spec_paths: Vec<String> = destination
        .spec_modules()
        .into_iter()
        .map(|module| module.to_rust_path(&options.crate_root))
        .collect();
    let status_paths = destination.status_modules();
    ImportPlan::build(
        spec_paths
            .iter()
            .map(String::as_str)
            .chain(status_paths.iter().copied()),
        &reserved,
    )
}

fn status_type(status: &StatusType, plan: &ImportPlan) -> String {
    match status {
        StatusType::Generic(path) => escape_path(path),
        StatusType::Typed { module, ident } => format!("{}::{ident}", plan.qualifier(module)),
    }
}

fn doc_block(member: &Member<'_>) -> String {
    let mut docs = String::new();
    for line in member.declaration.doc_lines() {
        if line.is_empty() {
            docs.push_str("///\n");
        } else {
            docs.push_str(&format!("/// {line}\n"));
        }
    }
    docs
}

/// Every spec and typed status type must implement these too.
const DERIVES: &str = "#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]\n";

fn wrapper_struct(member: &Member<'_>, spec: &str, status: &str) -> String {
    let kind = &member.config.kind;
    format!(
        "{docs}{DERIVES}pub struct {kind} {{\n\
         \x20   /// API version and kind of the object.\n\
         \x20   #[serde(flatten)]\n\
         \x20   pub types: TypeMeta,\n\
         \x20   /// Standard object metadata.\n\
         \x20   #[serde(default)]\n\
         \x20   pub metadata: ObjectMeta,\n\
         \x20   /// Spec defines the implementation of this definition.\n\
         \x20   #[serde(default)]\n\
         \x20   pub spec: {spec},\n\
         \x20   /// Observed state of the object.\n\
         \x20   #[serde(default)]\n\
         \x20   pub status: {status},\n\
         }}\n",
        docs = doc_block(member),
    )
}

fn list_struct(kind: &str) -> String {
    format!(
        "/// {kind}List is a collection of {kind}s.\n\
         {DERIVES}pub struct {kind}List {{\n\
         \x20   /// API version and kind of the list.\n\
         \x20   #[serde(flatten)]\n\
         \x20   pub types: TypeMeta,\n\
         \x20   /// Standard list metadata.\n\
         \x20   #[serde(default)]\n\
         \x20   pub metadata: ListMeta,\n\
         \x20   /// Items in the list.\n\
         \x20   #[serde(default)]\n\
         \x20   pub items: Vec<{kind}>,\n\
         }}\n"
    )
}

fn wrapper_impl(member: &Member<'_>) -> String {
    let kind = &member.config.kind;
    let spec_copy = CopyStrategy::for_spec(member.declaration);
    let methods = deepcopy::field_wise_methods(&[
        ("types", CopyStrategy::CloneFrom),
        ("metadata", CopyStrategy::CloneFrom),
        ("spec", spec_copy),
        ("status", CopyStrategy::CloneFrom),
    ]);
    format!(
        "impl {kind} {{\n\
         \x20   /// `apiVersion` served for this kind.\n\
         \x20   pub const API_VERSION: &'static str = \"{api_version}\";\n\
         \x20   /// Kind name.\n\
         \x20   pub const KIND: &'static str = \"{kind}\";\n\
         \n\
         {methods}\
         }}\n",
        api_version = member.config.api_version(),
    )
}

fn list_impl(kind: &str) -> String {
    let methods = deepcopy::field_wise_methods(&[
        ("types", CopyStrategy::CloneFrom),
        ("metadata", CopyStrategy::CloneFrom),
        (
            "items",
            CopyStrategy::Elementwise {
                element: kind.to_owned(),
            },
        ),
    ]);
    format!("impl {kind}List {{\n{methods}}}\n")
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
    use crate::error::Diagnostics;
    use crate::group::group;
    use crate::model::{FieldDecl, FieldShape, LocationPath, ModulePath, RawDeclaration};
    use crate::resolve::{TagLayers, resolve};
    use crate::tags::TagConfig;
    use rstest::{fixture, rstest};

    #[fixture]
    fn widget() -> RawDeclaration {
        RawDeclaration {
            ident: "Widget".to_owned(),
            module: ModulePath::new("apis/widgets"),
            location: LocationPath::new(vec![0]),
            fields: vec![FieldDecl {
                name: "size".to_owned(),
                ty: "u32".to_owned(),
                shape: FieldShape::Scalar,
                tags: Vec::new(),
            }],
            comment: "Widget is a test type.\n\n+kubetype-gen".to_owned(),
            derives_copy: true,
        }
    }

    fn unit_for(declaration: &RawDeclaration, tags: &str, options: &SynthOptions) -> GeneratedUnit {
        let own = TagConfig::parse(tags);
        let empty = TagConfig::default();
        let layers = TagLayers::for_candidate(&empty, &empty, &own);
        let config = resolve(declaration, &layers, &options.generic_status).expect("resolves");
        let mut diagnostics = Diagnostics::new();
        let destinations = group([(declaration, config)], &mut diagnostics);
        synthesize(&destinations[0], options)
    }

    #[rstest]
    fn unit_path_uses_snake_cased_first_group_label(widget: RawDeclaration) {
        let unit = unit_for(
            &widget,
            "+kubetype-gen:groupVersion=FooBar.example.io/v1beta1\n+kubetype-gen:package=out/pkg",
            &SynthOptions::default(),
        );
        assert_eq!(unit.path.as_str(), "out/pkg/foo_bar/v1beta1/types.rs");
    }

    #[rstest]
    fn header_and_imports_come_first(widget: RawDeclaration) {
        let options = SynthOptions {
            boilerplate: Some("// Copyright header\n".to_owned()),
            ..SynthOptions::default()
        };
        let unit = unit_for(&widget, "", &options);
        assert!(unit.text.starts_with(
            "// Copyright header\n\n// Code generated by kubetype-gen. DO NOT EDIT.\n\n\
             use serde::{Deserialize, Serialize};\n\n\
             use kube::core::{ListMeta, ObjectMeta, TypeMeta};\n\n\
             use crate::apis::widgets;\n"
        ));
    }

    #[rstest]
    fn wrapper_fields_keep_their_order(widget: RawDeclaration) {
        let unit = unit_for(&widget, "", &SynthOptions::default());
        let positions: Vec<usize> = [
            "pub types: TypeMeta",
            "pub metadata: ObjectMeta",
            "pub spec: widgets::Widget",
            "pub status: serde_json::Value",
        ]
        .iter()
        .map(|needle| unit.text.find(needle).expect("field present"))
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(unit.text.contains("/// Widget is a test type.\n///\n/// +kubetype-gen\n#[derive("));
        assert!(unit.text.contains("pub items: Vec<Widget>,"));
        assert!(unit.text.contains("pub const API_VERSION: &'static str = \"apis/widgets\";"));
    }

    #[rstest]
    fn copy_specs_are_assigned_and_others_cloned(mut widget: RawDeclaration) {
        let assigned = unit_for(&widget, "", &SynthOptions::default());
        assert!(assigned.text.contains("out.spec = self.spec;"));

        widget.fields[0].shape = FieldShape::Sequence;
        let cloned = unit_for(&widget, "", &SynthOptions::default());
        assert!(cloned.text.contains("out.spec.clone_from(&self.spec);"));
        assert!(cloned.text.contains("out.items = self.items.iter().map(Widget::deep_copy).collect();"));
    }

    #[rstest]
    fn typed_status_is_imported(widget: RawDeclaration) {
        let unit = unit_for(
            &widget,
            "+kubetype-gen:status=crate::meta::v1beta1::IstioStatus",
            &SynthOptions::default(),
        );
        assert!(unit.text.contains("use crate::meta::v1beta1;\n"));
        assert!(unit.text.contains("pub status: v1beta1::IstioStatus,"));
    }
}
