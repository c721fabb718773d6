//! Turns `FileDescriptorProto`s into [`SourceModule`]s.
//!
//! Comments are taken from `SourceCodeInfo`: the leading comment of a
//! message's location is its attached comment and the location's leading
//! detached comments become [`DetachedComment`]s. Identifiers follow the
//! naming `prost-build` uses for generated types.

use std::collections::{HashMap, HashSet};

use heck::{ToSnakeCase, ToUpperCamelCase};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::source_code_info::Location;
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::model::{
    DetachedComment, FieldDecl, FieldShape, LocationPath, ModulePath, RawDeclaration, SourceModule,
};

/// `FileDescriptorProto.package`.
const PACKAGE_FIELD: i32 = 2;
/// `FileDescriptorProto.message_type`.
const MESSAGE_TYPE_FIELD: i32 = 4;
/// `DescriptorProto.nested_type`.
const NESTED_TYPE_FIELD: i32 = 3;

/// Module path of a proto package: `istio.networking.v1alpha3` becomes
/// `istio/networking/v1alpha3`.
#[must_use]
pub fn module_path(package: &str) -> ModulePath {
    ModulePath::from_segments(package.split('.'))
}

/// Loads one descriptor.
///
/// Map-entry messages never become declarations.
#[must_use]
pub fn load_file(file: &FileDescriptorProto) -> SourceModule {
    let locations: HashMap<&[i32], &Location> = file
        .source_code_info
        .iter()
        .flat_map(|info| &info.location)
        .map(|location| (location.path.as_slice(), location))
        .collect();
    let map_entries = map_entry_names(file);

    let mut module = SourceModule {
        path: module_path(file.package()),
        origin: file.name().to_owned(),
        comment: locations
            .get([PACKAGE_FIELD].as_slice())
            .map(|location| comment_text(location.leading_comments()))
            .unwrap_or_default(),
        declarations: Vec::new(),
        detached: Vec::new(),
    };

    let mut loader = Loader {
        locations: &locations,
        map_entries: &map_entries,
        module: &mut module,
    };
    for (index, message) in file.message_type.iter().enumerate() {
        let location = LocationPath::new(vec![MESSAGE_TYPE_FIELD, index_component(index)]);
        loader.message(message, &location, &[]);
    }
    module
}

struct Loader<'a> {
    locations: &'a HashMap<&'a [i32], &'a Location>,
    map_entries: &'a HashSet<String>,
    module: &'a mut SourceModule,
}

impl Loader<'_> {
    fn message(&mut self, message: &DescriptorProto, location: &LocationPath, parents: &[&str]) {
        let is_map_entry = message
            .options
            .as_ref()
            .is_some_and(|options| options.map_entry());
        if is_map_entry {
            return;
        }

        let source = self.locations.get(location.components()).copied();
        if let Some(found) = source {
            self.module
                .detached
                .extend(found.leading_detached_comments.iter().map(|text| DetachedComment {
                    location: location.clone(),
                    text: comment_text(text),
                }));
        }
        let declaration = RawDeclaration {
            ident: rust_ident(parents, message.name()),
            module: self.module.path.clone(),
            location: location.clone(),
            fields: message
                .field
                .iter()
                .map(|field| self.field(field))
                .collect(),
            comment: source
                .map(|found| comment_text(found.leading_comments()))
                .unwrap_or_default(),
            derives_copy: false,
        };
        self.module.declarations.push(declaration);

        let mut nested_parents = parents.to_vec();
        nested_parents.push(message.name());
        for (index, nested) in message.nested_type.iter().enumerate() {
            let nested_location = location.join(&[NESTED_TYPE_FIELD, index_component(index)]);
            self.message(nested, &nested_location, &nested_parents);
        }
    }

    fn field(&self, field: &FieldDescriptorProto) -> FieldDecl {
        let repeated = field.label() == Label::Repeated;
        let is_map = repeated && self.map_entries.contains(field.type_name());
        let shape = if is_map {
            FieldShape::Map
        } else if repeated {
            FieldShape::Sequence
        } else {
            match field.r#type() {
                Type::Message | Type::Group => FieldShape::Optional,
                _ if field.proto3_optional() => FieldShape::Optional,
                Type::String => FieldShape::Text,
                Type::Bytes => FieldShape::Sequence,
                _ => FieldShape::Scalar,
            }
        };
        FieldDecl {
            name: field.name().to_snake_case(),
            ty: scalar_type(field.r#type()).map_or_else(|| field.type_name().to_owned(), str::to_owned),
            shape,
            tags: Vec::new(),
        }
    }
}

/// Fully-qualified names (`.pkg.Outer.LabelsEntry`) of every map-entry
/// message in `file`.
fn map_entry_names(file: &FileDescriptorProto) -> HashSet<String> {
    fn walk(prefix: &str, messages: &[DescriptorProto], out: &mut HashSet<String>) {
        for message in messages {
            let name = format!("{prefix}.{}", message.name());
            if message.options.as_ref().is_some_and(|o| o.map_entry()) {
                out.insert(name.clone());
            }
            walk(&name, &message.nested_type, out);
        }
    }
    let mut out = HashSet::new();
    let prefix = if file.package().is_empty() {
        String::new()
    } else {
        format!(".{}", file.package())
    };
    walk(&prefix, &file.message_type, &mut out);
    out
}

/// `outer::middle::Inner`, matching the modules `prost-build` emits for
/// nested messages.
fn rust_ident(parents: &[&str], name: &str) -> String {
    parents
        .iter()
        .map(|parent| parent.to_snake_case())
        .chain(std::iter::once(name.to_upper_camel_case()))
        .collect::<Vec<_>>()
        .join("::")
}

const fn scalar_type(ty: Type) -> Option<&'static str> {
    match ty {
        Type::Double => Some("f64"),
        Type::Float => Some("f32"),
        Type::Int64 | Type::Sint64 | Type::Sfixed64 => Some("i64"),
        Type::Uint64 | Type::Fixed64 => Some("u64"),
        Type::Int32 | Type::Sint32 | Type::Sfixed32 | Type::Enum => Some("i32"),
        Type::Uint32 | Type::Fixed32 => Some("u32"),
        Type::Bool => Some("bool"),
        Type::String => Some("String"),
        Type::Bytes => Some("Vec<u8>"),
        Type::Message | Type::Group => None,
    }
}

fn comment_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_owned()
}

fn index_component(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}
