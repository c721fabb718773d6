//! Type introspection helpers.
//!
//! These utilities perform shallow inspection of `syn::Type` values to
//! classify fields into [`FieldShape`]s and to render type references as
//! compact strings.

use quote::ToTokens;
use syn::{Attribute, Meta, Type};

use crate::model::FieldShape;

const SCALARS: &[&str] = &[
    "bool", "char", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64",
    "i128", "isize", "f32", "f64",
];
const TEXT: &[&str] = &["String", "str"];
const SEQUENCES: &[&str] = &["Vec", "VecDeque", "LinkedList", "BTreeSet", "HashSet", "IndexSet"];
const MAPS: &[&str] = &["BTreeMap", "HashMap", "IndexMap"];
const BOXES: &[&str] = &["Box", "Rc", "Arc"];

/// Returns the final path segment name of `ty`, ignoring any prefix such as
/// `std::collections::`.
fn last_segment(ty: &Type) -> Option<String> {
    let Type::Path(p) = ty else {
        return None;
    };
    p.path.segments.last().map(|segment| segment.ident.to_string())
}

/// Classifies a field type.
///
/// The check is shallow: `Option<Vec<T>>` is [`FieldShape::Optional`].
pub(crate) fn classify(ty: &Type) -> FieldShape {
    match ty {
        Type::Array(array) => match classify(&array.elem) {
            FieldShape::Scalar => FieldShape::Scalar,
            _ => FieldShape::Sequence,
        },
        Type::Tuple(tuple) if tuple.elems.iter().all(|e| classify(e) == FieldShape::Scalar) => {
            FieldShape::Scalar
        }
        Type::Paren(inner) => classify(&inner.elem),
        Type::Group(inner) => classify(&inner.elem),
        _ => last_segment(ty).map_or(FieldShape::Named, |name| shape_of(&name)),
    }
}

fn shape_of(name: &str) -> FieldShape {
    if SCALARS.contains(&name) {
        FieldShape::Scalar
    } else if TEXT.contains(&name) {
        FieldShape::Text
    } else if SEQUENCES.contains(&name) {
        FieldShape::Sequence
    } else if MAPS.contains(&name) {
        FieldShape::Map
    } else if name == "Option" {
        FieldShape::Optional
    } else if BOXES.contains(&name) {
        FieldShape::Boxed
    } else {
        FieldShape::Named
    }
}

/// Renders a type without the token spacing `quote` inserts.
///
/// `std :: vec :: Vec < String >` becomes `std::vec::Vec<String>`.
pub(crate) fn render(ty: &Type) -> String {
    let spaced = ty.to_token_stream().to_string();
    let mut out = String::with_capacity(spaced.len());
    let mut chars = spaced.chars().peekable();
    while let Some(c) = chars.next() {
        if c != ' ' {
            out.push(c);
            continue;
        }
        let prev = out.chars().last();
        let next = chars.peek().copied();
        let glue = matches!(prev, Some(':' | '<' | '&' | '(' | '['))
            || matches!(next, Some(':' | '<' | '>' | ',' | ')' | ']' | ';'));
        if !glue {
            out.push(' ');
        }
    }
    out
}

/// Returns `true` when `attrs` contain `#[derive(.., Copy, ..)]`.
pub(crate) fn derives_copy(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .any(|attr| {
            let Meta::List(list) = &attr.meta else {
                return false;
            };
            let mut found = false;
            let parsed = list.parse_nested_meta(|meta| {
                if meta.path.segments.last().is_some_and(|s| s.ident == "Copy") {
                    found = true;
                }
                Ok(())
            });
            parsed.is_ok() && found
        })
}
