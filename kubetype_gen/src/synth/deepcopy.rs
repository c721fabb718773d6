//! Deep-copy method bodies.

use crate::model::RawDeclaration;

/// How one field of a generated type is copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CopyStrategy {
    /// Bitwise assignment; only for `Copy` types without owned storage.
    Assign,
    /// `clone_from`, reusing the destination's allocations.
    CloneFrom,
    /// Element-by-element copy through the element type's `deep_copy`.
    Elementwise {
        /// Type whose `deep_copy` is applied to each element.
        element: String,
    },
}

impl CopyStrategy {
    /// Strategy for the `spec` field of a wrapper around `declaration`.
    pub(crate) fn for_spec(declaration: &RawDeclaration) -> Self {
        if declaration.requires_clone() {
            Self::CloneFrom
        } else {
            Self::Assign
        }
    }

    fn statement(&self, field: &str) -> String {
        match self {
            Self::Assign => format!("out.{field} = self.{field};"),
            Self::CloneFrom => format!("out.{field}.clone_from(&self.{field});"),
            Self::Elementwise { element } => {
                format!("out.{field} = self.{field}.iter().map({element}::deep_copy).collect();")
            }
        }
    }
}

/// Renders `deep_copy_into` and `deep_copy` for a type whose fields are
/// copied with the given strategies, in order.
pub(crate) fn field_wise_methods(fields: &[(&str, CopyStrategy)]) -> String {
    let mut body = String::new();
    for (field, strategy) in fields {
        body.push_str("        ");
        body.push_str(&strategy.statement(field));
        body.push('\n');
    }
    methods(&body)
}

/// Renders the pair for a message that is cloned as a whole.
pub(crate) fn whole_value_methods() -> String {
    methods(
        "        let copy = ::core::clone::Clone::clone(self);\n        *out = copy;\n",
    )
}

fn methods(copy_body: &str) -> String {
    format!(
        "    /// Copies the receiver into `out`, sharing no owned data.\n\
         \x20   pub fn deep_copy_into(&self, out: &mut Self) {{\n\
         {copy_body}\
         \x20   }}\n\
         \n\
         \x20   /// Returns an independent copy of the receiver.\n\
         \x20   #[must_use]\n\
         \x20   pub fn deep_copy(&self) -> Self {{\n\
         \x20       let mut out = Self::default();\n\
         \x20       self.deep_copy_into(&mut out);\n\
         \x20       out\n\
         \x20   }}\n"
    )
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
    use crate::model::{FieldDecl, FieldShape, LocationPath, ModulePath};
    use rstest::rstest;

    fn declaration(derives_copy: bool, shape: FieldShape) -> RawDeclaration {
        RawDeclaration {
            ident: "Spec".to_owned(),
            module: ModulePath::new("a/b"),
            location: LocationPath::new(vec![0]),
            fields: vec![FieldDecl {
                name: "value".to_owned(),
                ty: "T".to_owned(),
                shape,
                tags: Vec::new(),
            }],
            comment: String::new(),
            derives_copy,
        }
    }

    #[rstest]
    #[case(true, FieldShape::Scalar, CopyStrategy::Assign)]
    #[case(true, FieldShape::Named, CopyStrategy::CloneFrom)]
    #[case(false, FieldShape::Scalar, CopyStrategy::CloneFrom)]
    #[case(false, FieldShape::Sequence, CopyStrategy::CloneFrom)]
    fn spec_copy_strategy(
        #[case] derives_copy: bool,
        #[case] shape: FieldShape,
        #[case] expected: CopyStrategy,
    ) {
        assert_eq!(CopyStrategy::for_spec(&declaration(derives_copy, shape)), expected);
    }

    #[rstest]
    fn field_wise_methods_list_statements_in_order() {
        let text = field_wise_methods(&[
            ("spec", CopyStrategy::Assign),
            (
                "items",
                CopyStrategy::Elementwise {
                    element: "Widget".to_owned(),
                },
            ),
        ]);
        let spec = text.find("out.spec = self.spec;").expect("spec statement");
        let items = text
            .find("out.items = self.items.iter().map(Widget::deep_copy).collect();")
            .expect("items statement");
        assert!(spec < items);
        assert!(text.contains("    pub fn deep_copy(&self) -> Self {\n"));
    }

    #[rstest]
    fn whole_value_copy_clones_once() {
        let text = whole_value_methods();
        assert_eq!(text.matches("Clone::clone(self)").count(), 1);
        assert!(text.contains("*out = copy;"));
    }
}
