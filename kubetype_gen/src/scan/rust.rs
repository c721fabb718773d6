//! Loads Rust source files into [`SourceModule`]s.
//!
//! `///` doc comments are the attached comment of an item and `//!` docs are
//! the module-level comment. Plain `//` comment blocks never reach the `syn`
//! tree, so they are lexed separately and attached by line range: every block
//! sitting between the previous sibling item and a declaration becomes one of
//! that declaration's detached comments.

use proc_macro2::{Span, TokenTree};
use quote::ToTokens;
use syn::{AttrStyle, Attribute, Expr, Fields, Item, Lit, Meta};

use super::type_utils::{classify, derives_copy, render};
use crate::error::KubetypeError;
use crate::model::{
    DetachedComment, FieldDecl, LocationPath, ModulePath, RawDeclaration, SourceModule,
};

/// A Rust source file handed to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustSource {
    /// Module path the file defines.
    pub module: ModulePath,
    /// Where the text was read from, for diagnostics.
    pub origin: String,
    /// File contents.
    pub text: String,
}

impl RustSource {
    /// Creates a source for an explicit module path.
    #[must_use]
    pub fn new(module: ModulePath, origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            module,
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// Maps a file path relative to a source root onto the module it defines.
///
/// `a/b.rs` and `a/b/mod.rs` both define `a/b`; `lib.rs` and `main.rs` at
/// the root define the root module.
#[must_use]
pub fn module_for_file(relative: &str) -> ModulePath {
    let normalised = relative.replace('\\', "/");
    let without_ext = normalised.strip_suffix(".rs").unwrap_or(&normalised);
    let mut segments: Vec<&str> = without_ext
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if let Some(last) = segments.last().copied() {
        let is_root_file = segments.len() == 1 && matches!(last, "lib" | "main");
        if last == "mod" || is_root_file {
            segments.pop();
        }
    }
    ModulePath::from_segments(segments)
}

/// Parses one source file into its file module plus one module per inline
/// `mod name { .. }` block.
///
/// # Errors
///
/// Returns [`KubetypeError::ModuleLoad`] when `syn` rejects the file.
pub fn parse_source(source: &RustSource) -> Result<Vec<SourceModule>, KubetypeError> {
    let file = syn::parse_file(&source.text).map_err(|err| {
        let start = err.span().start();
        KubetypeError::ModuleLoad {
            module: source.module.to_string(),
            origin: source.origin.clone(),
            message: format!("{err} at line {}, column {}", start.line, start.column),
        }
    })?;
    let blocks = lex_comment_blocks(&source.text);
    let mut walker = Walker {
        origin: &source.origin,
        blocks: &blocks,
        modules: Vec::new(),
    };
    walker.collect(
        source.module.clone(),
        doc_text(&file.attrs, Some(DocStyle::Inner)),
        &file.items,
        &LocationPath::default(),
        0,
    );
    Ok(walker.modules)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CommentBlock {
    first_line: usize,
    last_line: usize,
    text: String,
}

/// Groups consecutive plain `//` comment lines into blocks.
fn lex_comment_blocks(text: &str) -> Vec<CommentBlock> {
    let mut blocks: Vec<CommentBlock> = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let Some(body) = plain_comment_body(raw) else {
            continue;
        };
        match blocks.last_mut() {
            Some(block) if block.last_line + 1 == line => {
                block.last_line = line;
                block.text.push('\n');
                block.text.push_str(body);
            }
            _ => blocks.push(CommentBlock {
                first_line: line,
                last_line: line,
                text: body.to_owned(),
            }),
        }
    }
    blocks
}

fn plain_comment_body(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_start();
    let is_doc = (trimmed.starts_with("///") && !trimmed.starts_with("////"))
        || trimmed.starts_with("//!");
    if is_doc {
        return None;
    }
    let body = trimmed.strip_prefix("//")?;
    Some(body.strip_prefix(' ').unwrap_or(body).trim_end())
}

struct Walker<'a> {
    origin: &'a str,
    blocks: &'a [CommentBlock],
    modules: Vec<SourceModule>,
}

impl Walker<'_> {
    fn collect(
        &mut self,
        path: ModulePath,
        comment: String,
        items: &[Item],
        base: &LocationPath,
        container_line: usize,
    ) {
        let mut module = SourceModule {
            path,
            origin: self.origin.to_owned(),
            comment,
            declarations: Vec::new(),
            detached: Vec::new(),
        };
        let mut previous_end = container_line;
        let mut nested = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let location = base.join(&[i32::try_from(index).unwrap_or(i32::MAX)]);
            let (first, last) = item_lines(item).unwrap_or((previous_end, previous_end));

            if let Some(declaration) = declaration_for(item, &module.path, &location) {
                module.detached.extend(
                    self.blocks
                        .iter()
                        .filter(|b| b.first_line > previous_end && b.last_line < first)
                        .map(|b| DetachedComment {
                            location: location.clone(),
                            text: b.text.clone(),
                        }),
                );
                module.declarations.push(declaration);
            } else if let Item::Mod(inner) = item {
                if let Some((brace, content)) = &inner.content {
                    nested.push((
                        module.path.child(&inner.ident.to_string()),
                        doc_text(&inner.attrs, None),
                        content,
                        location,
                        brace.span.open().start().line,
                    ));
                }
            }
            previous_end = last;
        }

        self.modules.push(module);
        for (path, comment, content, location, line) in nested {
            self.collect(path, comment, content, &location, line);
        }
    }
}

fn declaration_for(item: &Item, module: &ModulePath, location: &LocationPath) -> Option<RawDeclaration> {
    let (ident, attrs, fields) = match item {
        Item::Struct(s) => (&s.ident, &s.attrs, field_decls(&s.fields)),
        Item::Enum(e) => (&e.ident, &e.attrs, Vec::new()),
        _ => return None,
    };
    Some(RawDeclaration {
        ident: ident.to_string(),
        module: module.clone(),
        location: location.clone(),
        fields,
        comment: doc_text(attrs, Some(DocStyle::Outer)),
        derives_copy: derives_copy(attrs),
    })
}

fn field_decls(fields: &Fields) -> Vec<FieldDecl> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let doc = doc_text(&field.attrs, None);
            FieldDecl {
                name: field
                    .ident
                    .as_ref()
                    .map_or_else(|| index.to_string(), ToString::to_string),
                ty: render(&field.ty),
                shape: classify(&field.ty),
                tags: doc
                    .lines()
                    .map(str::trim)
                    .filter(|line| line.starts_with('+'))
                    .map(str::to_owned)
                    .collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocStyle {
    /// `//!` and `#![doc]`.
    Inner,
    /// `///` and `#[doc]`.
    Outer,
}

impl DocStyle {
    const fn matches(self, style: AttrStyle) -> bool {
        match self {
            Self::Inner => matches!(style, AttrStyle::Inner(_)),
            Self::Outer => matches!(style, AttrStyle::Outer),
        }
    }
}

/// Joins the `#[doc]` attributes of the requested style into one block.
fn doc_text(attrs: &[Attribute], style: Option<DocStyle>) -> String {
    attrs
        .iter()
        .filter(|attr| style.is_none_or(|wanted| wanted.matches(attr.style)))
        .filter_map(|attr| {
            let Meta::NameValue(nv) = &attr.meta else {
                return None;
            };
            if !nv.path.is_ident("doc") {
                return None;
            }
            let Expr::Lit(expr) = &nv.value else {
                return None;
            };
            let Lit::Str(text) = &expr.lit else {
                return None;
            };
            Some(text.value())
        })
        .flat_map(|value| {
            value
                .lines()
                .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end().to_owned())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// First and last source line covered by an item, attributes included.
fn item_lines(item: &Item) -> Option<(usize, usize)> {
    let tokens = item.to_token_stream();
    let mut iter = tokens.into_iter();
    let first = iter.next()?;
    let last = iter.last().unwrap_or_else(|| first.clone());
    Some((first.span().start().line, closing_span(&last).end().line))
}

fn closing_span(tree: &TokenTree) -> Span {
    match tree {
        TokenTree::Group(group) => group.span_close(),
        other => other.span(),
    }
}
