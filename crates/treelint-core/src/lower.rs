//! Lowering from the host parser's AST into the flat tree model.
//!
//! One source file parses with `syn::parse_file` and lowers into a
//! [`CompilationUnit`] whose arena is laid out in pre-order: a node is
//! allocated before any of its children, so arena order equals traversal
//! order.

use crate::tree::{CompilationUnit, NodeId, NodeKind, TypeBinding};
use crate::types::Span;

use proc_macro2::{LineColumn, TokenStream, TokenTree};
use std::path::{Path, PathBuf};
use syn::spanned::Spanned;
use syn::visit::Visit;
use tracing::debug;

/// Errors raised while lowering a source file.
#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    /// IO error reading the file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The source does not parse as Rust.
    #[error("parse error in {path}: {message}")]
    Parse {
        /// Path of the file that failed to parse.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },
}

/// Reads and lowers one source file from disk.
///
/// # Errors
///
/// Returns [`LowerError`] if the file cannot be read or parsed.
pub fn lower_file(path: &Path) -> Result<CompilationUnit, LowerError> {
    let source = std::fs::read_to_string(path).map_err(|e| LowerError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    lower_source(path, &source)
}

/// Parses and lowers one source text into a compilation unit.
///
/// # Errors
///
/// Returns [`LowerError::Parse`] if the source does not parse.
pub fn lower_source(path: impl AsRef<Path>, source: &str) -> Result<CompilationUnit, LowerError> {
    let path = path.as_ref();
    let ast = syn::parse_file(source).map_err(|e| LowerError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut lowerer = Lowerer {
        unit: CompilationUnit::new(path, source),
        lines: LineIndex::new(source),
        source,
    };

    let root = lowerer.unit.alloc(
        NodeKind::File,
        Span::new(0, source.len(), 1, 1),
        None,
        None,
    );
    let children: Vec<NodeId> = ast.items.iter().map(|i| lowerer.lower_item(i)).collect();
    lowerer.unit.set_children(root, children);
    lowerer.unit.set_root(root);

    debug!(
        path = %path.display(),
        nodes = lowerer.unit.node_count(),
        "lowered compilation unit"
    );
    Ok(lowerer.unit)
}

/// Byte offsets of line starts, for LineColumn-to-offset conversion.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    /// Converts a 1-indexed line / 0-indexed char column into a byte offset.
    fn offset(&self, source: &str, lc: LineColumn) -> usize {
        if lc.line == 0 {
            return 0;
        }
        let Some(&line_start) = self.starts.get(lc.line - 1) else {
            return source.len();
        };
        let line_end = self.starts.get(lc.line).copied().unwrap_or(source.len());
        let mut offset = line_start;
        let mut remaining = lc.column;
        for ch in source[line_start..line_end].chars() {
            if remaining == 0 {
                break;
            }
            offset += ch.len_utf8();
            remaining -= 1;
        }
        offset.min(source.len())
    }
}

struct Lowerer<'src> {
    unit: CompilationUnit,
    lines: LineIndex,
    source: &'src str,
}

impl Lowerer<'_> {
    fn span(&self, s: proc_macro2::Span) -> Span {
        let start = s.start();
        let end = s.end();
        if start.line == 0 {
            return Span::default();
        }
        Span::new(
            self.lines.offset(self.source, start),
            self.lines.offset(self.source, end),
            start.line,
            start.column + 1,
        )
    }

    fn lower_item(&mut self, item: &syn::Item) -> NodeId {
        let span = self.span(item.span());
        match item {
            syn::Item::Fn(f) => {
                let id = self.unit.alloc(
                    NodeKind::Function,
                    span,
                    Some(f.sig.ident.to_string()),
                    None,
                );
                let body = self.lower_block(&f.block);
                self.unit.set_children(id, vec![body]);
                id
            }
            syn::Item::Mod(m) => {
                let id =
                    self.unit
                        .alloc(NodeKind::Module, span, Some(m.ident.to_string()), None);
                let children = m.content.as_ref().map_or_else(Vec::new, |(_, items)| {
                    items.iter().map(|i| self.lower_item(i)).collect()
                });
                self.unit.set_children(id, children);
                id
            }
            syn::Item::Const(c) => {
                let id = self
                    .unit
                    .alloc(NodeKind::Other, span, Some(c.ident.to_string()), None);
                let init = self.lower_expr(&c.expr);
                self.unit.set_children(id, vec![init]);
                id
            }
            syn::Item::Static(s) => {
                let id = self
                    .unit
                    .alloc(NodeKind::Other, span, Some(s.ident.to_string()), None);
                let init = self.lower_expr(&s.expr);
                self.unit.set_children(id, vec![init]);
                id
            }
            syn::Item::Impl(im) => {
                let id = self.unit.alloc(NodeKind::Other, span, None, None);
                let children = im.items.iter().map(|ii| self.lower_impl_item(ii)).collect();
                self.unit.set_children(id, children);
                id
            }
            syn::Item::Trait(t) => {
                let id = self
                    .unit
                    .alloc(NodeKind::Other, span, Some(t.ident.to_string()), None);
                let children = t
                    .items
                    .iter()
                    .filter_map(|ti| self.lower_trait_item(ti))
                    .collect();
                self.unit.set_children(id, children);
                id
            }
            syn::Item::Macro(m) => self.lower_macro(&m.mac),
            _ => self.unit.alloc(NodeKind::Other, span, None, None),
        }
    }

    fn lower_impl_item(&mut self, item: &syn::ImplItem) -> NodeId {
        let span = self.span(item.span());
        match item {
            syn::ImplItem::Fn(f) => {
                let id = self.unit.alloc(
                    NodeKind::Function,
                    span,
                    Some(f.sig.ident.to_string()),
                    None,
                );
                let body = self.lower_block(&f.block);
                self.unit.set_children(id, vec![body]);
                id
            }
            syn::ImplItem::Const(c) => {
                let id = self
                    .unit
                    .alloc(NodeKind::Other, span, Some(c.ident.to_string()), None);
                let init = self.lower_expr(&c.expr);
                self.unit.set_children(id, vec![init]);
                id
            }
            _ => self.unit.alloc(NodeKind::Other, span, None, None),
        }
    }

    fn lower_trait_item(&mut self, item: &syn::TraitItem) -> Option<NodeId> {
        if let syn::TraitItem::Fn(f) = item {
            if let Some(block) = &f.default {
                let span = self.span(item.span());
                let id = self.unit.alloc(
                    NodeKind::Function,
                    span,
                    Some(f.sig.ident.to_string()),
                    None,
                );
                let body = self.lower_block(block);
                self.unit.set_children(id, vec![body]);
                return Some(id);
            }
        }
        None
    }

    fn lower_block(&mut self, block: &syn::Block) -> NodeId {
        let span = self.span(block.span());
        let id = self.unit.alloc(NodeKind::Block, span, None, None);
        let children = block.stmts.iter().map(|s| self.lower_stmt(s)).collect();
        self.unit.set_children(id, children);
        id
    }

    fn lower_stmt(&mut self, stmt: &syn::Stmt) -> NodeId {
        match stmt {
            syn::Stmt::Local(local) => self.lower_local(local),
            syn::Stmt::Item(item) => self.lower_item(item),
            syn::Stmt::Expr(expr, Some(_)) => {
                let span = self.span(expr.span());
                let id = self.unit.alloc(NodeKind::ExprStmt, span, None, None);
                let inner = self.lower_expr(expr);
                self.unit.set_children(id, vec![inner]);
                id
            }
            syn::Stmt::Expr(expr, None) => self.lower_expr(expr),
            syn::Stmt::Macro(sm) => self.lower_macro(&sm.mac),
        }
    }

    fn lower_local(&mut self, local: &syn::Local) -> NodeId {
        let span = self.span(local.span());
        let (symbol, binding) = pat_binding(&local.pat);
        let id = self.unit.alloc(NodeKind::Local, span, symbol, binding);

        let mut children = Vec::new();
        if let Some(init) = &local.init {
            children.push(self.lower_expr(&init.expr));
            if let Some((_, diverge)) = &init.diverge {
                children.push(self.lower_expr(diverge));
            }
        }
        self.unit.set_children(id, children);
        id
    }

    fn lower_expr(&mut self, expr: &syn::Expr) -> NodeId {
        let span = self.span(expr.span());
        match expr {
            syn::Expr::MethodCall(mc) => {
                let id = self.unit.alloc(
                    NodeKind::MethodCall,
                    span,
                    Some(mc.method.to_string()),
                    None,
                );
                let mut children = vec![self.lower_expr(&mc.receiver)];
                children.extend(mc.args.iter().map(|a| self.lower_expr(a)));
                self.unit.set_children(id, children);
                id
            }
            syn::Expr::Call(c) => {
                let symbol = match &*c.func {
                    syn::Expr::Path(p) if p.qself.is_none() => Some(path_text(&p.path)),
                    _ => None,
                };
                let has_symbol = symbol.is_some();
                let id = self.unit.alloc(NodeKind::Call, span, symbol, None);
                let mut children = Vec::new();
                if !has_symbol {
                    children.push(self.lower_expr(&c.func));
                }
                children.extend(c.args.iter().map(|a| self.lower_expr(a)));
                self.unit.set_children(id, children);
                id
            }
            syn::Expr::Path(p) => {
                if p.qself.is_none()
                    && p.path.leading_colon.is_none()
                    && p.path.segments.len() == 1
                {
                    let name = p.path.segments[0].ident.to_string();
                    self.unit.alloc(NodeKind::Ident, span, Some(name), None)
                } else {
                    self.unit
                        .alloc(NodeKind::Path, span, Some(path_text(&p.path)), None)
                }
            }
            syn::Expr::Lit(l) => {
                let binding = lit_binding(&l.lit);
                self.unit.alloc(NodeKind::Literal, span, None, binding)
            }
            syn::Expr::Macro(m) => self.lower_macro(&m.mac),
            // Parens and none-delimited groups are syntactic noise; lowering
            // drops them so receiver chains stay contiguous.
            syn::Expr::Paren(p) => self.lower_expr(&p.expr),
            syn::Expr::Group(g) => self.lower_expr(&g.expr),
            syn::Expr::Block(b) => self.lower_block(&b.block),
            other => {
                let id = self.unit.alloc(NodeKind::Other, span, None, None);
                let mut collector = ChildCollector {
                    lowerer: self,
                    children: Vec::new(),
                };
                syn::visit::visit_expr(&mut collector, other);
                let children = collector.children;
                self.unit.set_children(id, children);
                id
            }
        }
    }

    fn lower_macro(&mut self, mac: &syn::Macro) -> NodeId {
        let span = self.span(mac.span());
        let id = self
            .unit
            .alloc(NodeKind::MacroCall, span, Some(path_text(&mac.path)), None);
        let mut children = Vec::new();
        self.collect_token_idents(mac.tokens.clone(), &mut children);
        self.unit.set_children(id, children);
        id
    }

    /// Lowers identifier tokens inside a macro body as `Ident` nodes so that
    /// name-based rules see through macro invocations. String literals are
    /// scanned for `{name}` format captures for the same reason.
    fn collect_token_idents(&mut self, tokens: TokenStream, out: &mut Vec<NodeId>) {
        for tt in tokens {
            match tt {
                TokenTree::Ident(ident) => {
                    let span = self.span(ident.span());
                    out.push(
                        self.unit
                            .alloc(NodeKind::Ident, span, Some(ident.to_string()), None),
                    );
                }
                TokenTree::Group(group) => {
                    self.collect_token_idents(group.stream(), out);
                }
                TokenTree::Literal(lit) => {
                    let span = self.span(lit.span());
                    for name in format_captures(&lit.to_string()) {
                        out.push(self.unit.alloc(NodeKind::Ident, span, Some(name), None));
                    }
                }
                TokenTree::Punct(_) => {}
            }
        }
    }
}

/// Collects the immediate constituents of an expression that has no
/// dedicated lowering arm. Sub-expressions, blocks, and nested items lower
/// fully; patterns and types are not reads and produce no nodes.
struct ChildCollector<'l, 'src> {
    lowerer: &'l mut Lowerer<'src>,
    children: Vec<NodeId>,
}

impl<'ast> Visit<'ast> for ChildCollector<'_, '_> {
    fn visit_expr(&mut self, node: &'ast syn::Expr) {
        let id = self.lowerer.lower_expr(node);
        self.children.push(id);
    }

    fn visit_block(&mut self, node: &'ast syn::Block) {
        let id = self.lowerer.lower_block(node);
        self.children.push(id);
    }

    fn visit_item(&mut self, node: &'ast syn::Item) {
        let id = self.lowerer.lower_item(node);
        self.children.push(id);
    }

    fn visit_macro(&mut self, node: &'ast syn::Macro) {
        let id = self.lowerer.lower_macro(node);
        self.children.push(id);
    }

    fn visit_pat(&mut self, _node: &'ast syn::Pat) {}

    fn visit_type(&mut self, _node: &'ast syn::Type) {}

    fn visit_attribute(&mut self, _node: &'ast syn::Attribute) {}
}

/// Extracts the bound name and stated type from a `let` pattern.
fn pat_binding(pat: &syn::Pat) -> (Option<String>, Option<TypeBinding>) {
    match pat {
        syn::Pat::Ident(pi) => (Some(pi.ident.to_string()), None),
        syn::Pat::Type(pt) => {
            let (symbol, _) = pat_binding(&pt.pat);
            (symbol, Some(TypeBinding::new(type_text(&pt.ty))))
        }
        _ => (None, None),
    }
}

/// Renders a path as written, without generic arguments.
fn path_text(path: &syn::Path) -> String {
    let mut text = String::new();
    if path.leading_colon.is_some() {
        text.push_str("::");
    }
    for (i, segment) in path.segments.iter().enumerate() {
        if i > 0 {
            text.push_str("::");
        }
        text.push_str(&segment.ident.to_string());
    }
    text
}

/// Renders a type with token-stream spacing collapsed.
fn type_text(ty: &syn::Type) -> String {
    quote::quote!(#ty)
        .to_string()
        .replace(" :: ", "::")
        .replace(" < ", "<")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}

/// Infers a binding for literals whose type the source states.
fn lit_binding(lit: &syn::Lit) -> Option<TypeBinding> {
    let text = match lit {
        syn::Lit::Int(i) => {
            if i.suffix().is_empty() {
                "i32"
            } else {
                return Some(TypeBinding::new(i.suffix()));
            }
        }
        syn::Lit::Float(f) => {
            if f.suffix().is_empty() {
                "f64"
            } else {
                return Some(TypeBinding::new(f.suffix()));
            }
        }
        syn::Lit::Str(_) => "&str",
        syn::Lit::ByteStr(_) => "&[u8]",
        syn::Lit::Byte(_) => "u8",
        syn::Lit::Char(_) => "char",
        syn::Lit::Bool(_) => "bool",
        _ => return None,
    };
    Some(TypeBinding::new(text))
}

/// Names captured implicitly by format-style string literals, e.g. `x` in
/// `"{x}"` or `"{x:?}"`.
fn format_captures(literal: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = literal;
    while let Some(open) = rest.find('{') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find('}') else { break };
        let body = &rest[..close];
        let name = body.split(':').next().unwrap_or(body);
        if !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_')
            && !name.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            names.push(name.to_string());
        }
        rest = &rest[close + 1..];
    }
    names
}
