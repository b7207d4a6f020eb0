//! Flat tree model and read-only query surface over one compilation unit.
//!
//! The host parser's deep expression/item hierarchy is flattened into an
//! arena of [`Node`]s, each tagged with a [`NodeKind`]. Checkers never see
//! `syn` types; they query the unit through [`NodeId`] handles.

use crate::types::Span;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

/// Syntax category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of a compilation unit.
    File,
    /// Inline module.
    Module,
    /// Function or method item.
    Function,
    /// Brace-delimited block.
    Block,
    /// `let` binding statement.
    Local,
    /// Expression statement whose value is discarded.
    ExprStmt,
    /// Free-function or path call.
    Call,
    /// Method call.
    MethodCall,
    /// Macro invocation.
    MacroCall,
    /// Single-segment identifier expression.
    Ident,
    /// Multi-segment path expression.
    Path,
    /// Literal expression.
    Literal,
    /// Any other construct that still owns children.
    Other,
}

/// Best-effort resolved type information for a node.
///
/// The host front-end performs no type inference, so bindings exist only
/// where the source states them (annotated `let` bindings, literals).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    text: String,
}

impl TypeBinding {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Rendered type text, e.g. `Result<u32, Error>`.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Opaque handle to a node within a specific compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    unit: u32,
    index: u32,
}

/// One position in the flattened program tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) span: Span,
    pub(crate) symbol: Option<String>,
    pub(crate) binding: Option<TypeBinding>,
    pub(crate) children: Vec<NodeId>,
}

/// Errors raised by adapter queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The handle was minted by a different compilation unit.
    #[error("node handle from unit {handle_unit} queried against unit {unit}")]
    ForeignHandle {
        /// Unit id recorded in the handle.
        handle_unit: u32,
        /// Unit id of the queried unit.
        unit: u32,
    },

    /// The handle's index does not name a node in this unit.
    #[error("node handle index {index} out of bounds ({len} nodes)")]
    OutOfBounds {
        /// Index recorded in the handle.
        index: u32,
        /// Number of nodes in the unit.
        len: usize,
    },
}

static NEXT_UNIT_ID: AtomicU32 = AtomicU32::new(1);

/// One source file lowered into a flat, immutable tree.
///
/// Owned by the analysis pass; all queries are read-only. Handles carry the
/// unit id, so a [`NodeId`] held past its unit's lifetime fails queries
/// against any other unit instead of silently reading the wrong tree.
#[derive(Debug)]
pub struct CompilationUnit {
    id: u32,
    path: PathBuf,
    source: String,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl CompilationUnit {
    pub(crate) fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            id: NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed),
            path: path.into(),
            source: source.into(),
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Creates a unit with no nodes at all.
    ///
    /// Useful for hosts that want to drive analysis over an empty input.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::new(path, String::new())
    }

    /// File path of this unit.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full source text of this unit.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node, if the unit has any nodes.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes in the unit.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Syntax category of a node.
    ///
    /// # Errors
    ///
    /// Fails with [`AdapterError`] for a foreign or out-of-bounds handle.
    pub fn kind_of(&self, id: NodeId) -> Result<NodeKind, AdapterError> {
        Ok(self.node(id)?.kind)
    }

    /// Ordered children of a node, in source order.
    ///
    /// # Errors
    ///
    /// Fails with [`AdapterError`] for a foreign or out-of-bounds handle.
    pub fn children_of(&self, id: NodeId) -> Result<&[NodeId], AdapterError> {
        Ok(&self.node(id)?.children)
    }

    /// Source span of a node.
    ///
    /// # Errors
    ///
    /// Fails with [`AdapterError`] for a foreign or out-of-bounds handle.
    pub fn span_of(&self, id: NodeId) -> Result<Span, AdapterError> {
        Ok(self.node(id)?.span)
    }

    /// Resolved type binding of a node, when the source states one.
    ///
    /// # Errors
    ///
    /// Fails with [`AdapterError`] for a foreign or out-of-bounds handle.
    pub fn type_of(&self, id: NodeId) -> Result<Option<&TypeBinding>, AdapterError> {
        Ok(self.node(id)?.binding.as_ref())
    }

    /// Identifier, path, or method-name text attached to a node.
    ///
    /// # Errors
    ///
    /// Fails with [`AdapterError`] for a foreign or out-of-bounds handle.
    pub fn symbol_of(&self, id: NodeId) -> Result<Option<&str>, AdapterError> {
        Ok(self.node(id)?.symbol.as_deref())
    }

    /// Source text covered by a span, if the span lies within the unit.
    #[must_use]
    pub fn snippet(&self, span: Span) -> Option<&str> {
        self.source.get(span.start..span.end)
    }

    /// Returns true if the span lies within this unit's source bounds.
    #[must_use]
    pub fn contains(&self, span: Span) -> bool {
        span.start <= span.end && span.end <= self.source.len()
    }

    fn node(&self, id: NodeId) -> Result<&Node, AdapterError> {
        if id.unit != self.id {
            return Err(AdapterError::ForeignHandle {
                handle_unit: id.unit,
                unit: self.id,
            });
        }
        self.nodes
            .get(id.index as usize)
            .ok_or(AdapterError::OutOfBounds {
                index: id.index,
                len: self.nodes.len(),
            })
    }

    /// Allocates a node and returns its handle. Children are patched in
    /// afterwards so that arena order is pre-order.
    pub(crate) fn alloc(
        &mut self,
        kind: NodeKind,
        span: Span,
        symbol: Option<String>,
        binding: Option<TypeBinding>,
    ) -> NodeId {
        let id = NodeId {
            unit: self.id,
            index: u32::try_from(self.nodes.len()).unwrap_or(u32::MAX),
        };
        self.nodes.push(Node {
            kind,
            span,
            symbol,
            binding,
            children: Vec::new(),
        });
        id
    }

    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        if id.unit == self.id {
            if let Some(node) = self.nodes.get_mut(id.index as usize) {
                node.children = children;
            }
        }
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Iterates all node handles in arena (pre-order) order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let unit = self.id;
        (0..self.nodes.len()).map(move |index| NodeId {
            unit,
            index: u32::try_from(index).unwrap_or(u32::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_with_one_node() -> (CompilationUnit, NodeId) {
        let mut unit = CompilationUnit::new("test.rs", "fn main() {}");
        let root = unit.alloc(NodeKind::File, Span::new(0, 12, 1, 1), None, None);
        unit.set_root(root);
        (unit, root)
    }

    #[test]
    fn queries_resolve_on_owning_unit() {
        let (unit, root) = unit_with_one_node();
        assert_eq!(unit.kind_of(root), Ok(NodeKind::File));
        assert_eq!(unit.span_of(root).map(|s| s.len()), Ok(12));
        assert_eq!(unit.children_of(root).map(<[NodeId]>::len), Ok(0));
        assert_eq!(unit.symbol_of(root), Ok(None));
        assert_eq!(unit.type_of(root), Ok(None));
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let (unit_a, root_a) = unit_with_one_node();
        let (unit_b, _) = unit_with_one_node();
        drop(unit_a);

        match unit_b.kind_of(root_a) {
            Err(AdapterError::ForeignHandle { .. }) => {}
            other => panic!("expected ForeignHandle, got {other:?}"),
        }
    }

    #[test]
    fn empty_unit_has_no_root() {
        let unit = CompilationUnit::empty("empty.rs");
        assert!(unit.root().is_none());
        assert_eq!(unit.node_count(), 0);
    }

    #[test]
    fn snippet_and_bounds() {
        let (unit, root) = unit_with_one_node();
        let span = unit.span_of(root).unwrap();
        assert_eq!(unit.snippet(span), Some("fn main() {}"));
        assert!(unit.contains(span));
        assert!(!unit.contains(Span::new(0, 1000, 1, 1)));
    }
}
