//! Rule flagging `let` bindings that are never read.
//!
//! # Rationale
//!
//! A local that is declared but never read is either dead weight or a typo
//! (the author read a different variable than they thought). Bindings whose
//! name starts with `_` are exempt, matching the language convention for
//! intentionally unused values.
//!
//! # Suppression
//!
//! `// treelint: allow(unused-local)` on or above the declaration.

use treelint_core::utils::is_allowed;
use treelint_core::{
    Accumulator, CompilationUnit, MatchResult, Matcher, MatcherFault, NodeId, NodeKind,
    RuleDescriptor, Severity, Suggestion,
};

use std::collections::HashMap;

/// Rule name for unused-local.
pub const NAME: &str = "unused-local";

/// Flags local variables that are declared but never read.
#[derive(Debug, Clone, Default)]
pub struct UnusedLocal;

impl UnusedLocal {
    /// Creates the rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Descriptor for this rule.
    #[must_use]
    pub fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(
            NAME,
            Severity::Warning,
            vec![NodeKind::Local],
            "local variable is declared but never read",
        )
    }
}

/// Identifier occurrences per name, built once per unit and shared across
/// every `Local` this rule is dispatched for.
struct ReadIndex {
    reads: HashMap<String, Vec<usize>>,
}

impl ReadIndex {
    fn build(unit: &CompilationUnit) -> Self {
        let mut reads: HashMap<String, Vec<usize>> = HashMap::new();
        for id in unit.node_ids() {
            if unit.kind_of(id) == Ok(NodeKind::Ident) {
                if let Ok(Some(symbol)) = unit.symbol_of(id) {
                    if let Ok(span) = unit.span_of(id) {
                        reads.entry(symbol.to_string()).or_default().push(span.start);
                    }
                }
            }
        }
        tracing::debug!(
            path = %unit.path().display(),
            names = reads.len(),
            "built identifier read index"
        );
        Self { reads }
    }

    /// True if `name` is read at or after byte offset `from`.
    fn read_after(&self, name: &str, from: usize) -> bool {
        self.reads
            .get(name)
            .is_some_and(|starts| starts.iter().any(|&s| s >= from))
    }
}

impl Matcher for UnusedLocal {
    fn check(
        &self,
        unit: &CompilationUnit,
        node: NodeId,
        acc: &mut Accumulator,
    ) -> Result<MatchResult, MatcherFault> {
        let Some(name) = unit.symbol_of(node)? else {
            // Destructuring patterns bind several names at once; skip them.
            return Ok(MatchResult::no_match());
        };
        if name.starts_with('_') {
            return Ok(MatchResult::no_match());
        }

        let span = unit.span_of(node)?;
        if is_allowed(unit.source(), span.line, NAME) {
            return Ok(MatchResult::no_match());
        }

        let name = name.to_string();
        let index = acc
            .slot_mut(NAME, || ReadIndex::build(unit))
            .ok_or_else(|| MatcherFault::new("accumulator slot type mismatch"))?;

        // Reads inside the declaration itself (the initializer) refer to an
        // earlier binding, so only occurrences past the declaration count.
        if index.read_after(&name, span.end) {
            return Ok(MatchResult::no_match());
        }

        Ok(MatchResult::matched()
            .with_message(format!("local variable `{name}` is declared but never read"))
            .with_suggestion(Suggestion::new(format!(
                "remove the binding or rename it to `_{name}` if the value is intentionally unused"
            ))))
    }
}
