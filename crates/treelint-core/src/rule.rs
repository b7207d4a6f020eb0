//! Rule contract: descriptors, matchers, match results, and the
//! accumulator threaded through one traversal.

use crate::tree::{AdapterError, CompilationUnit, NodeId, NodeKind};
use crate::types::{Severity, Span, Suggestion};

use std::any::Any;
use std::collections::HashMap;

/// Static metadata for one rule.
///
/// Created at registration time; immutable afterwards and shared for the
/// lifetime of the registry.
#[derive(Debug, Clone)]
pub struct RuleDescriptor {
    /// Kebab-case rule name, unique within a registry.
    pub name: String,
    /// Severity assigned to this rule's diagnostics.
    pub severity: Severity,
    /// Node kinds this rule is dispatched for. Must be non-empty.
    pub kinds: Vec<NodeKind>,
    /// Message used when the matcher does not provide its own.
    pub message: String,
}

impl RuleDescriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        kinds: Vec<NodeKind>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            severity,
            kinds,
            message: message.into(),
        }
    }

    /// Returns the descriptor with its severity replaced.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Outcome of testing one rule against one node.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub(crate) matched: bool,
    pub(crate) message: Option<String>,
    pub(crate) span: Option<Span>,
    pub(crate) suggestion: Option<Suggestion>,
}

impl MatchResult {
    /// The node does not match.
    #[must_use]
    pub fn no_match() -> Self {
        Self::default()
    }

    /// The node matches; the descriptor's message template is used unless
    /// overridden with [`MatchResult::with_message`].
    #[must_use]
    pub fn matched() -> Self {
        Self {
            matched: true,
            ..Self::default()
        }
    }

    /// Returns true if the node matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// Overrides the message template with a node-specific message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Narrows the diagnostic to a sub-span of the matched node.
    #[must_use]
    pub fn at_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attaches a suggested remedy.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }
}

/// Unexpected failure inside one rule's logic.
///
/// Faults are isolated per node per rule: the driver logs the fault, skips
/// the rule for that node, and continues traversal.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct MatcherFault {
    message: String,
}

impl MatcherFault {
    /// Creates a fault with a description of what went wrong.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AdapterError> for MatcherFault {
    fn from(e: AdapterError) -> Self {
        Self::new(e.to_string())
    }
}

/// Per-unit scratch state for rules that correlate across nodes.
///
/// The driver creates one accumulator per compilation unit and threads it
/// through every matcher call; there is no ambient state. Slots are keyed by
/// rule name so rules cannot trample each other.
#[derive(Default)]
pub struct Accumulator {
    slots: HashMap<String, Box<dyn Any + Send>>,
}

impl Accumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `rule`, initializing it with `init` on first use.
    ///
    /// Returns `None` when the slot exists but holds a different type, which
    /// indicates two rules sharing a name; registration prevents that.
    pub fn slot_mut<T: Any + Send>(
        &mut self,
        rule: &str,
        init: impl FnOnce() -> T,
    ) -> Option<&mut T> {
        self.slots
            .entry(rule.to_string())
            .or_insert_with(|| Box::new(init()))
            .downcast_mut::<T>()
    }

    /// Returns the slot for `rule` if it exists and holds a `T`.
    #[must_use]
    pub fn slot<T: Any + Send>(&self, rule: &str) -> Option<&T> {
        self.slots.get(rule).and_then(|b| b.downcast_ref::<T>())
    }
}

/// A unit of static-analysis logic: decides whether one node matches.
///
/// # Contract
///
/// - Pure function of the node, the read-only unit, and the explicit
///   accumulator; no other state.
/// - Dispatched only for the node kinds named in the descriptor.
/// - Must treat a missing type binding as no-match, not as a failure;
///   partial or erroneous compilations leave bindings unresolved.
///
/// # Example
///
/// ```ignore
/// struct ForbidTodoMacro;
///
/// impl Matcher for ForbidTodoMacro {
///     fn check(
///         &self,
///         unit: &CompilationUnit,
///         node: NodeId,
///         _acc: &mut Accumulator,
///     ) -> Result<MatchResult, MatcherFault> {
///         if unit.symbol_of(node)? == Some("todo") {
///             return Ok(MatchResult::matched());
///         }
///         Ok(MatchResult::no_match())
///     }
/// }
/// ```
pub trait Matcher: Send + Sync {
    /// Tests `node` against this rule.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherFault`] on unexpected internal failure; the driver
    /// isolates the fault to this node and rule.
    fn check(
        &self,
        unit: &CompilationUnit,
        node: NodeId,
        acc: &mut Accumulator,
    ) -> Result<MatchResult, MatcherFault>;
}

/// Type alias for boxed matcher trait objects.
pub type MatcherBox = Box<dyn Matcher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_result_builders() {
        let result = MatchResult::matched()
            .with_message("found it")
            .with_suggestion(Suggestion::new("remove it"));
        assert!(result.is_match());
        assert_eq!(result.message.as_deref(), Some("found it"));
        assert!(result.suggestion.is_some());

        assert!(!MatchResult::no_match().is_match());
    }

    #[test]
    fn accumulator_slots_are_typed_and_keyed() {
        let mut acc = Accumulator::new();
        {
            let counter = acc.slot_mut("rule-a", || 0usize).expect("fresh slot");
            *counter += 2;
        }
        assert_eq!(acc.slot::<usize>("rule-a"), Some(&2));
        // Different rule, independent slot.
        assert_eq!(acc.slot::<usize>("rule-b"), None);
        // Same key, wrong type.
        assert_eq!(acc.slot::<String>("rule-a"), None);
    }

    #[test]
    fn adapter_error_converts_to_fault() {
        let err = AdapterError::OutOfBounds { index: 7, len: 3 };
        let fault = MatcherFault::from(err);
        assert!(fault.to_string().contains("out of bounds"));
    }

    #[test]
    fn descriptor_severity_override() {
        let desc = RuleDescriptor::new(
            "demo",
            Severity::Warning,
            vec![NodeKind::Local],
            "demo message",
        )
        .with_severity(Severity::Error);
        assert_eq!(desc.severity, Severity::Error);
    }
}
