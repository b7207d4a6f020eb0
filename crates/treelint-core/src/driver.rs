//! Traversal driver: walks one compilation unit and dispatches matchers.

use crate::registry::Registry;
use crate::reporter::{DiagnosticSink, Reporter};
use crate::rule::{Accumulator, MatchResult, RuleDescriptor};
use crate::tree::{CompilationUnit, NodeId};
use crate::types::{Diagnostic, Span};

use tracing::{debug, warn};

/// Counters produced by one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalSummary {
    /// Nodes visited (every node exactly once).
    pub nodes_visited: usize,
    /// Matcher faults that were isolated and skipped.
    pub matcher_faults: usize,
    /// Diagnostics handed to the reporter.
    pub diagnostics_reported: usize,
}

/// Walks a compilation unit in pre-order and dispatches each node to the
/// matchers registered for its kind.
///
/// The driver holds no per-unit state itself: one instance may drive any
/// number of units sequentially, and separate instances may drive different
/// units concurrently against the same shared registry. Each unit gets its
/// own [`Reporter`] and accumulator.
pub struct Driver<'reg> {
    registry: &'reg Registry,
}

impl<'reg> Driver<'reg> {
    /// Creates a driver over a registry.
    #[must_use]
    pub fn new(registry: &'reg Registry) -> Self {
        Self { registry }
    }

    /// Analyzes one compilation unit.
    ///
    /// Traversal is depth-first pre-order with children in source order, so
    /// diagnostics for earlier source positions are reported first within
    /// each rule. Completing the walk flushes the reporter; a matcher fault
    /// is logged and skips only that rule for that node.
    pub fn drive<S: DiagnosticSink>(
        &self,
        unit: &CompilationUnit,
        reporter: &mut Reporter<S>,
    ) -> TraversalSummary {
        let mut summary = TraversalSummary::default();
        let mut acc = Accumulator::new();

        let mut stack: Vec<NodeId> = Vec::new();
        if let Some(root) = unit.root() {
            stack.push(root);
        }

        while let Some(node) = stack.pop() {
            summary.nodes_visited += 1;

            let Ok(kind) = unit.kind_of(node) else {
                // Driver-owned handles are always valid for their unit;
                // defend anyway rather than poison the whole walk.
                continue;
            };
            let Ok(node_span) = unit.span_of(node) else {
                continue;
            };

            for rule in self.registry.lookup(kind) {
                match rule.matcher.check(unit, node, &mut acc) {
                    Ok(result) if result.is_match() => {
                        let diagnostic =
                            build_diagnostic(unit, &rule.descriptor, node_span, result);
                        reporter.report(diagnostic);
                        summary.diagnostics_reported += 1;
                    }
                    Ok(_) => {}
                    Err(fault) => {
                        warn!(
                            rule = %rule.descriptor.name,
                            line = node_span.line,
                            %fault,
                            "matcher fault; rule skipped for this node"
                        );
                        summary.matcher_faults += 1;
                    }
                }
            }

            if let Ok(children) = unit.children_of(node) {
                // Reversed push keeps pop order equal to source order.
                stack.extend(children.iter().rev().copied());
            }
        }

        reporter.flush();
        debug!(
            path = %unit.path().display(),
            nodes = summary.nodes_visited,
            diagnostics = summary.diagnostics_reported,
            faults = summary.matcher_faults,
            "unit analysis complete"
        );
        summary
    }
}

fn build_diagnostic(
    unit: &CompilationUnit,
    descriptor: &RuleDescriptor,
    node_span: Span,
    result: MatchResult,
) -> Diagnostic {
    // A matcher-provided span that escapes the matched node falls back to
    // the node's own span, keeping every diagnostic inside both the node
    // and the unit bounds.
    let span = result
        .span
        .filter(|s| node_span.contains(s) && unit.contains(*s))
        .unwrap_or(node_span);
    let message = result
        .message
        .unwrap_or_else(|| descriptor.message.clone());

    let mut diagnostic = Diagnostic::new(
        descriptor.name.clone(),
        descriptor.severity,
        unit.path(),
        span,
        message,
    );
    if let Some(suggestion) = result.suggestion {
        diagnostic = diagnostic.with_suggestion(suggestion);
    }
    diagnostic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_source;
    use crate::registry::Registry;
    use crate::reporter::CollectSink;
    use crate::rule::{MatchResult, Matcher, MatcherFault, RuleDescriptor};
    use crate::tree::NodeKind;
    use crate::types::Severity;

    const ALL_KINDS: &[NodeKind] = &[
        NodeKind::File,
        NodeKind::Module,
        NodeKind::Function,
        NodeKind::Block,
        NodeKind::Local,
        NodeKind::ExprStmt,
        NodeKind::Call,
        NodeKind::MethodCall,
        NodeKind::MacroCall,
        NodeKind::Ident,
        NodeKind::Path,
        NodeKind::Literal,
        NodeKind::Other,
    ];

    /// Matches every node it sees, recording the span start.
    struct MatchEverything;

    impl Matcher for MatchEverything {
        fn check(
            &self,
            unit: &CompilationUnit,
            node: NodeId,
            _acc: &mut Accumulator,
        ) -> Result<MatchResult, MatcherFault> {
            let span = unit.span_of(node)?;
            Ok(MatchResult::matched().with_message(format!("start {}", span.start)))
        }
    }

    /// Faults on `Local` nodes named `bad`, matches the rest.
    struct FaultOnBad;

    impl Matcher for FaultOnBad {
        fn check(
            &self,
            unit: &CompilationUnit,
            node: NodeId,
            _acc: &mut Accumulator,
        ) -> Result<MatchResult, MatcherFault> {
            if unit.symbol_of(node)? == Some("bad") {
                return Err(MatcherFault::new("synthetic failure"));
            }
            Ok(MatchResult::matched())
        }
    }

    fn registry_with(name: &str, kinds: Vec<NodeKind>, matcher: crate::MatcherBox) -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                RuleDescriptor::new(name, Severity::Warning, kinds, "matched"),
                matcher,
            )
            .expect("register");
        registry
    }

    fn run(registry: &Registry, code: &str) -> (Vec<Diagnostic>, TraversalSummary) {
        let unit = lower_source("test.rs", code).expect("lower");
        let mut reporter = Reporter::new(CollectSink::new());
        let summary = Driver::new(registry).drive(&unit, &mut reporter);
        (reporter.into_sink().into_diagnostics(), summary)
    }

    #[test]
    fn visits_every_node_exactly_once_in_source_order() {
        let registry = registry_with("record", ALL_KINDS.to_vec(), Box::new(MatchEverything));
        let code = "fn a() { let x = 1; }\nfn b() { let y = 2; }\n";
        let unit = lower_source("test.rs", code).expect("lower");
        let mut reporter = Reporter::new(CollectSink::new());
        let summary = Driver::new(&registry).drive(&unit, &mut reporter);

        assert_eq!(summary.nodes_visited, unit.node_count());
        assert_eq!(summary.diagnostics_reported, unit.node_count());

        // The arena is laid out in pre-order, so the reported span starts
        // must match the arena walk exactly.
        let expected: Vec<String> = unit
            .node_ids()
            .map(|id| format!("start {}", unit.span_of(id).expect("valid id").start))
            .collect();
        let got: Vec<String> = reporter
            .into_sink()
            .into_diagnostics()
            .iter()
            .map(|d| d.message.clone())
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn runs_are_idempotent() {
        let registry = registry_with("record", ALL_KINDS.to_vec(), Box::new(MatchEverything));
        let code = "fn main() { helper(1); helper(2); }";
        let (first, _) = run(&registry, code);
        let (second, _) = run(&registry, code);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_unit_yields_nothing() {
        let registry = registry_with("record", ALL_KINDS.to_vec(), Box::new(MatchEverything));
        let unit = CompilationUnit::empty("empty.rs");
        let mut reporter = Reporter::new(CollectSink::new());
        let summary = Driver::new(&registry).drive(&unit, &mut reporter);

        assert_eq!(summary, TraversalSummary::default());
        assert!(reporter.into_sink().into_diagnostics().is_empty());
    }

    #[test]
    fn fault_is_isolated_to_one_node_and_rule() {
        let registry = registry_with("faulty", vec![NodeKind::Local], Box::new(FaultOnBad));
        let code = "fn f() { let bad = 1; let good = 2; let fine = 3; }";
        let (diagnostics, summary) = run(&registry, code);

        assert_eq!(summary.matcher_faults, 1);
        // Siblings are still analyzed by the same rule.
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn diagnostic_spans_stay_within_matched_node() {
        let registry = registry_with("record", ALL_KINDS.to_vec(), Box::new(MatchEverything));
        let code = "fn main() { let x = compute(); }";
        let unit = lower_source("test.rs", code).expect("lower");
        let mut reporter = Reporter::new(CollectSink::new());
        Driver::new(&registry).drive(&unit, &mut reporter);

        for d in reporter.into_sink().into_diagnostics() {
            assert!(unit.contains(d.span));
        }
    }

    #[test]
    fn tie_break_is_first_registered_first_reported() {
        let mut registry = Registry::new();
        registry
            .register(
                RuleDescriptor::new("alpha", Severity::Warning, vec![NodeKind::Local], "a"),
                Box::new(MatchEverything),
            )
            .expect("register alpha");
        registry
            .register(
                RuleDescriptor::new("beta", Severity::Warning, vec![NodeKind::Local], "b"),
                Box::new(MatchEverything),
            )
            .expect("register beta");

        let (diagnostics, _) = run(&registry, "fn f() { let x = 1; }");
        let rules: Vec<&str> = diagnostics.iter().map(|d| d.rule.as_str()).collect();
        assert_eq!(rules, vec!["alpha", "beta"]);
    }

    #[test]
    fn shared_registry_drives_units_concurrently() {
        let registry = registry_with("record", ALL_KINDS.to_vec(), Box::new(MatchEverything));

        std::thread::scope(|scope| {
            for source in ["fn a() { let x = 1; }", "fn b() { let y = 2; }"] {
                let registry = &registry;
                scope.spawn(move || {
                    let unit = lower_source("unit.rs", source).expect("lower");
                    let mut reporter = Reporter::new(CollectSink::new());
                    let summary = Driver::new(registry).drive(&unit, &mut reporter);
                    assert_eq!(summary.nodes_visited, unit.node_count());
                });
            }
        });
    }
}
