//! Rule flagging tasks spawned onto an ambient global runtime.
//!
//! # Rationale
//!
//! `tokio::spawn` and friends schedule work on whatever runtime happens to
//! be ambient. Under load that runtime competes with every other workload in
//! the process, which shows up as inconsistent latency and, with blocking
//! work, can deadlock. Spawning through an explicitly provided
//! `runtime::Handle` keeps the choice of executor visible and testable.
//!
//! # Suppression
//!
//! `// treelint: allow(no-global-spawn)` on or above the call.

use treelint_core::utils::is_allowed;
use treelint_core::{
    Accumulator, CompilationUnit, MatchResult, Matcher, MatcherFault, NodeId, NodeKind,
    Replacement, RuleDescriptor, Severity, Span, Suggestion,
};

/// Rule name for no-global-spawn.
pub const NAME: &str = "no-global-spawn";

/// Spawn entry points that use the ambient global runtime.
const GLOBAL_SPAWNS: &[&str] = &[
    "tokio::spawn",
    "tokio::task::spawn",
    "tokio::task::spawn_blocking",
    "async_std::task::spawn",
    "async_std::task::spawn_blocking",
    "smol::spawn",
];

/// Flags calls that spawn onto the ambient global runtime instead of an
/// explicitly provided handle.
#[derive(Debug, Clone, Default)]
pub struct NoGlobalSpawn;

impl NoGlobalSpawn {
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
            Severity::Error,
            vec![NodeKind::Call],
            "task is spawned onto the ambient global runtime",
        )
    }
}

impl Matcher for NoGlobalSpawn {
    fn check(
        &self,
        unit: &CompilationUnit,
        node: NodeId,
        _acc: &mut Accumulator,
    ) -> Result<MatchResult, MatcherFault> {
        let Some(path) = unit.symbol_of(node)? else {
            return Ok(MatchResult::no_match());
        };
        if !GLOBAL_SPAWNS.contains(&path) {
            return Ok(MatchResult::no_match());
        }

        let span = unit.span_of(node)?;
        if is_allowed(unit.source(), span.line, NAME) {
            return Ok(MatchResult::no_match());
        }

        let method = path.rsplit("::").next().unwrap_or(path);
        let suggestion = match callee_replacement(unit, span, path, method) {
            Some(replacement) => Suggestion::with_fix(
                format!("accept a runtime handle and call `handle.{method}(...)` on it"),
                replacement,
            ),
            None => Suggestion::new(format!(
                "accept a runtime handle and call `handle.{method}(...)` on it"
            )),
        };

        Ok(MatchResult::matched()
            .with_message(format!(
                "`{path}` spawns onto the ambient global runtime; pass an explicit handle"
            ))
            .with_suggestion(suggestion))
    }
}

/// Builds a textual replacement for the callee path when the source spells
/// the path exactly as rendered; a reformatted path gets no automatic fix.
fn callee_replacement(
    unit: &CompilationUnit,
    call_span: Span,
    path: &str,
    method: &str,
) -> Option<Replacement> {
    let callee_span = Span::new(
        call_span.start,
        call_span.start + path.len(),
        call_span.line,
        call_span.column,
    );
    if unit.snippet(callee_span) != Some(path) {
        return None;
    }
    Some(Replacement::new(callee_span, format!("handle.{method}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use treelint_core::{lower_source, CollectSink, Diagnostic, Driver, Registry, Reporter};

    fn check_code(code: &str) -> Vec<Diagnostic> {
        let rule = NoGlobalSpawn::new();
        let mut registry = Registry::new();
        registry
            .register(rule.descriptor(), Box::new(rule))
            .expect("register");

        let unit = lower_source("test.rs", code).expect("parse");
        let mut reporter = Reporter::new(CollectSink::new());
        Driver::new(&registry).drive(&unit, &mut reporter);
        reporter.into_sink().into_diagnostics()
    }

    #[test]
    fn flags_tokio_spawn() {
        let diagnostics = check_code(
            r"
async fn f() {
    tokio::spawn(async move { work().await });
}
",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, NAME);
        assert!(diagnostics[0].message.contains("tokio::spawn"));
    }

    #[test]
    fn fix_replaces_callee_path() {
        let diagnostics = check_code(
            r"
async fn f() {
    tokio::task::spawn_blocking(compute);
}
",
        );
        let suggestion = diagnostics[0].suggestion.as_ref().expect("suggestion");
        let replacement = suggestion.replacement.as_ref().expect("replacement");
        assert_eq!(replacement.new_text, "handle.spawn_blocking");
    }

    #[test]
    fn handle_spawn_is_accepted() {
        let diagnostics = check_code(
            r"
async fn f(handle: &Handle) {
    handle.spawn(async move { work().await });
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unrelated_spawn_fn_is_accepted() {
        let diagnostics = check_code(
            r"
fn f() {
    spawn(worker);
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn allow_comment_suppresses() {
        let diagnostics = check_code(
            r"
async fn f() {
    // treelint: allow(no-global-spawn)
    tokio::spawn(background());
}
",
        );
        assert!(diagnostics.is_empty());
    }
}
