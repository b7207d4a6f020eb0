//! Rule flagging `Result::ok()` calls that silently discard the error.
//!
//! # Rationale
//!
//! `.ok()` throws the `Err` value away. When nothing in the receiver chain
//! has observed the error first, the failure disappears without a trace,
//! which makes production incidents hard to reconstruct.
//!
//! # Detected Patterns
//!
//! ```ignore
//! // BAD: the parse error is gone
//! let port = text.parse::<u16>().ok();
//! ```
//!
//! # Good Patterns
//!
//! ```ignore
//! // GOOD: the error is observed before being discarded
//! let port = text
//!     .parse::<u16>()
//!     .inspect_err(|e| tracing::warn!("bad port: {e}"))
//!     .ok();
//!
//! // GOOD: the error is handled, not discarded
//! let port = text.parse::<u16>().unwrap_or(DEFAULT_PORT);
//! ```
//!
//! # Suppression
//!
//! `// treelint: allow(no-silent-ok)` on or above the call.

use treelint_core::utils::is_allowed;
use treelint_core::{
    Accumulator, CompilationUnit, MatchResult, Matcher, MatcherFault, NodeId, NodeKind,
    RuleDescriptor, Severity, Suggestion,
};

/// Rule name for no-silent-ok.
pub const NAME: &str = "no-silent-ok";

/// Chain methods that observe or consume the error before `ok()` runs.
const ERROR_OBSERVERS: &[&str] = &[
    "inspect_err",
    "map_err",
    "or_else",
    "unwrap_or_else",
    "map_or_else",
    "expect_err",
    "err",
];

/// Flags `Result::ok()` calls whose receiver chain never observes the error.
#[derive(Debug, Clone, Default)]
pub struct NoSilentOk;

impl NoSilentOk {
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
            vec![NodeKind::MethodCall],
            "Result::ok() discards the error without observing it",
        )
    }
}

impl Matcher for NoSilentOk {
    fn check(
        &self,
        unit: &CompilationUnit,
        node: NodeId,
        _acc: &mut Accumulator,
    ) -> Result<MatchResult, MatcherFault> {
        if unit.symbol_of(node)? != Some("ok") {
            return Ok(MatchResult::no_match());
        }
        let children = unit.children_of(node)?;
        // `ok()` takes no arguments; anything else is a different method.
        let [receiver] = children else {
            return Ok(MatchResult::no_match());
        };

        // A stated non-Result receiver type rules the call out. With no
        // binding available the name-based check below decides, since the
        // front-end resolves no types for partial compilations.
        if let Some(binding) = unit.type_of(*receiver)? {
            if !binding.text().starts_with("Result") {
                return Ok(MatchResult::no_match());
            }
        }

        if chain_observes_error(unit, *receiver)? {
            return Ok(MatchResult::no_match());
        }

        let span = unit.span_of(node)?;
        if is_allowed(unit.source(), span.line, NAME) {
            return Ok(MatchResult::no_match());
        }

        Ok(MatchResult::matched().with_suggestion(Suggestion::new(
            "observe the error first (inspect_err, map_err) or handle it with unwrap_or_else / match",
        )))
    }
}

/// Walks left through the fluent chain looking for a method that observes
/// or consumes the error.
fn chain_observes_error(unit: &CompilationUnit, receiver: NodeId) -> Result<bool, MatcherFault> {
    let mut current = receiver;
    while unit.kind_of(current)? == NodeKind::MethodCall {
        if let Some(method) = unit.symbol_of(current)? {
            if ERROR_OBSERVERS.contains(&method) {
                return Ok(true);
            }
        }
        let children = unit.children_of(current)?;
        let Some(&next) = children.first() else {
            break;
        };
        current = next;
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treelint_core::{lower_source, CollectSink, Diagnostic, Driver, Registry, Reporter};

    fn check_code(code: &str) -> Vec<Diagnostic> {
        let rule = NoSilentOk::new();
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
    fn flags_bare_ok() {
        let diagnostics = check_code(
            r"
fn f() {
    let port = read_config().ok();
}
",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, NAME);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn inspect_err_in_chain_is_accepted() {
        let diagnostics = check_code(
            r"
fn f() {
    let port = read_config().inspect_err(log_error).ok();
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn map_err_earlier_in_chain_is_accepted() {
        let diagnostics = check_code(
            r"
fn f() {
    let value = fetch().map_err(Error::from).and_then(validate).ok();
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn parenthesized_receiver_is_seen_through() {
        let diagnostics = check_code(
            r"
fn f() {
    let value = ((fetch().inspect_err(log_error))).ok();
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn other_ok_like_methods_are_ignored() {
        let diagnostics = check_code(
            r"
fn f() {
    let value = maybe.ok_or(Error::Missing);
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn known_non_result_receiver_is_ignored() {
        // The receiver is a literal with a known non-Result binding.
        let diagnostics = check_code(
            r"
fn f() {
    let value = 1i32.ok();
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn allow_comment_suppresses() {
        let diagnostics = check_code(
            r"
fn f() {
    // treelint: allow(no-silent-ok)
    let port = read_config().ok();
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn diagnostic_span_covers_the_call() {
        let diagnostics = check_code(
            r"
fn f() {
    let port = read_config().ok();
}
",
        );
        assert_eq!(diagnostics[0].span.line, 3);
    }
}
