//! Utility helpers for rule implementations.

/// Checks for a suppression comment naming `rule` on the line above `line`
/// (1-indexed) or at the end of the line itself.
///
/// The directive form is `// treelint: allow(<rule-name>)`.
///
/// # Example
///
/// ```
/// use treelint_core::utils::is_allowed;
///
/// let source = "fn f() {\n    // treelint: allow(unused-local)\n    let x = 1;\n}\n";
/// assert!(is_allowed(source, 3, "unused-local"));
/// assert!(!is_allowed(source, 3, "no-silent-ok"));
/// ```
#[must_use]
pub fn is_allowed(source: &str, line: usize, rule: &str) -> bool {
    if line == 0 {
        return false;
    }
    let directive = format!("treelint: allow({rule})");
    let current = source.lines().nth(line - 1);
    let previous = if line >= 2 {
        source.lines().nth(line - 2)
    } else {
        None
    };
    current.is_some_and(|l| contains_directive(l, &directive))
        || previous.is_some_and(|l| contains_directive(l, &directive))
}

fn contains_directive(line: &str, directive: &str) -> bool {
    line.find("//")
        .map(|idx| &line[idx..])
        .is_some_and(|comment| comment.contains(directive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_on_preceding_line() {
        let source = "fn f() {\n    // treelint: allow(unused-local)\n    let x = 1;\n}\n";
        assert!(is_allowed(source, 3, "unused-local"));
        assert!(!is_allowed(source, 3, "other-rule"));
    }

    #[test]
    fn directive_at_end_of_line() {
        let source = "fn f() {\n    let x = 1; // treelint: allow(unused-local)\n}\n";
        assert!(is_allowed(source, 2, "unused-local"));
    }

    #[test]
    fn no_directive_means_not_allowed() {
        let source = "fn f() {\n    let x = 1;\n}\n";
        assert!(!is_allowed(source, 2, "unused-local"));
        assert!(!is_allowed(source, 0, "unused-local"));
    }

    #[test]
    fn directive_outside_comment_is_ignored() {
        let source = "let s = \"treelint: allow(unused-local)\";\nlet x = 1;\n";
        assert!(!is_allowed(source, 2, "unused-local"));
    }
}
