//! Registry associating rule descriptors with their matchers.

use crate::rule::{MatcherBox, RuleDescriptor};
use crate::tree::NodeKind;

use std::collections::{HashMap, HashSet};

/// Errors raised at rule registration time.
///
/// Registration errors are fatal to checker setup; a registry that rejects a
/// registration is left exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A rule with this name is already registered.
    #[error("rule `{name}` is already registered")]
    DuplicateName {
        /// The conflicting rule name.
        name: String,
    },

    /// The descriptor names no node kinds, so the rule could never match.
    #[error("rule `{name}` declares no applicable node kinds")]
    EmptyKindSet {
        /// The offending rule name.
        name: String,
    },
}

/// One registered rule: its descriptor and matcher.
pub struct RegisteredRule {
    /// Static metadata for the rule.
    pub descriptor: RuleDescriptor,
    /// The matcher dispatched for the descriptor's node kinds.
    pub matcher: MatcherBox,
}

/// Descriptor-to-matcher table with per-kind dispatch.
///
/// Registration order is preserved: when several rules match the same node,
/// diagnostics are reported first-registered first. The registry is
/// read-only after setup and may be shared across threads; each traversal
/// only reads it.
#[derive(Default)]
pub struct Registry {
    entries: Vec<RegisteredRule>,
    names: HashSet<String>,
    by_kind: HashMap<NodeKind, Vec<usize>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Matchers are trait objects without `Debug`; summarize by rule name.
        f.debug_struct("Registry")
            .field(
                "rules",
                &self
                    .entries
                    .iter()
                    .map(|e| &e.descriptor.name)
                    .collect::<Vec<_>>(),
            )
            .field("by_kind", &self.by_kind)
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistrationError`] for a duplicate name or an empty
    /// kind set; the registry is unchanged on failure.
    pub fn register(
        &mut self,
        descriptor: RuleDescriptor,
        matcher: MatcherBox,
    ) -> Result<(), RegistrationError> {
        if descriptor.kinds.is_empty() {
            return Err(RegistrationError::EmptyKindSet {
                name: descriptor.name.clone(),
            });
        }
        if self.names.contains(&descriptor.name) {
            return Err(RegistrationError::DuplicateName {
                name: descriptor.name.clone(),
            });
        }

        let index = self.entries.len();
        for kind in &descriptor.kinds {
            let slot = self.by_kind.entry(*kind).or_default();
            // A descriptor listing the same kind twice still dispatches once.
            if slot.last() != Some(&index) {
                slot.push(index);
            }
        }
        self.names.insert(descriptor.name.clone());
        self.entries.push(RegisteredRule {
            descriptor,
            matcher,
        });
        Ok(())
    }

    /// Rules applicable to `kind`, in registration order.
    pub fn lookup(&self, kind: NodeKind) -> impl Iterator<Item = &RegisteredRule> {
        self.by_kind
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&i| &self.entries[i])
    }

    /// All registered rules, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredRule> {
        self.entries.iter()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
