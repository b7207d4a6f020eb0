//! Rule presets for common configurations.

use crate::{NoGlobalSpawn, NoSilentOk, UnusedLocal};
use treelint_core::{MatcherBox, Registry, RegistrationError, RuleDescriptor, Severity};

/// Preset rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// All built-in rules with their default severities.
    Recommended,
    /// All built-in rules, advisory rules raised to errors.
    Strict,
    /// Only the error-hiding check, for gradual adoption.
    Minimal,
}

impl Preset {
    /// Resolves a preset by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::Recommended),
            "strict" => Some(Self::Strict),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    /// Descriptor/matcher pairs for this preset, in registration order.
    #[must_use]
    pub fn rules(self) -> Vec<(RuleDescriptor, MatcherBox)> {
        match self {
            Self::Recommended => recommended_rules(),
            Self::Strict => strict_rules(),
            Self::Minimal => minimal_rules(),
        }
    }

    /// Registers this preset's rules into a registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if a rule name collides with one
    /// already registered.
    pub fn install(self, registry: &mut Registry) -> Result<(), RegistrationError> {
        for (descriptor, matcher) in self.rules() {
            registry.register(descriptor, matcher)?;
        }
        Ok(())
    }
}

/// Returns the recommended set of rules.
#[must_use]
pub fn recommended_rules() -> Vec<(RuleDescriptor, MatcherBox)> {
    vec![
        (UnusedLocal::new().descriptor(), Box::new(UnusedLocal::new())),
        (NoSilentOk::new().descriptor(), Box::new(NoSilentOk::new())),
        (
            NoGlobalSpawn::new().descriptor(),
            Box::new(NoGlobalSpawn::new()),
        ),
    ]
}

/// Returns the strict set: every rule reports at error severity.
#[must_use]
pub fn strict_rules() -> Vec<(RuleDescriptor, MatcherBox)> {
    recommended_rules()
        .into_iter()
        .map(|(descriptor, matcher)| (descriptor.with_severity(Severity::Error), matcher))
        .collect()
}

/// Returns the minimal set for gradual adoption.
#[must_use]
pub fn minimal_rules() -> Vec<(RuleDescriptor, MatcherBox)> {
    vec![(NoSilentOk::new().descriptor(), Box::new(NoSilentOk::new()))]
}
