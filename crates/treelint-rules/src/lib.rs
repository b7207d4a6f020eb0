//! # treelint-rules
//!
//! Built-in checker rules for treelint.
//!
//! ## Available Rules
//!
//! | Name | Severity | Description |
//! |------|----------|-------------|
//! | `unused-local` | warning | Flags `let` bindings that are never read |
//! | `no-silent-ok` | error | Flags `Result::ok()` calls that discard the error unobserved |
//! | `no-global-spawn` | error | Flags tasks spawned onto an ambient global runtime |
//!
//! ## Usage
//!
//! ```ignore
//! use treelint_core::Registry;
//! use treelint_rules::Preset;
//!
//! let mut registry = Registry::new();
//! Preset::Recommended.install(&mut registry)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod no_global_spawn;
mod no_silent_ok;
mod presets;
mod unused_local;

pub use no_global_spawn::NoGlobalSpawn;
pub use no_silent_ok::NoSilentOk;
pub use presets::{minimal_rules, recommended_rules, strict_rules, Preset};
pub use unused_local::UnusedLocal;

/// Re-export core types for convenience.
pub use treelint_core::{Matcher, RuleDescriptor, Severity};
