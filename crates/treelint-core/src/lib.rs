//! # treelint-core
//!
//! Core framework for building tree-walking checkers over `syn` ASTs.
//!
//! A checker is a [`Matcher`] paired with a [`RuleDescriptor`] and installed
//! into a [`Registry`]. The [`Driver`] walks one [`CompilationUnit`] at a
//! time in deterministic pre-order, dispatches each node to the matchers
//! registered for its [`NodeKind`], and forwards matches as [`Diagnostic`]s
//! through a [`Reporter`].
//!
//! ## Example
//!
//! ```ignore
//! use treelint_core::{lower_source, CollectSink, Driver, Registry, Reporter};
//!
//! let mut registry = Registry::new();
//! registry.register(MyRule::new().descriptor(), Box::new(MyRule::new()))?;
//!
//! let unit = lower_source("src/lib.rs", source)?;
//! let mut reporter = Reporter::new(CollectSink::new());
//! let summary = Driver::new(&registry).drive(&unit, &mut reporter);
//! let diagnostics = reporter.into_sink().into_diagnostics();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod driver;
mod lower;
mod registry;
mod reporter;
mod rule;
mod tree;
mod types;

/// Utility helpers for rule implementations.
pub mod utils;

pub use config::{Config, ConfigError, ReporterConfig, RuleConfig, RunnerConfig};
pub use driver::{Driver, TraversalSummary};
pub use lower::{lower_file, lower_source, LowerError};
pub use registry::{Registry, RegisteredRule, RegistrationError};
pub use reporter::{
    Backpressure, CollectSink, DiagnosticSink, Reporter, ReporterOverflow, WriteSink,
    DEFAULT_CAPACITY, TRUNCATION_RULE,
};
pub use rule::{Accumulator, MatchResult, Matcher, MatcherBox, MatcherFault, RuleDescriptor};
pub use tree::{AdapterError, CompilationUnit, NodeId, NodeKind, TypeBinding};
pub use types::{
    CheckReport, Diagnostic, RenderedDiagnostic, Replacement, Severity, Span, Suggestion,
    UnknownSeverity,
};
