//! # treelint
//!
//! Tree-walking checker framework for Rust sources.
//!
//! This crate bundles the core framework ([`treelint_core`]) with the
//! built-in rules ([`treelint_rules`]) behind a session runner that plays
//! the host's role: discover files, analyze each as an isolated compilation
//! unit, aggregate one sorted report.
//!
//! ## Quick start
//!
//! ```ignore
//! use treelint::{check_project, fail_threshold, load_config};
//!
//! let config = load_config(std::path::Path::new("."))?;
//! let report = check_project(std::path::Path::new("./src"), &config)?;
//! if report.has_diagnostics_at(fail_threshold(&config)) {
//!     eprintln!("{}", report.format_report(fail_threshold(&config)));
//! }
//! ```
//!
//! Embedders that already hold source text can analyze a single unit with
//! [`check_source`], or drop down to [`treelint_core::Driver`] directly to
//! drive units themselves (for example, one per worker thread against a
//! shared [`treelint_core::Registry`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod runner;

pub use runner::{check_project, check_source, fail_threshold, load_config, RunError};

/// Re-export of the core framework.
pub use treelint_core::{
    Accumulator, AdapterError, Backpressure, CheckReport, CollectSink, CompilationUnit, Config,
    ConfigError, Diagnostic, DiagnosticSink, Driver, LowerError, MatchResult, Matcher, MatcherBox,
    MatcherFault, NodeId, NodeKind, RegisteredRule, Registry, RegistrationError, Replacement,
    Reporter, ReporterOverflow, RuleDescriptor, Severity, Span, Suggestion, TraversalSummary,
    TypeBinding, WriteSink, lower_file, lower_source,
};

/// Re-export of the built-in rules.
pub use treelint_rules::{NoGlobalSpawn, NoSilentOk, Preset, UnusedLocal};
