//! Session runner: drives the checker over every unit under a root.
//!
//! The runner plays the host's role for library consumers: it discovers
//! source files, lowers each one into an isolated compilation unit, runs a
//! fresh driver/reporter pair per unit, and aggregates a sorted report.

use treelint_core::{
    CheckReport, CollectSink, Config, ConfigError, Driver, LowerError, RegistrationError,
    Registry, Reporter, Severity, lower_source,
};
use treelint_rules::Preset;

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Config file names to search for, in priority order.
const CONFIG_CANDIDATES: &[&str] = &["treelint.toml", ".treelint.toml"];

/// Errors raised by a check run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// IO error walking or reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rule registration failed while building the registry.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A caller-supplied unit does not parse.
    #[error("parse error in {path}: {message}")]
    Parse {
        /// Path of the unit that failed to parse.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },

    /// The configuration names a preset that does not exist.
    #[error("unknown preset `{name}`; valid presets: recommended, strict, minimal")]
    UnknownPreset {
        /// The rejected preset name.
        name: String,
    },
}

/// Checks every source file under `root` using `config`.
///
/// Each file is analyzed as its own compilation unit with an isolated
/// driver/reporter pair; files that fail to parse are logged and skipped.
/// Diagnostics in the returned report are sorted by file, line, column.
///
/// # Errors
///
/// Returns [`RunError`] on discovery, config, or registration failure.
pub fn check_project(root: &Path, config: &Config) -> Result<CheckReport, RunError> {
    let registry = build_registry(config)?;
    let driver = Driver::new(&registry);

    info!(root = %root.display(), rules = registry.len(), "starting check run");

    let mut report = CheckReport::new();
    for path in discover_files(root, &config.runner.exclude)? {
        let source = std::fs::read_to_string(&path)?;
        let unit = match lower_source(&path, &source) {
            Ok(unit) => unit,
            Err(e @ LowerError::Parse { .. }) => {
                warn!(%e, "skipping unit that does not parse");
                continue;
            }
            Err(LowerError::Io { source, .. }) => return Err(RunError::Io(source)),
        };

        let mut reporter =
            Reporter::with_capacity(CollectSink::new(), config.reporter.capacity);
        let summary = driver.drive(&unit, &mut reporter);

        report
            .diagnostics
            .extend(reporter.into_sink().into_diagnostics());
        report.units_checked += 1;
        report.nodes_visited += summary.nodes_visited;
        report.matcher_faults += summary.matcher_faults;
    }

    report.diagnostics.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.span.line.cmp(&b.span.line))
            .then(a.span.column.cmp(&b.span.column))
    });

    info!(
        diagnostics = report.diagnostics.len(),
        units = report.units_checked,
        "check run complete"
    );
    Ok(report)
}

/// Checks a single in-memory source as one compilation unit.
///
/// # Errors
///
/// Returns [`RunError`] on config, registration, or parse failure. Unlike
/// [`check_project`], a parse failure here is an error: the caller handed
/// over exactly one unit and silence would hide it.
pub fn check_source(name: &str, source: &str, config: &Config) -> Result<CheckReport, RunError> {
    let registry = build_registry(config)?;
    let unit = lower_source(name, source).map_err(|e| match e {
        LowerError::Io { source, .. } => RunError::Io(source),
        LowerError::Parse { path, message } => RunError::Parse { path, message },
    })?;

    let mut reporter = Reporter::with_capacity(CollectSink::new(), config.reporter.capacity);
    let summary = Driver::new(&registry).drive(&unit, &mut reporter);

    let mut report = CheckReport::new();
    report.diagnostics = reporter.into_sink().into_diagnostics();
    report.units_checked = 1;
    report.nodes_visited = summary.nodes_visited;
    report.matcher_faults = summary.matcher_faults;
    Ok(report)
}

/// Loads configuration from `root`, trying the candidate file names in
/// priority order. Missing files yield the default configuration.
///
/// # Errors
///
/// Returns [`ConfigError`] only when a config file exists but cannot be
/// read or parsed.
pub fn load_config(root: &Path) -> Result<Config, ConfigError> {
    for candidate in CONFIG_CANDIDATES {
        let path = root.join(candidate);
        if path.exists() {
            debug!(path = %path.display(), "loading config");
            return Config::from_file(&path);
        }
    }
    Ok(Config::default())
}

/// Resolves the severity threshold a run fails at: config value or "error".
#[must_use]
pub fn fail_threshold(config: &Config) -> Severity {
    config
        .fail_on
        .as_deref()
        .and_then(|name| name.parse().ok())
        .unwrap_or(Severity::Error)
}

/// Builds the registry from the configured preset, applying per-rule
/// enable/severity overrides at registration time.
fn build_registry(config: &Config) -> Result<Registry, RunError> {
    let preset_name = config.preset.as_deref().unwrap_or("recommended");
    let preset = Preset::from_name(preset_name).ok_or_else(|| RunError::UnknownPreset {
        name: preset_name.to_string(),
    })?;

    let mut registry = Registry::new();
    for (mut descriptor, matcher) in preset.rules() {
        if !config.is_rule_enabled(&descriptor.name) {
            debug!(rule = %descriptor.name, "rule disabled by config");
            continue;
        }
        if let Some(severity) = config.rule_severity(&descriptor.name) {
            descriptor.severity = severity;
        }
        registry.register(descriptor, matcher)?;
    }
    Ok(registry)
}

/// Discovers all Rust source files under `root`, honoring exclude patterns.
fn discover_files(root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>, RunError> {
    let pattern = format!("{}/**/*.rs", root.display());
    let mut files = Vec::new();

    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| RunError::Io(e.into_error()))?;
        if should_exclude(&path, exclude) {
            debug!(path = %path.display(), "excluded from analysis");
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Checks a path against the configured exclude patterns.
fn should_exclude(path: &Path, exclude: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in exclude {
        if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
            if glob_pattern.matches(&path_str) {
                return true;
            }
        }

        // Also match patterns like "**/target/**" as plain substrings.
        let normalized = pattern.replace("**", "");
        if !normalized.is_empty() && path_str.contains(&normalized) {
            return true;
        }
    }

    false
}
