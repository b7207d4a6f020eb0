//! Diagnostic reporting with bounded buffering.
//!
//! The reporter forwards diagnostics to a host sink. When the sink pushes
//! back, diagnostics queue into a bounded buffer that is flushed at the end
//! of the compilation unit. Overflow drops the oldest queued diagnostic and
//! surfaces one truncation summary instead of failing the run.

use crate::types::{Diagnostic, Severity, Span};

use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Rule name used for the truncation summary diagnostic.
pub const TRUNCATION_RULE: &str = "diagnostics-truncated";

/// Default bounded-buffer capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// The host channel refused a diagnostic (back-pressure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("diagnostic channel saturated")]
pub struct Backpressure;

/// Buffer capacity was exceeded and diagnostics were dropped.
///
/// Never propagated as a failure: the reporter degrades to a truncation
/// summary and logs this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{dropped} diagnostic(s) dropped after exceeding buffer capacity {capacity}")]
pub struct ReporterOverflow {
    /// Number of diagnostics dropped.
    pub dropped: usize,
    /// Configured buffer capacity.
    pub capacity: usize,
}

/// Destination for emitted diagnostics.
///
/// Implementors model the host compiler's reporting channel. `emit` may
/// refuse with [`Backpressure`] when the channel is saturated; the reporter
/// handles queueing.
pub trait DiagnosticSink {
    /// Forwards one diagnostic to the host.
    ///
    /// # Errors
    ///
    /// Returns [`Backpressure`] if the channel cannot accept the diagnostic
    /// right now.
    fn emit(&mut self, diagnostic: &Diagnostic) -> Result<(), Backpressure>;
}

/// Sink collecting diagnostics into memory. Never saturates.
#[derive(Debug, Default)]
pub struct CollectSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the sink and returns everything it received.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectSink {
    fn emit(&mut self, diagnostic: &Diagnostic) -> Result<(), Backpressure> {
        self.diagnostics.push(diagnostic.clone());
        Ok(())
    }
}

/// Sink writing rendered diagnostics line by line, e.g. to stderr.
#[derive(Debug)]
pub struct WriteSink<W: Write> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    /// Creates a sink over any writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagnosticSink for WriteSink<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> Result<(), Backpressure> {
        writeln!(self.writer, "{diagnostic}").map_err(|_| Backpressure)
    }
}

/// Forwards diagnostics to a sink, buffering on back-pressure.
///
/// One reporter serves exactly one compilation unit; concurrent units each
/// get their own instance. Dropping a reporter without flushing discards the
/// queue, which is the intended behavior when a unit's analysis is aborted.
pub struct Reporter<S: DiagnosticSink> {
    sink: S,
    queue: VecDeque<Diagnostic>,
    capacity: usize,
    dropped: usize,
    truncated_file: Option<PathBuf>,
}

impl<S: DiagnosticSink> Reporter<S> {
    /// Creates a reporter with the default buffer capacity.
    pub fn new(sink: S) -> Self {
        Self::with_capacity(sink, DEFAULT_CAPACITY)
    }

    /// Creates a reporter with an explicit buffer capacity.
    ///
    /// A capacity of zero is treated as one: the buffer must be able to
    /// hold at least the diagnostic that triggered queueing.
    pub fn with_capacity(sink: S, capacity: usize) -> Self {
        Self {
            sink,
            queue: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
            truncated_file: None,
        }
    }

    /// Reports one diagnostic. Never fails.
    ///
    /// Forwards directly while the sink accepts; queues once the sink
    /// pushes back, preserving report order.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.queue.is_empty() {
            match self.sink.emit(&diagnostic) {
                Ok(()) => return,
                Err(Backpressure) => {
                    debug!(rule = %diagnostic.rule, "sink saturated, buffering diagnostic");
                }
            }
        }
        self.enqueue(diagnostic);
    }

    /// Flushes the buffer at end of unit.
    ///
    /// Returns overflow information when diagnostics were dropped; the
    /// truncation summary has already been emitted in that case.
    pub fn flush(&mut self) -> Option<ReporterOverflow> {
        while let Some(diagnostic) = self.queue.pop_front() {
            if self.sink.emit(&diagnostic).is_err() {
                // Channel still saturated at end of unit: everything left
                // becomes part of the truncation count.
                self.dropped += 1 + self.queue.len();
                self.truncated_file
                    .get_or_insert_with(|| diagnostic.file.clone());
                self.queue.clear();
                break;
            }
        }

        if self.dropped == 0 {
            return None;
        }

        let overflow = ReporterOverflow {
            dropped: self.dropped,
            capacity: self.capacity,
        };
        warn!(%overflow, "diagnostics truncated");

        let file = self.truncated_file.take().unwrap_or_default();
        let summary = Diagnostic::new(
            TRUNCATION_RULE,
            Severity::Warning,
            file,
            Span::default(),
            format!(
                "{} diagnostic(s) were dropped because the reporter buffer (capacity {}) overflowed",
                overflow.dropped, overflow.capacity
            ),
        );
        if self.sink.emit(&summary).is_err() {
            warn!("truncation summary could not be emitted");
        }

        self.dropped = 0;
        Some(overflow)
    }

    /// Consumes the reporter and returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn enqueue(&mut self, diagnostic: Diagnostic) {
        if self.queue.len() == self.capacity {
            if let Some(oldest) = self.queue.pop_front() {
                self.dropped += 1;
                self.truncated_file.get_or_insert(oldest.file);
            }
        }
        self.queue.push_back(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that refuses the first `refusals` emits, then accepts.
    struct FlakySink {
        refusals: usize,
        accepted: Vec<Diagnostic>,
    }

    impl FlakySink {
        fn new(refusals: usize) -> Self {
            Self {
                refusals,
                accepted: Vec::new(),
            }
        }
    }

    impl DiagnosticSink for FlakySink {
        fn emit(&mut self, diagnostic: &Diagnostic) -> Result<(), Backpressure> {
            if self.refusals > 0 {
                self.refusals -= 1;
                return Err(Backpressure);
            }
            self.accepted.push(diagnostic.clone());
            Ok(())
        }
    }

    fn diag(n: usize) -> Diagnostic {
        Diagnostic::new(
            "demo-rule",
            Severity::Warning,
            "src/lib.rs",
            Span::new(n, n + 1, 1, 1),
            format!("finding {n}"),
        )
    }

    #[test]
    fn passthrough_when_sink_accepts() {
        let mut reporter = Reporter::new(CollectSink::new());
        reporter.report(diag(1));
        reporter.report(diag(2));
        assert!(reporter.flush().is_none());

        let got = reporter.into_sink().into_diagnostics();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].message, "finding 1");
    }

    #[test]
    fn buffers_on_backpressure_and_flushes_in_order() {
        let mut reporter = Reporter::new(FlakySink::new(1));
        reporter.report(diag(1)); // refused, queued
        reporter.report(diag(2)); // queue non-empty, queued
        assert!(reporter.flush().is_none());

        let got = reporter.into_sink().accepted;
        let messages: Vec<&str> = got.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["finding 1", "finding 2"]);
    }

    #[test]
    fn overflow_drops_oldest_and_emits_summary() {
        let mut reporter = Reporter::with_capacity(FlakySink::new(1), 2);
        reporter.report(diag(1)); // refused, queued
        reporter.report(diag(2)); // queued
        reporter.report(diag(3)); // overflow: 1 dropped

        let overflow = reporter.flush().expect("overflow expected");
        assert_eq!(overflow.dropped, 1);

        let got = reporter.into_sink().accepted;
        let messages: Vec<&str> = got.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], "finding 2");
        assert_eq!(messages[1], "finding 3");
        assert!(messages[2].contains("1 diagnostic(s) were dropped"));
        assert_eq!(got[2].rule, TRUNCATION_RULE);
    }

    #[test]
    fn saturated_flush_counts_remainder_as_dropped() {
        // Sink never accepts regular diagnostics during the run, accepts
        // only from the second flush attempt onwards.
        let mut reporter = Reporter::with_capacity(FlakySink::new(2), 8);
        reporter.report(diag(1)); // refused, queued
        reporter.report(diag(2)); // queued

        // First flush emit fails: both queued diagnostics become dropped,
        // summary is accepted.
        let overflow = reporter.flush().expect("overflow expected");
        assert_eq!(overflow.dropped, 2);

        let got = reporter.into_sink().accepted;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].rule, TRUNCATION_RULE);
    }

    #[test]
    fn flush_without_findings_is_silent() {
        let mut reporter = Reporter::new(CollectSink::new());
        assert!(reporter.flush().is_none());
        assert!(reporter.into_sink().into_diagnostics().is_empty());
    }
}
