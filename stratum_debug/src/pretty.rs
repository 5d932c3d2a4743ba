// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] writes one line per event to a
//! [`Write`](std::io::Write) destination (default: stderr). Write errors are
//! ignored.

use std::io::Write;

use stratum_core::events::{LayerEvent, LayerObserver};
use stratum_core::trace::{
    CompositionFinishedEvent, MigrationStepEvent, StaleDroppedEvent, TraceSink,
    VersionClassifiedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_stale_dropped(&mut self, e: &StaleDroppedEvent) {
        let _ = writeln!(
            self.writer,
            "[stale] annotations={} selection={} highlight={}",
            e.report.annotations, e.report.selection, e.report.highlight,
        );
    }

    fn on_composition_finished(&mut self, e: &CompositionFinishedEvent) {
        let _ = writeln!(
            self.writer,
            "[compose] operands={} techniques={} scored={}",
            e.operands, e.techniques, e.scored,
        );
    }

    fn on_migration_step(&mut self, e: &MigrationStepEvent) {
        let _ = writeln!(
            self.writer,
            "[migrate] {} ({} -> {})",
            e.step, e.from, e.to,
        );
    }

    fn on_version_classified(&mut self, e: &VersionClassifiedEvent) {
        let _ = writeln!(
            self.writer,
            "[version] persisted={} running={} {}",
            e.persisted,
            e.running,
            e.compatibility.as_str(),
        );
    }
}

impl<W: Write> LayerObserver for PrettyPrintSink<W> {
    fn on_event(&mut self, event: &LayerEvent) {
        let _ = match event {
            LayerEvent::SelectionChanged { selected } => {
                writeln!(self.writer, "[selection] selected={selected}")
            }
            LayerEvent::HighlightChanged {
                highlighted: Some(key),
            } => writeln!(self.writer, "[highlight] {key}"),
            LayerEvent::HighlightChanged { highlighted: None } => {
                writeln!(self.writer, "[highlight] none")
            }
            LayerEvent::AnnotationChanged { key } => writeln!(self.writer, "[annotation] {key}"),
        };
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::layer::{StaleReport, TechniqueKey};
    use stratum_core::version::{Compatibility, FormatVersion};

    use super::*;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn pretty_print_migration() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_version_classified(&VersionClassifiedEvent {
            persisted: FormatVersion::new(4, 3, 0),
            running: FormatVersion::CURRENT,
            compatibility: Compatibility::MinorBehind,
        });
        sink.on_migration_step(&MigrationStepEvent {
            step: "4.3 to 4.4",
            from: FormatVersion::new(4, 3, 0),
            to: FormatVersion::new(4, 4, 0),
        });
        let output = output(sink);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].starts_with("[version] persisted=4.3 running=4.5"), "got: {output}");
        assert_eq!(lines[1], "[migrate] 4.3 to 4.4 (4.3 -> 4.4)");
    }

    #[test]
    fn pretty_print_stale_and_session_events() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_stale_dropped(&StaleDroppedEvent {
            report: StaleReport {
                annotations: 2,
                selection: 0,
                highlight: true,
            },
        });
        sink.on_event(&LayerEvent::HighlightChanged {
            highlighted: Some(TechniqueKey::new("T1059", "execution")),
        });
        sink.on_event(&LayerEvent::HighlightChanged { highlighted: None });
        let output = output(sink);
        assert!(output.contains("[stale] annotations=2 selection=0 highlight=true"), "got: {output}");
        assert!(output.contains("[highlight] T1059^execution"), "got: {output}");
        assert!(output.contains("[highlight] none"), "got: {output}");
    }
}
