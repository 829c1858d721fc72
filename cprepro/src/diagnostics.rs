//! Diagnostic reporting (spec.md §7).
//!
//! Every directive-level problem — malformed syntax, a redefinition, an
//! orphan `#else`, a missing include, a user `#error`/`#warning` — goes
//! through a `DiagnosticSink` rather than aborting `Driver::process`.

/// A pluggable sink for preprocessor diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, file: &str, line: usize, message: &str);
}

/// Writes diagnostics to stderr in the format `"{message} - {file}:{line}"`,
/// matching `original_source`'s `cerr << data << " - " << file << ":" <<
/// line << "\n"`.
#[derive(Default)]
pub struct StderrDiagnostics;

impl DiagnosticSink for StderrDiagnostics {
    fn report(&mut self, file: &str, line: usize, message: &str) {
        eprintln!("{message} - {file}:{line}");
    }
}

/// Collects diagnostics in memory instead of printing them, for tests and
/// for embedders that want to inspect them programmatically.
#[derive(Default)]
pub struct RecordingDiagnostics {
    pub records: Vec<(String, usize, String)>,
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&mut self, file: &str, line: usize, message: &str) {
        self.records.push((file.to_string(), line, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_collects_in_order() {
        let mut sink = RecordingDiagnostics::default();
        sink.report("a.c", 1, "first");
        sink.report("a.c", 2, "second");
        assert_eq!(
            sink.records,
            vec![
                ("a.c".to_string(), 1, "first".to_string()),
                ("a.c".to_string(), 2, "second".to_string()),
            ]
        );
    }
}
