use serde::Serialize;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Warning,
    Info,
}

/// What the parser recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// `@@` line whose fields or integers could not be read; its lines are skipped.
    MalformedHunkHeader,
    /// More lines followed a hunk than its header declared.
    HunkCountMismatch,
    /// A hunk ended before its declared line counts were reached.
    TruncatedHunk,
    /// Content or markers appeared outside any file or hunk.
    OrphanContent,
    /// A file header carried no usable path; the file was dropped.
    MissingPath,
    /// A quoted path had an invalid escape and was kept verbatim.
    InvalidQuotedPath,
}

impl DiagnosticCode {
    pub fn level(self) -> DiagnosticLevel {
        match self {
            DiagnosticCode::OrphanContent | DiagnosticCode::InvalidQuotedPath => {
                DiagnosticLevel::Info
            }
            _ => DiagnosticLevel::Warning,
        }
    }
}

/// A recoverable problem found while parsing, with its byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub level: DiagnosticLevel,
    pub offset: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, offset: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            level: code.level(),
            offset,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.level {
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
        };
        write!(f, "{} at byte {}: {}", level, self.offset, self.message)
    }
}

/// Accumulates diagnostics during a parse.
///
/// When storage is disabled only the count is kept, so a caller that does
/// not care pays nothing for message formatting.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    count: usize,
    store: bool,
}

impl DiagnosticSink {
    pub fn new(store: bool) -> Self {
        Self {
            diagnostics: Vec::new(),
            count: 0,
            store,
        }
    }

    pub fn report(&mut self, code: DiagnosticCode, offset: u32, message: impl FnOnce() -> String) {
        self.count += 1;
        if self.store {
            let diagnostic = Diagnostic::new(code, offset, message());
            tracing::debug!(%diagnostic, "recovered from malformed diff input");
            self.diagnostics.push(diagnostic);
        } else {
            tracing::debug!(?code, offset, "recovered from malformed diff input");
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new(DiagnosticCode::TruncatedHunk, 12, "hunk ended early");
        assert_eq!(diag.level, DiagnosticLevel::Warning);
        assert_eq!(diag.to_string(), "warning at byte 12: hunk ended early");
    }

    #[test]
    fn test_sink_stores_when_enabled() {
        let mut sink = DiagnosticSink::new(true);
        sink.report(DiagnosticCode::OrphanContent, 0, || "stray line".to_string());
        sink.report(DiagnosticCode::MissingPath, 5, || "no path".to_string());

        assert_eq!(sink.count(), 2);
        let diagnostics = sink.into_diagnostics();
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Info);
        assert_eq!(diagnostics[1].code, DiagnosticCode::MissingPath);
    }

    #[test]
    fn test_sink_counts_only_when_disabled() {
        let mut sink = DiagnosticSink::new(false);
        sink.report(DiagnosticCode::TruncatedHunk, 0, || {
            panic!("message should not be built")
        });
        assert_eq!(sink.count(), 1);
        assert!(sink.into_diagnostics().is_empty());
    }
}
