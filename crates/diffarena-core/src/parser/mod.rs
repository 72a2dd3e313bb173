mod file_header;


use crate::arena::{DiffArena, HunkRecord, LineKind};
use crate::config::ParseOptions;
use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::intern::InternPool;
use crate::result::{ParseResult, ParseStats};
use crate::scanner::{parse_decimal, HunkFields, Scanner, Token, TokenKind};
use crate::span::Span;

use file_header::{PathResolver, PendingFile};

pub use file_header::unquote;

const SIGNATURE_SEPARATOR: &[u8] = b"-- ";

/// Parse a unified diff with default options.
pub fn parse(source: &[u8]) -> ParseResult<'_> {
    parse_with(source, &ParseOptions::default())
}

pub fn parse_str(source: &str) -> ParseResult<'_> {
    parse(source.as_bytes())
}

pub fn parse_with<'src>(source: &'src [u8], options: &ParseOptions) -> ParseResult<'src> {
    StreamingParser::new(source, options.clone()).parse()
}

/// Where the parser is relative to file rows.
#[derive(Debug)]
enum FileState {
    /// Between files, or before the first one
    Idle,
    /// Collecting header lines; no row pushed yet
    Header(PendingFile),
    /// Row pushed; hunks attach to it
    Body,
}

#[derive(Debug, Clone, Copy)]
enum HunkState {
    Closed,
    Open(OpenHunk),
    /// After a malformed header: drop lines until the next header
    Skipping,
}

#[derive(Debug, Clone, Copy)]
struct OpenHunk {
    offset: u32,
    old_remaining: u32,
    new_remaining: u32,
    overflow_reported: bool,
}

impl OpenHunk {
    fn expects_more(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }

    fn consume(&mut self, kind: LineKind) {
        match kind {
            LineKind::Add => self.new_remaining = self.new_remaining.saturating_sub(1),
            LineKind::Delete => self.old_remaining = self.old_remaining.saturating_sub(1),
            LineKind::Context => {
                self.old_remaining = self.old_remaining.saturating_sub(1);
                self.new_remaining = self.new_remaining.saturating_sub(1);
            }
        }
    }
}

/// Single forward pass from diff bytes to a [`ParseResult`].
///
/// Drives the scanner one token at a time and writes rows straight into
/// the arena; per content line the work is a handful of column pushes.
/// Malformed input never aborts the pass: the affected record is closed
/// out with what was read and a diagnostic is recorded.
pub struct StreamingParser<'src> {
    source: &'src [u8],
    options: ParseOptions,
    scanner: Scanner<'src>,
    arena: DiffArena<'src>,
    paths: InternPool<'src>,
    diagnostics: DiagnosticSink,
    file: FileState,
    hunk: HunkState,
    orphan_reported: bool,
    additions: usize,
    deletions: usize,
    binary_files: usize,
}

impl<'src> StreamingParser<'src> {
    /// Panics if `source` is larger than `u32::MAX` bytes; callers are
    /// expected to cap diff size before parsing.
    pub fn new(source: &'src [u8], options: ParseOptions) -> Self {
        assert!(
            source.len() <= u32::MAX as usize,
            "diff of {} bytes exceeds the 4 GiB parser limit",
            source.len()
        );

        let capacity = options.capacity.resolve(source.len());
        StreamingParser {
            source,
            scanner: Scanner::with_carriage_returns(source, options.keep_carriage_returns),
            arena: DiffArena::with_capacity(source, capacity),
            paths: InternPool::with_capacity(capacity.files),
            diagnostics: DiagnosticSink::new(options.collect_diagnostics),
            options,
            file: FileState::Idle,
            hunk: HunkState::Closed,
            orphan_reported: false,
            additions: 0,
            deletions: 0,
            binary_files: 0,
        }
    }

    pub fn parse(mut self) -> ParseResult<'src> {
        let span = tracing::debug_span!("parse", bytes = self.source.len());
        let _enter = span.enter();

        while let Some(token) = self.scanner.next_token() {
            self.step(token);
        }
        self.close_hunk(self.source.len() as u32);
        self.finish_file();

        let stats = ParseStats {
            files: self.arena.file_count(),
            hunks: self.arena.hunk_count(),
            lines: self.arena.line_count(),
            additions: self.additions,
            deletions: self.deletions,
            binary_files: self.binary_files,
            diagnostics: self.diagnostics.count(),
            bytes: self.source.len(),
        };
        tracing::debug!(
            files = stats.files,
            hunks = stats.hunks,
            lines = stats.lines,
            diagnostics = stats.diagnostics,
            "parsed diff"
        );

        ParseResult::new(
            self.arena,
            self.paths,
            self.diagnostics.into_diagnostics(),
            stats,
        )
    }

    fn step(&mut self, token: Token) {
        if self.continue_hunk(&token) {
            return;
        }

        match token.kind {
            TokenKind::FileHeader { old, new } => {
                self.finish_file();
                self.file = FileState::Header(PendingFile::git(token.line.start, old, new));
            }
            TokenKind::OldPath(marker) => match &mut self.file {
                FileState::Header(pending)
                    if pending.old_marker.is_none() && pending.new_marker.is_none() =>
                {
                    pending.old_marker = Some(marker);
                }
                _ => {
                    // a bare `---` outside a hunk starts a plain unified diff file
                    self.finish_file();
                    let mut pending = PendingFile::plain(token.line.start);
                    pending.old_marker = Some(marker);
                    self.file = FileState::Header(pending);
                }
            },
            TokenKind::NewPath(marker) => match &mut self.file {
                FileState::Header(pending) if pending.new_marker.is_none() => {
                    pending.new_marker = Some(marker);
                }
                _ => {
                    self.finish_file();
                    self.report_orphan(token.line, "`+++` marker without a preceding `---`");
                    let mut pending = PendingFile::plain(token.line.start);
                    pending.new_marker = Some(marker);
                    self.file = FileState::Header(pending);
                }
            },
            TokenKind::HunkHeader(fields) => self.open_hunk(fields, token.line),
            TokenKind::MalformedHunkHeader => {
                let source = self.source;
                self.diagnostics
                    .report(DiagnosticCode::MalformedHunkHeader, token.line.start, || {
                        format!("unreadable hunk header `{}`", line_text(source, token.line))
                    });
                self.ensure_file_row();
                self.hunk = HunkState::Skipping;
            }
            TokenKind::Content { .. } => {
                self.report_orphan(token.line, "content line outside any hunk");
            }
            TokenKind::Binary => self.with_pending(token.line, |pending, _| pending.binary = true),
            TokenKind::RenameFrom(path) => {
                self.with_pending(token.line, |pending, _| pending.rename_from = Some(path))
            }
            TokenKind::RenameTo(path) => {
                self.with_pending(token.line, |pending, _| pending.rename_to = Some(path))
            }
            TokenKind::CopyFrom(path) => {
                self.with_pending(token.line, |pending, _| pending.copy_from = Some(path))
            }
            TokenKind::CopyTo(path) => {
                self.with_pending(token.line, |pending, _| pending.copy_to = Some(path))
            }
            TokenKind::Similarity(digits) => self.with_pending(token.line, |pending, source| {
                pending.set_similarity(digits.slice(source))
            }),
            TokenKind::NewFileMode => {
                self.with_pending(token.line, |pending, _| pending.new_file = true)
            }
            TokenKind::DeletedFileMode => {
                self.with_pending(token.line, |pending, _| pending.deleted_file = true)
            }
            TokenKind::NoNewlineMarker | TokenKind::ExtendedHeader | TokenKind::Other => {}
        }
    }

    /// Feed a token to the open hunk. Returns true when it was consumed.
    fn continue_hunk(&mut self, token: &Token) -> bool {
        match self.hunk {
            HunkState::Closed => false,
            HunkState::Skipping => match token.kind {
                TokenKind::Content { .. } | TokenKind::NoNewlineMarker | TokenKind::Other => true,
                _ => {
                    self.hunk = HunkState::Closed;
                    false
                }
            },
            HunkState::Open(mut open) if open.expects_more() => {
                if let Some((kind, text)) = token.as_content(self.source) {
                    open.consume(kind);
                    self.hunk = HunkState::Open(open);
                    self.push_line(kind, text);
                    return true;
                }
                match token.kind {
                    TokenKind::NoNewlineMarker => {
                        self.arena.mark_missing_newline();
                        true
                    }
                    // editors strip the lone space of an empty context line
                    TokenKind::Other if token.line.is_empty() => {
                        open.consume(LineKind::Context);
                        self.hunk = HunkState::Open(open);
                        self.push_line(LineKind::Context, token.line);
                        true
                    }
                    _ => {
                        self.close_hunk(token.line.start);
                        false
                    }
                }
            }
            HunkState::Open(mut open) => match token.kind {
                TokenKind::NoNewlineMarker => {
                    self.arena.mark_missing_newline();
                    true
                }
                // `git format-patch` signature separator
                TokenKind::Content { .. } if token.line.slice(self.source) == SIGNATURE_SEPARATOR => {
                    self.hunk = HunkState::Closed;
                    true
                }
                TokenKind::Content { kind, text } => {
                    if !open.overflow_reported {
                        open.overflow_reported = true;
                        self.hunk = HunkState::Open(open);
                        self.diagnostics.report(
                            DiagnosticCode::HunkCountMismatch,
                            token.line.start,
                            || format!("hunk at byte {} has more lines than its header declares", open.offset),
                        );
                    }
                    self.push_line(kind, text);
                    true
                }
                _ => {
                    self.hunk = HunkState::Closed;
                    false
                }
            },
        }
    }

    fn open_hunk(&mut self, fields: HunkFields, line: Span) {
        let source = self.source;
        let number = |span: Span| parse_decimal(span.slice(source));
        let count = |span: Option<Span>| span.map_or(Some(1), number);

        let record = (|| {
            Some(HunkRecord {
                old_start: number(fields.old_start)?,
                old_lines: count(fields.old_lines)?,
                new_start: number(fields.new_start)?,
                new_lines: count(fields.new_lines)?,
                section: fields.section,
            })
        })();

        let Some(record) = record else {
            self.diagnostics
                .report(DiagnosticCode::MalformedHunkHeader, line.start, || {
                    format!("hunk header numbers out of range in `{}`", line_text(source, line))
                });
            self.ensure_file_row();
            self.hunk = HunkState::Skipping;
            return;
        };

        if !self.ensure_file_row() {
            self.report_orphan(line, "hunk header outside any file");
            self.hunk = HunkState::Skipping;
            return;
        }

        self.arena.push_hunk(record);
        self.orphan_reported = false;
        self.hunk = HunkState::Open(OpenHunk {
            offset: line.start,
            old_remaining: record.old_lines,
            new_remaining: record.new_lines,
            overflow_reported: false,
        });
    }

    fn close_hunk(&mut self, offset: u32) {
        if let HunkState::Open(open) = self.hunk {
            if open.expects_more() {
                self.diagnostics.report(DiagnosticCode::TruncatedHunk, offset, || {
                    format!(
                        "hunk at byte {} ended with {} old and {} new lines missing",
                        open.offset, open.old_remaining, open.new_remaining
                    )
                });
            }
        }
        self.hunk = HunkState::Closed;
    }

    fn push_line(&mut self, kind: LineKind, text: Span) {
        match kind {
            LineKind::Add => self.additions += 1,
            LineKind::Delete => self.deletions += 1,
            LineKind::Context => {}
        }
        self.arena.push_line(kind, text);
    }

    /// Make sure the current file has a row. Returns false if there is no
    /// file to attach hunks to.
    fn ensure_file_row(&mut self) -> bool {
        match std::mem::replace(&mut self.file, FileState::Idle) {
            FileState::Idle => false,
            FileState::Body => {
                self.file = FileState::Body;
                true
            }
            FileState::Header(pending) => {
                let pushed = self.push_file_row(&pending);
                if pushed {
                    self.file = FileState::Body;
                }
                pushed
            }
        }
    }

    /// Close the current file, pushing its row if no hunk has yet.
    fn finish_file(&mut self) {
        self.close_hunk(self.scanner.position() as u32);
        if let FileState::Header(pending) = std::mem::replace(&mut self.file, FileState::Idle) {
            self.push_file_row(&pending);
        }
        self.orphan_reported = false;
    }

    fn push_file_row(&mut self, pending: &PendingFile) -> bool {
        let mut resolver = PathResolver {
            source: self.source,
            pool: &mut self.paths,
            diagnostics: &mut self.diagnostics,
            options: &self.options,
        };

        match pending.resolve(&mut resolver) {
            Some(record) => {
                let index = self.arena.push_file(record);
                if record.binary {
                    self.binary_files += 1;
                }
                tracing::trace!(file = %index, status = %record.status, binary = record.binary, "file row");
                true
            }
            None => {
                self.diagnostics
                    .report(DiagnosticCode::MissingPath, pending.offset, || {
                        "file header without a usable path".to_string()
                    });
                false
            }
        }
    }

    fn with_pending(&mut self, line: Span, update: impl FnOnce(&mut PendingFile, &'src [u8])) {
        match &mut self.file {
            FileState::Header(pending) => update(pending, self.source),
            _ => self.report_orphan(line, "file header line outside a file header"),
        }
    }

    fn report_orphan(&mut self, line: Span, what: &'static str) {
        if self.orphan_reported {
            return;
        }
        self.orphan_reported = true;
        self.diagnostics
            .report(DiagnosticCode::OrphanContent, line.start, || what.to_string());
    }
}

fn line_text(source: &[u8], line: Span) -> String {
    String::from_utf8_lossy(line.slice(source)).into_owned()
}
