use crate::arena::{DiffArena, FileIndex};
use crate::diagnostics::Diagnostic;
use crate::intern::InternPool;
use serde::Serialize;
use std::borrow::Cow;

/// Bookkeeping totals gathered during a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ParseStats {
    pub files: usize,
    pub hunks: usize,
    pub lines: usize,
    pub additions: usize,
    pub deletions: usize,
    pub binary_files: usize,
    pub diagnostics: usize,
    pub bytes: usize,
}

/// The immutable outcome of one parse call.
///
/// Owns the arena and intern pool and borrows the source buffer, so no
/// view derived from it can outlive the bytes it points into.
#[derive(Debug)]
pub struct ParseResult<'src> {
    arena: DiffArena<'src>,
    paths: InternPool<'src>,
    diagnostics: Vec<Diagnostic>,
    stats: ParseStats,
}

impl<'src> ParseResult<'src> {
    pub(crate) fn new(
        arena: DiffArena<'src>,
        paths: InternPool<'src>,
        diagnostics: Vec<Diagnostic>,
        stats: ParseStats,
    ) -> Self {
        ParseResult {
            arena,
            paths,
            diagnostics,
            stats,
        }
    }

    pub fn arena(&self) -> &DiffArena<'src> {
        &self.arena
    }

    pub fn paths(&self) -> &InternPool<'src> {
        &self.paths
    }

    pub fn source(&self) -> &'src [u8] {
        self.arena.source()
    }

    /// Diagnostics recorded while parsing, in input order.
    ///
    /// Empty when diagnostic collection was disabled; `stats().diagnostics`
    /// still counts them.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    pub fn file_count(&self) -> usize {
        self.stats.files
    }

    pub fn hunk_count(&self) -> usize {
        self.stats.hunks
    }

    pub fn line_count(&self) -> usize {
        self.stats.lines
    }

    pub fn is_empty(&self) -> bool {
        self.stats.files == 0
    }

    pub fn file_path(&self, index: FileIndex) -> Cow<'_, str> {
        self.paths.decode(self.arena.file_path(index))
    }

    pub fn old_file_path(&self, index: FileIndex) -> Option<Cow<'_, str>> {
        self.arena
            .file(index)
            .old_path
            .map(|id| self.paths.decode(id))
    }

    /// Heap bytes held by the arena columns and intern pool.
    pub fn memory_usage(&self) -> usize {
        self.arena.memory_usage() + self.paths.memory_usage()
    }
}
