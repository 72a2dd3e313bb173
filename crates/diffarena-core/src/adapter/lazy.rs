use super::eager::{FileDiff, Hunk};
use crate::arena::{FileIndex, FileRow, FileStatus, HunkIndex, HunkRow, LineKind};
use crate::result::ParseResult;
use serde::Serialize;
use std::borrow::Cow;

/// Totals for one file, computed by walking its line rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChangeStats {
    pub additions: usize,
    pub deletions: usize,
    pub hunks: usize,
}

/// A file row viewed through its parse result.
///
/// Nothing is decoded up front: paths and line text are produced on each
/// access and not cached. Call [`LazyFileDiff::to_file_diff`] for an
/// owned copy.
#[derive(Debug, Clone, Copy)]
pub struct LazyFileDiff<'r, 'src> {
    result: &'r ParseResult<'src>,
    index: FileIndex,
}

impl<'r, 'src> LazyFileDiff<'r, 'src> {
    /// Panics if `index` is not a file row of `result`.
    pub fn new(result: &'r ParseResult<'src>, index: FileIndex) -> Self {
        assert!(
            index.index() < result.arena().file_count(),
            "file index {} out of range",
            index
        );
        LazyFileDiff { result, index }
    }

    pub fn index(&self) -> FileIndex {
        self.index
    }

    pub fn row(&self) -> FileRow {
        self.result.arena().file(self.index)
    }

    pub fn path(&self) -> Cow<'r, str> {
        self.result.paths().decode(self.result.arena().file_path(self.index))
    }

    pub fn path_bytes(&self) -> &'r [u8] {
        self.result.paths().bytes(self.result.arena().file_path(self.index))
    }

    pub fn old_path(&self) -> Option<Cow<'r, str>> {
        let paths = self.result.paths();
        self.row().old_path.map(|id| paths.decode(id))
    }

    pub fn status(&self) -> FileStatus {
        self.result.arena().file_status(self.index)
    }

    pub fn is_binary(&self) -> bool {
        self.row().binary
    }

    pub fn similarity(&self) -> Option<u8> {
        self.row().similarity
    }

    pub fn hunk_count(&self) -> usize {
        self.row().hunk_count as usize
    }

    pub fn hunks(&self) -> impl ExactSizeIterator<Item = LazyHunk<'r, 'src>> + 'r {
        let result = self.result;
        result
            .arena()
            .hunks_of(self.index)
            .map(move |index| LazyHunk { result, index })
    }

    /// Added lines across all hunks, decoded one at a time.
    pub fn iterate_additions(&self) -> impl Iterator<Item = Cow<'src, str>> + 'r {
        self.lines_of_kind(LineKind::Add)
    }

    /// Deleted lines across all hunks, decoded one at a time.
    pub fn iterate_deletions(&self) -> impl Iterator<Item = Cow<'src, str>> + 'r {
        self.lines_of_kind(LineKind::Delete)
    }

    fn lines_of_kind(&self, kind: LineKind) -> impl Iterator<Item = Cow<'src, str>> + 'r {
        let arena = self.result.arena();
        arena
            .lines_of_file(self.index)
            .filter(move |&line| arena.line_kind(line) == kind)
            .map(move |line| arena.line_text(line))
    }

    /// Count additions and deletions without decoding any text.
    pub fn change_stats(&self) -> ChangeStats {
        let arena = self.result.arena();
        let mut stats = ChangeStats {
            hunks: self.hunk_count(),
            ..ChangeStats::default()
        };
        for line in arena.lines_of_file(self.index) {
            match arena.line_kind(line) {
                LineKind::Add => stats.additions += 1,
                LineKind::Delete => stats.deletions += 1,
                LineKind::Context => {}
            }
        }
        stats
    }

    /// Decode everything into an owned record.
    pub fn to_file_diff(&self) -> FileDiff {
        let row = self.row();
        FileDiff {
            path: self.path().into_owned(),
            old_path: self.old_path().map(Cow::into_owned),
            status: row.status,
            binary: row.binary,
            hunks: self.hunks().map(|hunk| hunk.to_hunk()).collect(),
        }
    }
}

/// A hunk row viewed through its parse result.
#[derive(Debug, Clone, Copy)]
pub struct LazyHunk<'r, 'src> {
    result: &'r ParseResult<'src>,
    index: HunkIndex,
}

impl<'r, 'src> LazyHunk<'r, 'src> {
    pub fn index(&self) -> HunkIndex {
        self.index
    }

    pub fn row(&self) -> HunkRow {
        self.result.arena().hunk(self.index)
    }

    pub fn section(&self) -> Option<Cow<'src, str>> {
        let text = self.result.arena().section_text(self.index);
        (!text.is_empty()).then_some(text)
    }

    /// Every line in order, with its kind.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = (LineKind, Cow<'src, str>)> + 'r {
        let arena = self.result.arena();
        arena
            .lines_of(self.index)
            .map(move |line| (arena.line_kind(line), arena.line_text(line)))
    }

    pub fn additions(&self) -> impl Iterator<Item = Cow<'src, str>> + 'r {
        self.lines()
            .filter(|(kind, _)| *kind == LineKind::Add)
            .map(|(_, text)| text)
    }

    pub fn deletions(&self) -> impl Iterator<Item = Cow<'src, str>> + 'r {
        self.lines()
            .filter(|(kind, _)| *kind == LineKind::Delete)
            .map(|(_, text)| text)
    }

    pub fn to_hunk(&self) -> Hunk {
        let row = self.row();
        let arena = self.result.arena();
        let mut additions = Vec::new();
        let mut deletions = Vec::new();
        for line in arena.lines_of(self.index) {
            match arena.line_kind(line) {
                LineKind::Add => additions.push(arena.line_text(line).into_owned()),
                LineKind::Delete => deletions.push(arena.line_text(line).into_owned()),
                LineKind::Context => {}
            }
        }

        Hunk {
            old_start: row.old_start,
            old_lines: row.old_lines,
            new_start: row.new_start,
            new_lines: row.new_lines,
            section: self.section().map(Cow::into_owned),
            additions,
            deletions,
        }
    }
}
