// Columnar arena for parsed diff records
//
// One row per file, hunk and line, stored struct-of-arrays: every field is
// its own growable fixed-width column. Rows are append-only within a parse
// and only the last row of each kind is ever extended (its hunk/line count
// grows as children are pushed). Line content is never copied; a line row
// holds an offset/length pair into the source buffer the arena borrows.
//
// Performance notes:
// - Columns are pre-sized from the input length, so a typical parse
//   performs a handful of allocations regardless of line count
// - Row indices are u32 newtypes; a file, hunk or line index cannot be
//   passed where another kind is expected

use crate::intern::PathId;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;

/// Classification of a hunk line by its prefix character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Add,
    Delete,
    Context,
}

impl LineKind {
    pub fn prefix(self) -> char {
        match self {
            LineKind::Add => '+',
            LineKind::Delete => '-',
            LineKind::Context => ' ',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl FileStatus {
    /// Map a `git diff --name-status` letter to a status.
    ///
    /// Copies count as additions and type changes as modifications.
    pub fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'A' | b'C' => Some(FileStatus::Added),
            b'M' | b'T' => Some(FileStatus::Modified),
            b'D' => Some(FileStatus::Deleted),
            b'R' => Some(FileStatus::Renamed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! row_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_index!(
    /// Row index into the arena's file columns
    FileIndex
);
row_index!(
    /// Row index into the arena's hunk columns
    HunkIndex
);
row_index!(
    /// Row index into the arena's line columns
    LineIndex
);

/// Pre-sizing hint for the three row kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaCapacity {
    pub files: usize,
    pub hunks: usize,
    pub lines: usize,
}

impl ArenaCapacity {
    /// Estimate row counts for a diff of `bytes` length.
    ///
    /// Tuned on git output: lines average ~40 bytes, with roughly one hunk
    /// per 16 lines and one file per 32.
    pub fn estimate(bytes: usize) -> Self {
        let lines = bytes / 40 + 16;
        ArenaCapacity {
            files: lines / 32 + 4,
            hunks: lines / 16 + 4,
            lines,
        }
    }
}

/// Values supplied when opening a file row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathId,
    pub old_path: Option<PathId>,
    pub status: FileStatus,
    pub binary: bool,
    pub similarity: Option<u8>,
}

/// Values supplied when opening a hunk row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRecord {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub section: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRow {
    pub index: FileIndex,
    pub path: PathId,
    pub old_path: Option<PathId>,
    pub status: FileStatus,
    pub binary: bool,
    pub similarity: Option<u8>,
    pub first_hunk: HunkIndex,
    pub hunk_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRow {
    pub index: HunkIndex,
    pub file: FileIndex,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub section: Span,
    pub first_line: LineIndex,
    pub line_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRow {
    pub index: LineIndex,
    pub hunk: HunkIndex,
    pub kind: LineKind,
    pub span: Span,
    /// Followed by `\ No newline at end of file`.
    pub missing_newline: bool,
}

#[derive(Debug, Default)]
struct FileColumns {
    path: Vec<PathId>,
    old_path: Vec<Option<PathId>>,
    status: Vec<FileStatus>,
    binary: Vec<bool>,
    similarity: Vec<Option<u8>>,
    first_hunk: Vec<u32>,
    hunk_count: Vec<u32>,
}

impl FileColumns {
    fn with_capacity(n: usize) -> Self {
        FileColumns {
            path: Vec::with_capacity(n),
            old_path: Vec::with_capacity(n),
            status: Vec::with_capacity(n),
            binary: Vec::with_capacity(n),
            similarity: Vec::with_capacity(n),
            first_hunk: Vec::with_capacity(n),
            hunk_count: Vec::with_capacity(n),
        }
    }

    fn memory_usage(&self) -> usize {
        let n = self.path.capacity();
        n * (std::mem::size_of::<PathId>()
            + std::mem::size_of::<Option<PathId>>()
            + std::mem::size_of::<FileStatus>()
            + std::mem::size_of::<bool>()
            + std::mem::size_of::<Option<u8>>()
            + 2 * std::mem::size_of::<u32>())
    }
}

#[derive(Debug, Default)]
struct HunkColumns {
    file: Vec<u32>,
    old_start: Vec<u32>,
    old_lines: Vec<u32>,
    new_start: Vec<u32>,
    new_lines: Vec<u32>,
    section: Vec<Span>,
    first_line: Vec<u32>,
    line_count: Vec<u32>,
}

impl HunkColumns {
    fn with_capacity(n: usize) -> Self {
        HunkColumns {
            file: Vec::with_capacity(n),
            old_start: Vec::with_capacity(n),
            old_lines: Vec::with_capacity(n),
            new_start: Vec::with_capacity(n),
            new_lines: Vec::with_capacity(n),
            section: Vec::with_capacity(n),
            first_line: Vec::with_capacity(n),
            line_count: Vec::with_capacity(n),
        }
    }

    fn memory_usage(&self) -> usize {
        self.file.capacity() * (7 * std::mem::size_of::<u32>() + std::mem::size_of::<Span>())
    }
}

#[derive(Debug, Default)]
struct LineColumns {
    hunk: Vec<u32>,
    kind: Vec<LineKind>,
    offset: Vec<u32>,
    len: Vec<u32>,
    missing_newline: Vec<bool>,
}

impl LineColumns {
    fn with_capacity(n: usize) -> Self {
        LineColumns {
            hunk: Vec::with_capacity(n),
            kind: Vec::with_capacity(n),
            offset: Vec::with_capacity(n),
            len: Vec::with_capacity(n),
            missing_newline: Vec::with_capacity(n),
        }
    }

    fn memory_usage(&self) -> usize {
        self.hunk.capacity()
            * (3 * std::mem::size_of::<u32>()
                + std::mem::size_of::<LineKind>()
                + std::mem::size_of::<bool>())
    }
}

/// Struct-of-arrays storage for one parse.
///
/// Borrows the source buffer so line rows can refer to content by offset.
/// Out-of-range row indices are caller bugs and panic.
#[derive(Debug)]
pub struct DiffArena<'src> {
    source: &'src [u8],
    files: FileColumns,
    hunks: HunkColumns,
    lines: LineColumns,
}

impl<'src> DiffArena<'src> {
    /// Create an arena pre-sized for a diff of the given source.
    pub fn for_size(source: &'src [u8]) -> Self {
        Self::with_capacity(source, ArenaCapacity::estimate(source.len()))
    }

    pub fn with_capacity(source: &'src [u8], capacity: ArenaCapacity) -> Self {
        DiffArena {
            source,
            files: FileColumns::with_capacity(capacity.files),
            hunks: HunkColumns::with_capacity(capacity.hunks),
            lines: LineColumns::with_capacity(capacity.lines),
        }
    }

    pub fn source(&self) -> &'src [u8] {
        self.source
    }

    /// Append a file row. Its hunks are the ones pushed until the next file.
    pub fn push_file(&mut self, record: FileRecord) -> FileIndex {
        let index = FileIndex::new(self.files.path.len());
        self.files.path.push(record.path);
        self.files.old_path.push(record.old_path);
        self.files.status.push(record.status);
        self.files.binary.push(record.binary);
        self.files.similarity.push(record.similarity);
        self.files.first_hunk.push(self.hunks.file.len() as u32);
        self.files.hunk_count.push(0);
        index
    }

    /// Append a hunk row owned by the most recently pushed file.
    pub fn push_hunk(&mut self, record: HunkRecord) -> HunkIndex {
        let Some(count) = self.files.hunk_count.last_mut() else {
            panic!("push_hunk called before any file row");
        };
        *count += 1;

        let index = HunkIndex::new(self.hunks.file.len());
        self.hunks.file.push(self.files.path.len() as u32 - 1);
        self.hunks.old_start.push(record.old_start);
        self.hunks.old_lines.push(record.old_lines);
        self.hunks.new_start.push(record.new_start);
        self.hunks.new_lines.push(record.new_lines);
        self.hunks.section.push(record.section);
        self.hunks.first_line.push(self.lines.hunk.len() as u32);
        self.hunks.line_count.push(0);
        index
    }

    /// Append a line row owned by the most recently pushed hunk.
    ///
    /// `span` must lie within the source buffer.
    pub fn push_line(&mut self, kind: LineKind, span: Span) -> LineIndex {
        assert!(
            span.end() <= self.source.len(),
            "line span {} outside source of {} bytes",
            span,
            self.source.len()
        );
        let Some(count) = self.hunks.line_count.last_mut() else {
            panic!("push_line called before any hunk row");
        };
        *count += 1;

        let index = LineIndex::new(self.lines.hunk.len());
        self.lines.hunk.push(self.hunks.file.len() as u32 - 1);
        self.lines.kind.push(kind);
        self.lines.offset.push(span.start);
        self.lines.len.push(span.len);
        self.lines.missing_newline.push(false);
        index
    }

    /// Flag the most recent line as lacking a trailing newline.
    /// Returns false when there is no line to flag.
    pub fn mark_missing_newline(&mut self) -> bool {
        match self.lines.missing_newline.last_mut() {
            Some(flag) => {
                *flag = true;
                true
            }
            None => false,
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.path.len()
    }

    pub fn hunk_count(&self) -> usize {
        self.hunks.file.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.hunk.len()
    }

    pub fn file(&self, index: FileIndex) -> FileRow {
        let i = index.index();
        FileRow {
            index,
            path: self.files.path[i],
            old_path: self.files.old_path[i],
            status: self.files.status[i],
            binary: self.files.binary[i],
            similarity: self.files.similarity[i],
            first_hunk: HunkIndex(self.files.first_hunk[i]),
            hunk_count: self.files.hunk_count[i],
        }
    }

    pub fn hunk(&self, index: HunkIndex) -> HunkRow {
        let i = index.index();
        HunkRow {
            index,
            file: FileIndex(self.hunks.file[i]),
            old_start: self.hunks.old_start[i],
            old_lines: self.hunks.old_lines[i],
            new_start: self.hunks.new_start[i],
            new_lines: self.hunks.new_lines[i],
            section: self.hunks.section[i],
            first_line: LineIndex(self.hunks.first_line[i]),
            line_count: self.hunks.line_count[i],
        }
    }

    pub fn line(&self, index: LineIndex) -> LineRow {
        let i = index.index();
        LineRow {
            index,
            hunk: HunkIndex(self.lines.hunk[i]),
            kind: self.lines.kind[i],
            span: self.line_span(index),
            missing_newline: self.lines.missing_newline[i],
        }
    }

    /// Column-only reads for scans that need a single field.
    pub fn file_path(&self, index: FileIndex) -> PathId {
        self.files.path[index.index()]
    }

    pub fn file_status(&self, index: FileIndex) -> FileStatus {
        self.files.status[index.index()]
    }

    pub fn line_kind(&self, index: LineIndex) -> LineKind {
        self.lines.kind[index.index()]
    }

    pub fn line_span(&self, index: LineIndex) -> Span {
        let i = index.index();
        Span {
            start: self.lines.offset[i],
            len: self.lines.len[i],
        }
    }

    /// Content of a line, without its prefix character.
    pub fn line_bytes(&self, index: LineIndex) -> &'src [u8] {
        self.line_span(index).slice(self.source)
    }

    pub fn line_text(&self, index: LineIndex) -> Cow<'src, str> {
        String::from_utf8_lossy(self.line_bytes(index))
    }

    pub fn section_text(&self, index: HunkIndex) -> Cow<'src, str> {
        String::from_utf8_lossy(self.hunks.section[index.index()].slice(self.source))
    }

    pub fn files(&self) -> impl ExactSizeIterator<Item = FileIndex> {
        (0..self.file_count() as u32).map(FileIndex)
    }

    pub fn hunks_of(&self, file: FileIndex) -> impl ExactSizeIterator<Item = HunkIndex> {
        let i = file.index();
        let first = self.files.first_hunk[i];
        (first..first + self.files.hunk_count[i]).map(HunkIndex)
    }

    pub fn lines_of(&self, hunk: HunkIndex) -> impl ExactSizeIterator<Item = LineIndex> {
        let i = hunk.index();
        let first = self.hunks.first_line[i];
        (first..first + self.hunks.line_count[i]).map(LineIndex)
    }

    /// All line rows belonging to a file, across its hunks.
    ///
    /// Hunks of one file are contiguous and so are their lines.
    pub fn lines_of_file(&self, file: FileIndex) -> impl ExactSizeIterator<Item = LineIndex> {
        self.line_range_of_file(file).map(|i| LineIndex(i as u32))
    }

    fn line_range_of_file(&self, file: FileIndex) -> Range<usize> {
        let i = file.index();
        let count = self.files.hunk_count[i] as usize;
        if count == 0 {
            return 0..0;
        }
        let first_hunk = self.files.first_hunk[i] as usize;
        let last_hunk = first_hunk + count - 1;
        let start = self.hunks.first_line[first_hunk] as usize;
        let end = self.hunks.first_line[last_hunk] as usize + self.hunks.line_count[last_hunk] as usize;
        start..end
    }

    /// Approximate heap bytes reserved by the columns.
    ///
    /// Excludes the source buffer, which the arena only borrows.
    pub fn memory_usage(&self) -> usize {
        self.files.memory_usage() + self.hunks.memory_usage() + self.lines.memory_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &[u8] = b"+one\n+two\n-three\n";

    fn file_record(path: u32) -> FileRecord {
        FileRecord {
            path: PathId::from_u32(path),
            old_path: None,
            status: FileStatus::Modified,
            binary: false,
            similarity: None,
        }
    }

    fn hunk_record() -> HunkRecord {
        HunkRecord {
            old_start: 1,
            old_lines: 1,
            new_start: 1,
            new_lines: 2,
            section: Span::EMPTY,
        }
    }

    #[test]
    fn test_push_links_children() {
        let mut arena = DiffArena::for_size(SRC);
        let file = arena.push_file(file_record(0));
        let hunk = arena.push_hunk(hunk_record());
        let a = arena.push_line(LineKind::Add, Span::new(1, 4));
        let b = arena.push_line(LineKind::Add, Span::new(6, 9));
        let c = arena.push_line(LineKind::Delete, Span::new(11, 16));

        let row = arena.file(file);
        assert_eq!(row.first_hunk, hunk);
        assert_eq!(row.hunk_count, 1);

        let hunk_row = arena.hunk(hunk);
        assert_eq!(hunk_row.file, file);
        assert_eq!(hunk_row.first_line, a);
        assert_eq!(hunk_row.line_count, 3);

        assert_eq!(arena.line_bytes(a), b"one");
        assert_eq!(arena.line_bytes(b), b"two");
        assert_eq!(arena.line_text(c), "three");
        assert_eq!(arena.line(c).hunk, hunk);
    }

    #[test]
    fn test_indices_are_monotonic() {
        let mut arena = DiffArena::for_size(SRC);
        let f0 = arena.push_file(file_record(0));
        let h0 = arena.push_hunk(hunk_record());
        let f1 = arena.push_file(file_record(1));
        let h1 = arena.push_hunk(hunk_record());
        let h2 = arena.push_hunk(hunk_record());

        assert!(f0 < f1);
        assert!(h0 < h1 && h1 < h2);
        assert_eq!(arena.hunks_of(f0).collect::<Vec<_>>(), vec![h0]);
        assert_eq!(arena.hunks_of(f1).collect::<Vec<_>>(), vec![h1, h2]);
    }

    #[test]
    fn test_file_without_hunks() {
        let mut arena = DiffArena::for_size(SRC);
        let binary = arena.push_file(FileRecord {
            binary: true,
            ..file_record(0)
        });
        let next = arena.push_file(file_record(1));
        arena.push_hunk(hunk_record());
        arena.push_line(LineKind::Add, Span::new(1, 4));

        assert_eq!(arena.hunks_of(binary).len(), 0);
        assert_eq!(arena.lines_of_file(binary).len(), 0);
        assert_eq!(arena.lines_of_file(next).len(), 1);
        assert!(arena.file(binary).binary);
    }

    #[test]
    fn test_lines_of_file_spans_hunks() {
        let mut arena = DiffArena::for_size(SRC);
        let file = arena.push_file(file_record(0));
        arena.push_hunk(hunk_record());
        arena.push_line(LineKind::Add, Span::new(1, 4));
        arena.push_hunk(hunk_record());
        arena.push_line(LineKind::Add, Span::new(6, 9));
        arena.push_line(LineKind::Delete, Span::new(11, 16));

        let kinds: Vec<_> = arena.lines_of_file(file).map(|l| arena.line_kind(l)).collect();
        assert_eq!(kinds, vec![LineKind::Add, LineKind::Add, LineKind::Delete]);
    }

    #[test]
    fn test_mark_missing_newline() {
        let mut arena = DiffArena::for_size(SRC);
        assert!(!arena.mark_missing_newline());
        arena.push_file(file_record(0));
        arena.push_hunk(hunk_record());
        let line = arena.push_line(LineKind::Add, Span::new(1, 4));
        assert!(arena.mark_missing_newline());
        assert!(arena.line(line).missing_newline);
    }

    #[test]
    fn test_growth_past_estimate() {
        let mut arena = DiffArena::with_capacity(
            SRC,
            ArenaCapacity {
                files: 1,
                hunks: 1,
                lines: 1,
            },
        );
        arena.push_file(file_record(0));
        arena.push_hunk(hunk_record());
        for _ in 0..100 {
            arena.push_line(LineKind::Context, Span::new(0, 4));
        }
        assert_eq!(arena.line_count(), 100);
        assert_eq!(arena.hunk(HunkIndex::new(0)).line_count, 100);
    }

    #[test]
    #[should_panic(expected = "before any file row")]
    fn test_hunk_without_file_panics() {
        let mut arena = DiffArena::for_size(SRC);
        arena.push_hunk(hunk_record());
    }

    #[test]
    #[should_panic(expected = "outside source")]
    fn test_line_outside_source_panics() {
        let mut arena = DiffArena::for_size(SRC);
        arena.push_file(file_record(0));
        arena.push_hunk(hunk_record());
        arena.push_line(LineKind::Add, Span::new(10, 100));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_file_panics() {
        let arena = DiffArena::for_size(SRC);
        arena.file(FileIndex::new(3));
    }

    #[test]
    fn test_status_letters() {
        assert_eq!(FileStatus::from_letter(b'A'), Some(FileStatus::Added));
        assert_eq!(FileStatus::from_letter(b'C'), Some(FileStatus::Added));
        assert_eq!(FileStatus::from_letter(b'T'), Some(FileStatus::Modified));
        assert_eq!(FileStatus::from_letter(b'R'), Some(FileStatus::Renamed));
        assert_eq!(FileStatus::from_letter(b'X'), None);
    }
}
