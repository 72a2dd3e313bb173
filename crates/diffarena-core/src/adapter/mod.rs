//! Consumer-facing views over a [`ParseResult`]
//!
//! Two shapes are offered. Lazy views borrow the result and decode text
//! only when asked, so scanning thousands of files for a few signals stays
//! cheap. Eager records own every string and are the form to hand across
//! a caching or serialization boundary.

mod eager;
mod lazy;

pub use eager::{FileDiff, Hunk};
pub use lazy::{ChangeStats, LazyFileDiff, LazyHunk};

use crate::result::ParseResult;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    /// Return borrowing views instead of owned records
    pub lazy: bool,
}

/// Output of [`to_file_diffs`], in file order either way.
#[derive(Debug)]
pub enum FileDiffs<'r, 'src> {
    Lazy(Vec<LazyFileDiff<'r, 'src>>),
    Eager(Vec<FileDiff>),
}

impl FileDiffs<'_, '_> {
    pub fn len(&self) -> usize {
        match self {
            FileDiffs::Lazy(views) => views.len(),
            FileDiffs::Eager(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned records, materializing lazy views if needed.
    pub fn into_eager(self) -> Vec<FileDiff> {
        match self {
            FileDiffs::Lazy(views) => views.iter().map(LazyFileDiff::to_file_diff).collect(),
            FileDiffs::Eager(records) => records,
        }
    }
}

pub fn to_file_diffs<'r, 'src>(
    result: &'r ParseResult<'src>,
    options: ConvertOptions,
) -> FileDiffs<'r, 'src> {
    if options.lazy {
        FileDiffs::Lazy(lazy_file_diffs(result).collect())
    } else {
        FileDiffs::Eager(materialize(result))
    }
}

pub fn lazy_file_diffs<'r, 'src>(
    result: &'r ParseResult<'src>,
) -> impl ExactSizeIterator<Item = LazyFileDiff<'r, 'src>> + 'r {
    result
        .arena()
        .files()
        .map(move |index| LazyFileDiff::new(result, index))
}

/// Decode every file into owned records.
pub fn materialize(result: &ParseResult<'_>) -> Vec<FileDiff> {
    let span = tracing::debug_span!("materialize", files = result.file_count());
    let _enter = span.enter();

    lazy_file_diffs(result)
        .map(|view| view.to_file_diff())
        .collect()
}

/// Every file's path, reading only the path column.
pub fn extract_file_paths<'r>(result: &'r ParseResult<'_>) -> Vec<Cow<'r, str>> {
    let arena = result.arena();
    let paths = result.paths();
    arena
        .files()
        .map(|index| paths.decode(arena.file_path(index)))
        .collect()
}

/// Whether any file path satisfies `predicate`.
///
/// Stops at the first match and decodes nothing else.
pub fn has_file_matching(result: &ParseResult<'_>, mut predicate: impl FnMut(&str) -> bool) -> bool {
    let arena = result.arena();
    let paths = result.paths();
    arena
        .files()
        .any(|index| predicate(&paths.decode(arena.file_path(index))))
}
