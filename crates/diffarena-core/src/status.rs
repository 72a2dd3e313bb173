//! Status reconciliation against `git diff --name-status` output
//!
//! Diff text alone cannot always tell a rename from a delete plus an add,
//! and says nothing about files whose body was suppressed. The name-status
//! listing is authoritative on both, so its verdict replaces the parser's
//! provisional status after conversion.

use crate::adapter::{FileDiff, LazyFileDiff};
use crate::arena::FileStatus;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// One line of a name-status listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatusEntry {
    pub status: FileStatus,
    pub path: String,
    /// Source path for renames and copies
    pub old_path: Option<String>,
    /// Similarity score from `R<nnn>` / `C<nnn>`
    pub score: Option<u8>,
}

/// Parsed listing, keyed by new path in listing order.
#[derive(Debug, Clone, Default)]
pub struct NameStatusListing {
    entries: IndexMap<String, NameStatusEntry>,
}

/// What [`reconcile`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    /// Records whose status or old path the listing changed
    pub overridden: usize,
    /// Deleted records merged into the rename that consumed them
    pub folded: usize,
    /// Hunkless records added for listed files absent from the diff
    pub appended: usize,
}

impl NameStatusListing {
    /// Parse `STATUS<TAB>PATH` and `STATUS<TAB>OLD<TAB>NEW` lines.
    ///
    /// Blank lines, unknown status letters and lines missing a path are
    /// skipped.
    pub fn parse(text: &str) -> Self {
        let mut entries = IndexMap::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            match parse_entry(line) {
                Some(entry) => {
                    entries.insert(entry.path.clone(), entry);
                }
                None => tracing::debug!(line, "skipping unreadable name-status line"),
            }
        }

        NameStatusListing { entries }
    }

    pub fn get(&self, path: &str) -> Option<&NameStatusEntry> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameStatusEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<NameStatusEntry> for NameStatusListing {
    fn from_iter<I: IntoIterator<Item = NameStatusEntry>>(iter: I) -> Self {
        NameStatusListing {
            entries: iter
                .into_iter()
                .map(|entry| (entry.path.clone(), entry))
                .collect(),
        }
    }
}

fn parse_entry(line: &str) -> Option<NameStatusEntry> {
    let mut fields = line.split('\t');
    let code = fields.next()?;
    let status = FileStatus::from_letter(*code.as_bytes().first()?)?;
    let score = code[1..].parse::<u8>().ok();

    let first = fields.next().filter(|f| !f.is_empty())?;
    let (old_path, path) = match fields.next().filter(|f| !f.is_empty()) {
        Some(second) => (Some(first.to_string()), second.to_string()),
        None => (None, first.to_string()),
    };

    Some(NameStatusEntry {
        status,
        path,
        old_path,
        score,
    })
}

/// Override provisional statuses with the listing's.
///
/// - A record whose path is listed takes the listed status and old path.
/// - A deleted record whose path is the source of a listed rename is the
///   other half of that rename: its hunks move onto the renamed record and
///   the deleted record is dropped. With no renamed record to join, the
///   deleted record itself becomes the rename.
/// - Listed files with no record are appended without hunks.
pub fn reconcile(diffs: &mut Vec<FileDiff>, listing: &NameStatusListing) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    let mut matched = vec![false; listing.len()];

    for diff in diffs.iter_mut() {
        let Some((slot, _, entry)) = listing.entries.get_full(diff.path.as_str()) else {
            continue;
        };
        matched[slot] = true;
        if diff.status != entry.status || diff.old_path != entry.old_path {
            diff.status = entry.status;
            diff.old_path = entry.old_path.clone();
            summary.overridden += 1;
        }
    }

    let rename_sources: FxHashMap<&str, &str> = listing
        .iter()
        .filter(|entry| entry.status == FileStatus::Renamed)
        .filter_map(|entry| Some((entry.old_path.as_deref()?, entry.path.as_str())))
        .collect();

    let mut index = 0;
    while index < diffs.len() {
        let diff = &diffs[index];
        let new_path = if diff.status == FileStatus::Deleted && listing.get(&diff.path).is_none() {
            rename_sources.get(diff.path.as_str()).copied()
        } else {
            None
        };
        let Some(new_path) = new_path else {
            index += 1;
            continue;
        };

        match diffs.iter().position(|d| d.path == new_path) {
            Some(target) => {
                let deleted = diffs.remove(index);
                let target = if target > index { target - 1 } else { target };
                let renamed = &mut diffs[target];
                let mut hunks = deleted.hunks;
                hunks.append(&mut renamed.hunks);
                renamed.hunks = hunks;
                renamed.binary |= deleted.binary;
                summary.folded += 1;
            }
            None => {
                // Only the old half made it into the diff body.
                if let Some(slot) = listing.entries.get_index_of(new_path) {
                    matched[slot] = true;
                }
                let diff = &mut diffs[index];
                diff.old_path = Some(std::mem::replace(&mut diff.path, new_path.to_string()));
                diff.status = FileStatus::Renamed;
                summary.overridden += 1;
                index += 1;
            }
        }
    }

    for (slot, entry) in listing.iter().enumerate() {
        if matched[slot] {
            continue;
        }
        let mut diff = FileDiff::new(entry.path.clone(), entry.status);
        diff.old_path = entry.old_path.clone();
        diffs.push(diff);
        summary.appended += 1;
    }

    tracing::debug!(
        overridden = summary.overridden,
        folded = summary.folded,
        appended = summary.appended,
        "reconciled statuses"
    );
    summary
}

impl LazyFileDiff<'_, '_> {
    /// This file's status once the listing is taken into account.
    pub fn reconciled_status(&self, listing: &NameStatusListing) -> FileStatus {
        listing
            .get(&self.path())
            .map_or_else(|| self.status(), |entry| entry.status)
    }
}
