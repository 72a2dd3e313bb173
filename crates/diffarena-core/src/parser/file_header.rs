use crate::arena::{FileRecord, FileStatus};
use crate::config::ParseOptions;
use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::intern::{InternPool, PathId};
use crate::scanner::{parse_decimal, quoted_end, PathMarker};
use crate::span::Span;

const DEFAULT_PREFIXES: (&[u8], &[u8]) = (b"a/", b"b/");

/// Prefix pairs written under `diff.mnemonicPrefix`: (c)ommit, (i)ndex,
/// (w)ork tree, (o)bject, and `1/` `2/` for `--no-index`.
const MNEMONIC_PREFIXES: [(&[u8], &[u8]); 5] = [
    (b"i/", b"w/"),
    (b"c/", b"w/"),
    (b"c/", b"i/"),
    (b"o/", b"w/"),
    (b"1/", b"2/"),
];

/// Header lines collected for a file before its row is pushed.
///
/// A file row is only written once its first hunk arrives (or the file
/// ends), so everything here is still open to change.
#[derive(Debug, Default)]
pub(super) struct PendingFile {
    pub offset: u32,
    /// Started by `diff --git` rather than a bare `---` marker.
    pub git: bool,
    pub header_old: Option<Span>,
    pub header_new: Option<Span>,
    pub old_marker: Option<PathMarker>,
    pub new_marker: Option<PathMarker>,
    pub rename_from: Option<Span>,
    pub rename_to: Option<Span>,
    pub copy_from: Option<Span>,
    pub copy_to: Option<Span>,
    pub similarity: Option<u8>,
    pub new_file: bool,
    pub deleted_file: bool,
    pub binary: bool,
}

/// Where a path came from, and the prefix git may have put on it.
#[derive(Debug, Clone, Copy)]
struct PathSource {
    span: Span,
    prefix: Option<&'static [u8]>,
}

impl PendingFile {
    pub fn git(offset: u32, old: Span, new: Span) -> Self {
        PendingFile {
            offset,
            git: true,
            header_old: Some(old),
            header_new: Some(new),
            ..Default::default()
        }
    }

    pub fn plain(offset: u32) -> Self {
        PendingFile {
            offset,
            ..Default::default()
        }
    }

    pub fn set_similarity(&mut self, digits: &[u8]) {
        self.similarity = parse_decimal(digits).map(|percent| percent.min(100) as u8);
    }

    /// The `a/` `b/` style prefix pair this file's paths carry.
    fn prefixes(&self, source: &[u8]) -> (&'static [u8], &'static [u8]) {
        let marked = |marker: Option<PathMarker>, header: Option<Span>| match marker {
            Some(PathMarker::Path(span)) => Some(span),
            _ => header,
        };
        let (Some(old), Some(new)) = (
            marked(self.old_marker, self.header_old),
            marked(self.new_marker, self.header_new),
        ) else {
            return DEFAULT_PREFIXES;
        };

        let (old, new) = (unquoted_start(old.slice(source)), unquoted_start(new.slice(source)));
        MNEMONIC_PREFIXES
            .into_iter()
            .find(|&(old_prefix, new_prefix)| old.starts_with(old_prefix) && new.starts_with(new_prefix))
            .unwrap_or(DEFAULT_PREFIXES)
    }

    fn old_source(&self, prefix: &'static [u8]) -> Option<PathSource> {
        let prefixed = |span| PathSource {
            span,
            prefix: Some(prefix),
        };
        let bare = |span| PathSource { span, prefix: None };

        match self.old_marker {
            Some(PathMarker::Path(span)) => Some(prefixed(span)),
            _ => self
                .rename_from
                .or(self.copy_from)
                .map(bare)
                .or_else(|| self.header_old.map(prefixed)),
        }
    }

    fn new_source(&self, prefix: &'static [u8]) -> Option<PathSource> {
        let prefixed = |span| PathSource {
            span,
            prefix: Some(prefix),
        };
        let bare = |span| PathSource { span, prefix: None };

        match self.new_marker {
            Some(PathMarker::Path(span)) => Some(prefixed(span)),
            _ => self
                .rename_to
                .or(self.copy_to)
                .map(bare)
                .or_else(|| self.header_new.map(prefixed)),
        }
    }

    /// Status as far as diff syntax alone can tell.
    fn provisional_status(&self) -> FileStatus {
        if self.new_file || self.old_marker == Some(PathMarker::DevNull) {
            FileStatus::Added
        } else if self.deleted_file || self.new_marker == Some(PathMarker::DevNull) {
            FileStatus::Deleted
        } else if self.rename_from.is_some() || self.rename_to.is_some() {
            FileStatus::Renamed
        } else if self.copy_from.is_some() || self.copy_to.is_some() {
            FileStatus::Added
        } else {
            FileStatus::Modified
        }
    }

    /// Intern this file's paths and build its row.
    ///
    /// Returns `None` when no usable path exists.
    pub fn resolve(&self, paths: &mut PathResolver<'_, '_>) -> Option<FileRecord> {
        let status = self.provisional_status();
        let copied = self.copy_from.is_some() || self.copy_to.is_some();
        let (old_prefix, new_prefix) = self.prefixes(paths.source);
        let old_source = || self.old_source(old_prefix);
        let new_source = || self.new_source(new_prefix);

        let record = |path, old_path, status| FileRecord {
            path,
            old_path,
            status,
            binary: self.binary,
            similarity: self.similarity,
        };

        match status {
            FileStatus::Added if copied => {
                let path = paths.intern(new_source()?)?;
                let old_path = old_source().and_then(|source| paths.intern(source));
                Some(record(path, old_path, status))
            }
            FileStatus::Added => {
                let path = paths.intern(new_source()?)?;
                Some(record(path, None, status))
            }
            FileStatus::Deleted => {
                let source = old_source().or_else(new_source)?;
                let path = paths.intern(source)?;
                Some(record(path, None, status))
            }
            FileStatus::Renamed | FileStatus::Modified => {
                let path = match new_source().and_then(|source| paths.intern(source)) {
                    Some(path) => path,
                    None => paths.intern(old_source()?)?,
                };
                let old_path = old_source().and_then(|source| paths.intern(source));

                match old_path {
                    Some(old) if old != path && (self.git || status == FileStatus::Renamed) => {
                        Some(record(path, Some(old), FileStatus::Renamed))
                    }
                    _ => Some(record(path, None, FileStatus::Modified)),
                }
            }
        }
    }
}

/// Turns header spans into interned path IDs.
pub(super) struct PathResolver<'a, 'src> {
    pub source: &'src [u8],
    pub pool: &'a mut InternPool<'src>,
    pub diagnostics: &'a mut DiagnosticSink,
    pub options: &'a ParseOptions,
}

impl<'src> PathResolver<'_, 'src> {
    fn intern(&mut self, path: PathSource) -> Option<PathId> {
        let prefix = path.prefix.filter(|_| self.options.strip_path_prefixes);
        let bytes = path.span.slice(self.source);

        if self.options.unquote_paths && is_quoted(bytes) {
            match unquote(bytes) {
                Some(mut owned) => {
                    if let Some(prefix) = prefix {
                        if owned.starts_with(prefix) {
                            owned.drain(..prefix.len());
                        }
                    }
                    return (!owned.is_empty()).then(|| self.pool.intern_owned(owned));
                }
                None => self.diagnostics.report(
                    DiagnosticCode::InvalidQuotedPath,
                    path.span.start,
                    || format!("invalid escape in {}", String::from_utf8_lossy(bytes)),
                ),
            }
        }

        let bytes = match prefix {
            Some(prefix) => bytes.strip_prefix(prefix).unwrap_or(bytes),
            None => bytes,
        };
        (!bytes.is_empty()).then(|| self.pool.intern(bytes))
    }
}

/// Path bytes with an opening quote skipped, for prefix checks.
fn unquoted_start(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\"").unwrap_or(bytes)
}

fn is_quoted(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == b'"' && quoted_end(bytes, 0) == Some(bytes.len())
}

/// Decode a C-quoted path as git writes it: `"dir/t\303\251st \"x\".txt"`.
///
/// Returns `None` on an unknown escape or a truncated octal sequence.
pub fn unquote(quoted: &[u8]) -> Option<Vec<u8>> {
    if quoted.len() < 2 {
        return None;
    }
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = Vec::with_capacity(inner.len());
    let mut i = 0;

    while i < inner.len() {
        let byte = inner[i];
        if byte != b'\\' {
            out.push(byte);
            i += 1;
            continue;
        }

        let escape = *inner.get(i + 1)?;
        i += 2;
        let decoded = match escape {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            b'\\' | b'"' => escape,
            b'0'..=b'3' => {
                let digits = inner.get(i..i + 2)?;
                if !digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                    return None;
                }
                i += 2;
                ((escape - b'0') << 6) | ((digits[0] - b'0') << 3) | (digits[1] - b'0')
            }
            _ => return None,
        };
        out.push(decoded);
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_octal_utf8() {
        let decoded = unquote(br#""a/t\303\251st.txt""#).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "a/tést.txt");
    }

    #[test]
    fn test_unquote_simple_escapes() {
        let decoded = unquote(br#""tab\there \"q\" back\\slash""#).unwrap();
        assert_eq!(decoded, b"tab\there \"q\" back\\slash");
    }

    #[test]
    fn test_unquote_rejects_bad_escapes() {
        assert!(unquote(br#""bad\qescape""#).is_none());
        assert!(unquote(br#""short\30""#).is_none());
        assert!(unquote(br#""octal\39z""#).is_none());
    }

    #[test]
    fn test_provisional_status_from_markers() {
        let mut pending = PendingFile::plain(0);
        pending.old_marker = Some(PathMarker::DevNull);
        assert_eq!(pending.provisional_status(), FileStatus::Added);

        let mut pending = PendingFile::plain(0);
        pending.new_marker = Some(PathMarker::DevNull);
        assert_eq!(pending.provisional_status(), FileStatus::Deleted);

        let mut pending = PendingFile::plain(0);
        pending.rename_from = Some(Span::EMPTY);
        assert_eq!(pending.provisional_status(), FileStatus::Renamed);

        assert_eq!(PendingFile::plain(0).provisional_status(), FileStatus::Modified);
    }

    #[test]
    fn test_mnemonic_prefixes_detected_per_file() {
        let source = b"i/x.ts w/x.ts a/y b/y c/z w/q";
        let span = |start: usize, end: usize| Some(Span::new(start, end));

        let index_vs_worktree = PendingFile {
            header_old: span(0, 6),
            header_new: span(7, 13),
            ..PendingFile::plain(0)
        };
        assert_eq!(index_vs_worktree.prefixes(source), (&b"i/"[..], &b"w/"[..]));

        let default = PendingFile {
            header_old: span(14, 17),
            header_new: span(18, 21),
            ..PendingFile::plain(0)
        };
        assert_eq!(default.prefixes(source), DEFAULT_PREFIXES);

        let commit_vs_worktree = PendingFile {
            old_marker: Some(PathMarker::Path(Span::new(22, 25))),
            new_marker: Some(PathMarker::Path(Span::new(26, 29))),
            ..PendingFile::plain(0)
        };
        assert_eq!(commit_vs_worktree.prefixes(source), (&b"c/"[..], &b"w/"[..]));

        // only one side present
        let lone = PendingFile {
            header_new: span(7, 13),
            ..PendingFile::plain(0)
        };
        assert_eq!(lone.prefixes(source), DEFAULT_PREFIXES);
    }

    #[test]
    fn test_similarity_clamped() {
        let mut pending = PendingFile::plain(0);
        pending.set_similarity(b"250");
        assert_eq!(pending.similarity, Some(100));
        pending.set_similarity(b"");
        assert_eq!(pending.similarity, None);
    }
}
