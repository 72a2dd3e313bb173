// Zero-copy line scanner for unified diff text
//
// The scanner walks the raw buffer one line at a time and classifies each
// line by its leading bytes. It never allocates: every token is a small tag
// plus spans into the source. Interpretation (which file a line belongs to,
// whether a `---` line is a header or a deleted `--` line) is left to the
// streaming parser, which drives the scanner one token at a time.

use crate::arena::LineKind;
use crate::span::Span;

/// Target of a `---` / `+++` marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMarker {
    /// A path, with any tab-separated timestamp trimmed off.
    Path(Span),
    /// `/dev/null`, meaning the file does not exist on this side.
    DevNull,
}

/// Field locations of a `@@ -a,b +c,d @@ section` header.
///
/// Counts are `None` when the header omits them (`@@ -3 +3 @@`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkFields {
    pub old_start: Span,
    pub old_lines: Option<Span>,
    pub new_start: Span,
    pub new_lines: Option<Span>,
    /// Text after the closing `@@`, usually the enclosing function.
    pub section: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `diff --git a/<old> b/<new>`; spans still carry their prefixes.
    FileHeader { old: Span, new: Span },
    OldPath(PathMarker),
    NewPath(PathMarker),
    HunkHeader(HunkFields),
    /// A line starting with `@@ ` whose fields could not be located.
    MalformedHunkHeader,
    Content { kind: LineKind, text: Span },
    /// `\ No newline at end of file`
    NoNewlineMarker,
    /// `Binary files ... differ` or `GIT binary patch`
    Binary,
    RenameFrom(Span),
    RenameTo(Span),
    CopyFrom(Span),
    CopyTo(Span),
    /// Digits of `similarity index NN%`.
    Similarity(Span),
    NewFileMode,
    DeletedFileMode,
    /// `index`, `old mode`, `new mode` and `dissimilarity index` lines.
    ExtendedHeader,
    /// Anything else, including blank lines.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The whole line, without its terminator or a `\r` before it.
    pub line: Span,
    /// A `\r` follows `line` and belongs to content text.
    pub carriage_return: bool,
}

impl Token {
    /// Reinterpret this line as hunk content based on its first byte.
    ///
    /// Inside a hunk `--- x` is a deleted line `-- x`, not a marker; the
    /// parser uses this to override the context-free classification.
    pub fn as_content(&self, src: &[u8]) -> Option<(LineKind, Span)> {
        let kind = match self.line.slice(src).first()? {
            b'+' => LineKind::Add,
            b'-' => LineKind::Delete,
            b' ' => LineKind::Context,
            _ => return None,
        };
        let mut text = self.line.skip(1);
        if self.carriage_return {
            text.len += 1;
        }
        Some((kind, text))
    }
}

const FILE_HEADER: &[u8] = b"diff --git ";
const DEV_NULL: &[u8] = b"/dev/null";

pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    keep_carriage_returns: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self::with_carriage_returns(src, false)
    }

    /// Create a scanner that keeps (`true`) or drops a `\r` before `\n`.
    pub fn with_carriage_returns(src: &'a [u8], keep: bool) -> Self {
        Scanner {
            src,
            pos: 0,
            keep_carriage_returns: keep,
        }
    }

    /// Byte offset of the next unread line.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.src.len() {
            return None;
        }

        let start = self.pos;
        let end = self.src[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.src.len(), |i| start + i);
        self.pos = (end + 1).min(self.src.len());

        let trailing_cr = end > start && self.src[end - 1] == b'\r';
        let line = Span::new(start, if trailing_cr { end - 1 } else { end });
        let carriage_return = trailing_cr && self.keep_carriage_returns;

        let mut kind = self.classify(line);
        if let TokenKind::Content { text, .. } = &mut kind {
            if carriage_return {
                text.len += 1;
            }
        }
        Some(Token {
            kind,
            line,
            carriage_return,
        })
    }

    fn classify(&self, line: Span) -> TokenKind {
        let bytes = line.slice(self.src);
        let Some(&first) = bytes.first() else {
            return TokenKind::Other;
        };

        match first {
            b'+' if bytes.starts_with(b"+++ ") => TokenKind::NewPath(self.marker(line.skip(4))),
            b'+' => TokenKind::Content {
                kind: LineKind::Add,
                text: line.skip(1),
            },
            b'-' if bytes.starts_with(b"--- ") => TokenKind::OldPath(self.marker(line.skip(4))),
            b'-' => TokenKind::Content {
                kind: LineKind::Delete,
                text: line.skip(1),
            },
            b' ' => TokenKind::Content {
                kind: LineKind::Context,
                text: line.skip(1),
            },
            b'@' if bytes.starts_with(b"@@ -") => self
                .hunk_header(line)
                .map_or(TokenKind::MalformedHunkHeader, TokenKind::HunkHeader),
            b'@' if bytes.starts_with(b"@@ ") => TokenKind::MalformedHunkHeader,
            b'\\' => TokenKind::NoNewlineMarker,
            b'd' if bytes.starts_with(FILE_HEADER) => self.file_header(line),
            b'd' if bytes.starts_with(b"deleted file mode ") => TokenKind::DeletedFileMode,
            b'd' if bytes.starts_with(b"dissimilarity index ") => TokenKind::ExtendedHeader,
            b'r' | b'c' => self.prefixed(line, bytes),
            b's' if bytes.starts_with(b"similarity index ") => {
                let digits = line.skip(b"similarity index ".len());
                let len = digits
                    .slice(self.src)
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                TokenKind::Similarity(Span {
                    start: digits.start,
                    len: len as u32,
                })
            }
            b'n' if bytes.starts_with(b"new file mode ") => TokenKind::NewFileMode,
            b'n' if bytes.starts_with(b"new mode ") => TokenKind::ExtendedHeader,
            b'o' if bytes.starts_with(b"old mode ") => TokenKind::ExtendedHeader,
            b'i' if bytes.starts_with(b"index ") => TokenKind::ExtendedHeader,
            b'B' if bytes.starts_with(b"Binary files ") && bytes.ends_with(b" differ") => {
                TokenKind::Binary
            }
            b'G' if bytes.starts_with(b"GIT binary patch") => TokenKind::Binary,
            _ => TokenKind::Other,
        }
    }

    // rename/copy headers share a shape: fixed prefix, then a path
    fn prefixed(&self, line: Span, bytes: &[u8]) -> TokenKind {
        let after = |prefix: &[u8]| bytes.starts_with(prefix).then(|| line.skip(prefix.len()));

        if let Some(path) = after(b"rename from ").or_else(|| after(b"rename old ")) {
            TokenKind::RenameFrom(path)
        } else if let Some(path) = after(b"rename to ").or_else(|| after(b"rename new ")) {
            TokenKind::RenameTo(path)
        } else if let Some(path) = after(b"copy from ") {
            TokenKind::CopyFrom(path)
        } else if let Some(path) = after(b"copy to ") {
            TokenKind::CopyTo(path)
        } else {
            TokenKind::Other
        }
    }

    fn marker(&self, path: Span) -> PathMarker {
        let bytes = path.slice(self.src);
        let len = bytes.iter().position(|&b| b == b'\t').unwrap_or(bytes.len());
        if &bytes[..len] == DEV_NULL {
            PathMarker::DevNull
        } else {
            PathMarker::Path(Span {
                start: path.start,
                len: len as u32,
            })
        }
    }

    fn file_header(&self, line: Span) -> TokenKind {
        let rest = line.skip(FILE_HEADER.len());
        let bytes = rest.slice(self.src);
        let at = |from: usize, to: usize| Span::new(rest.start as usize + from, rest.start as usize + to);

        let split = if bytes.first() == Some(&b'"') {
            quoted_end(bytes, 0).filter(|&end| bytes.get(end) == Some(&b' '))
        } else if bytes.last() == Some(&b'"') {
            // only the new side is quoted: find the ` "` that opens it
            (0..bytes.len().saturating_sub(1))
                .find(|&i| bytes[i] == b' ' && bytes[i + 1] == b'"' && quoted_end(bytes, i + 1) == Some(bytes.len()))
        } else {
            symmetric_split(bytes)
                .or_else(|| find_subslice(bytes, b" b/"))
                .or_else(|| bytes.iter().position(|&b| b == b' '))
        };

        match split {
            Some(mid) => TokenKind::FileHeader {
                old: at(0, mid),
                new: at(mid + 1, bytes.len()),
            },
            None => TokenKind::FileHeader {
                old: rest,
                new: rest,
            },
        }
    }

    fn hunk_header(&self, line: Span) -> Option<HunkFields> {
        let bytes = line.slice(self.src);
        let base = line.start as usize;
        let mut i = b"@@ -".len();

        let (old_start, old_lines, next) = range_at(bytes, i)?;
        i = next;
        if !bytes[i..].starts_with(b" +") {
            return None;
        }
        i += 2;

        let (new_start, new_lines, next) = range_at(bytes, i)?;
        i = next;
        if !bytes[i..].starts_with(b" @@") {
            return None;
        }
        i += 3;
        if bytes.get(i) == Some(&b' ') {
            i += 1;
        }

        let shift = |span: (usize, usize)| Span::new(base + span.0, base + span.1);
        Some(HunkFields {
            old_start: shift(old_start),
            old_lines: old_lines.map(shift),
            new_start: shift(new_start),
            new_lines: new_lines.map(shift),
            section: Span::new(base + i, base + bytes.len()),
        })
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

type Range = (usize, usize);

// `<digits>[,<digits>]` starting at `i`; returns local byte ranges
fn range_at(bytes: &[u8], i: usize) -> Option<(Range, Option<Range>, usize)> {
    let start_end = digits_end(bytes, i);
    if start_end == i {
        return None;
    }

    if bytes.get(start_end) == Some(&b',') {
        let count_end = digits_end(bytes, start_end + 1);
        if count_end == start_end + 1 {
            return None;
        }
        Some(((i, start_end), Some((start_end + 1, count_end)), count_end))
    } else {
        Some(((i, start_end), None, start_end))
    }
}

fn digits_end(bytes: &[u8], from: usize) -> usize {
    from + bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// Index one past the closing quote of a C-quoted token starting at `start`.
pub(crate) fn quoted_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

// `a/<p> b/<p>`: both halves name the same path once prefixes are dropped
fn symmetric_split(bytes: &[u8]) -> Option<usize> {
    if bytes.len() % 2 == 0 {
        return None;
    }
    let mid = bytes.len() / 2;
    if bytes[mid] != b' ' {
        return None;
    }
    let (old, new) = (&bytes[..mid], &bytes[mid + 1..]);
    let strip = |side: &[u8]| side.iter().position(|&b| b == b'/').map_or(0, |p| p + 1);
    (old[strip(old)..] == new[strip(new)..]).then_some(mid)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse an unsigned decimal, rejecting empty input, non-digits and overflow.
pub fn parse_decimal(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }

    bytes.iter().try_fold(0u32, |acc, &byte| {
        if !byte.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(byte - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::new(src.as_bytes()).map(|t| t.kind).collect()
    }

    fn text<'a>(src: &'a str, span: Span) -> &'a str {
        std::str::from_utf8(span.slice(src.as_bytes())).unwrap()
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(b"0"), Some(0));
        assert_eq!(parse_decimal(b"42"), Some(42));
        assert_eq!(parse_decimal(b"4294967295"), Some(u32::MAX));
        assert_eq!(parse_decimal(b"4294967296"), None);
        assert_eq!(parse_decimal(b"12x"), None);
        assert_eq!(parse_decimal(b""), None);
    }

    #[test]
    fn test_file_header_same_path() {
        let src = "diff --git a/src/x.ts b/src/x.ts";
        match kinds(src)[0] {
            TokenKind::FileHeader { old, new } => {
                assert_eq!(text(src, old), "a/src/x.ts");
                assert_eq!(text(src, new), "b/src/x.ts");
            }
            other => panic!("Expected file header, got {:?}", other),
        }
    }

    #[test]
    fn test_file_header_with_spaces_in_path() {
        let src = "diff --git a/my file.txt b/my file.txt";
        match kinds(src)[0] {
            TokenKind::FileHeader { old, new } => {
                assert_eq!(text(src, old), "a/my file.txt");
                assert_eq!(text(src, new), "b/my file.txt");
            }
            other => panic!("Expected file header, got {:?}", other),
        }
    }

    #[test]
    fn test_file_header_different_paths() {
        let src = "diff --git a/old.rs b/new_name.rs";
        match kinds(src)[0] {
            TokenKind::FileHeader { old, new } => {
                assert_eq!(text(src, old), "a/old.rs");
                assert_eq!(text(src, new), "b/new_name.rs");
            }
            other => panic!("Expected file header, got {:?}", other),
        }
    }

    #[test]
    fn test_file_header_quoted() {
        let src = r#"diff --git "a/t\303\251st.txt" "b/t\303\251st.txt""#;
        match kinds(src)[0] {
            TokenKind::FileHeader { old, new } => {
                assert_eq!(text(src, old), r#""a/t\303\251st.txt""#);
                assert_eq!(text(src, new), r#""b/t\303\251st.txt""#);
            }
            other => panic!("Expected file header, got {:?}", other),
        }
    }

    #[test]
    fn test_path_markers() {
        let src = "--- a/x.ts\t2024-01-01 00:00:00\n+++ /dev/null\n";
        let tokens = kinds(src);
        match tokens[0] {
            TokenKind::OldPath(PathMarker::Path(span)) => assert_eq!(text(src, span), "a/x.ts"),
            other => panic!("Expected old path, got {:?}", other),
        }
        assert_eq!(tokens[1], TokenKind::NewPath(PathMarker::DevNull));
    }

    #[test]
    fn test_hunk_header_fields() {
        let src = "@@ -10,7 +12,9 @@ fn main() {";
        match kinds(src)[0] {
            TokenKind::HunkHeader(fields) => {
                assert_eq!(text(src, fields.old_start), "10");
                assert_eq!(text(src, fields.old_lines.unwrap()), "7");
                assert_eq!(text(src, fields.new_start), "12");
                assert_eq!(text(src, fields.new_lines.unwrap()), "9");
                assert_eq!(text(src, fields.section), "fn main() {");
            }
            other => panic!("Expected hunk header, got {:?}", other),
        }
    }

    #[test]
    fn test_hunk_header_omitted_counts() {
        let src = "@@ -1 +1 @@";
        match kinds(src)[0] {
            TokenKind::HunkHeader(fields) => {
                assert!(fields.old_lines.is_none());
                assert!(fields.new_lines.is_none());
                assert!(fields.section.is_empty());
            }
            other => panic!("Expected hunk header, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_hunk_header() {
        assert_eq!(kinds("@@ -a,b +c @@")[0], TokenKind::MalformedHunkHeader);
        assert_eq!(kinds("@@ -1,2 @@")[0], TokenKind::MalformedHunkHeader);
        assert_eq!(kinds("@@ garbage")[0], TokenKind::MalformedHunkHeader);
    }

    #[test]
    fn test_content_lines() {
        let src = "+added\n-removed\n context\n";
        let tokens: Vec<_> = Scanner::new(src.as_bytes()).collect();
        assert_eq!(tokens.len(), 3);
        match tokens[0].kind {
            TokenKind::Content { kind, text: span } => {
                assert_eq!(kind, LineKind::Add);
                assert_eq!(text(src, span), "added");
            }
            other => panic!("Expected content, got {:?}", other),
        }
        assert!(matches!(
            tokens[1].kind,
            TokenKind::Content {
                kind: LineKind::Delete,
                ..
            }
        ));
        assert!(matches!(
            tokens[2].kind,
            TokenKind::Content {
                kind: LineKind::Context,
                ..
            }
        ));
    }

    #[test]
    fn test_extended_headers() {
        let src = "similarity index 87%\nrename from a.rs\nrename to b.rs\nnew file mode 100644\ndeleted file mode 100644\nindex abc..def 100644\nBinary files a/x.png and b/x.png differ\n\\ No newline at end of file\n";
        let tokens = kinds(src);
        match tokens[0] {
            TokenKind::Similarity(span) => assert_eq!(text(src, span), "87"),
            other => panic!("Expected similarity, got {:?}", other),
        }
        match tokens[1] {
            TokenKind::RenameFrom(span) => assert_eq!(text(src, span), "a.rs"),
            other => panic!("Expected rename from, got {:?}", other),
        }
        match tokens[2] {
            TokenKind::RenameTo(span) => assert_eq!(text(src, span), "b.rs"),
            other => panic!("Expected rename to, got {:?}", other),
        }
        assert_eq!(tokens[3], TokenKind::NewFileMode);
        assert_eq!(tokens[4], TokenKind::DeletedFileMode);
        assert_eq!(tokens[5], TokenKind::ExtendedHeader);
        assert_eq!(tokens[6], TokenKind::Binary);
        assert_eq!(tokens[7], TokenKind::NoNewlineMarker);
    }

    #[test]
    fn test_unrecognized_lines_are_other() {
        let tokens = kinds("commit 1234\n\nAuthor: someone\n");
        assert_eq!(tokens, vec![TokenKind::Other; 3]);
    }

    #[test]
    fn test_carriage_returns() {
        let src = "+line\r\n";
        let dropped: Vec<_> = Scanner::new(src.as_bytes()).collect();
        assert_eq!(text(src, dropped[0].line), "+line");

        let kept: Vec<_> = Scanner::with_carriage_returns(src.as_bytes(), true).collect();
        assert_eq!(text(src, kept[0].line), "+line");
        match kept[0].kind {
            TokenKind::Content { text: span, .. } => assert_eq!(text(src, span), "line\r"),
            other => panic!("expected content, got {:?}", other),
        }
        let (_, span) = kept[0].as_content(src.as_bytes()).unwrap();
        assert_eq!(text(src, span), "line\r");
    }

    #[test]
    fn test_kept_carriage_returns_do_not_reach_headers() {
        let src = "--- a/x.ts\r\n@@ -1 +1 @@\r\n\r\n";
        let tokens: Vec<_> = Scanner::with_carriage_returns(src.as_bytes(), true).collect();
        match tokens[0].kind {
            TokenKind::OldPath(PathMarker::Path(path)) => assert_eq!(text(src, path), "a/x.ts"),
            other => panic!("expected marker, got {:?}", other),
        }
        match tokens[1].kind {
            TokenKind::HunkHeader(fields) => assert!(fields.section.is_empty()),
            other => panic!("expected hunk header, got {:?}", other),
        }
        assert_eq!(tokens[2].kind, TokenKind::Other);
        assert!(tokens[2].line.is_empty());
    }

    #[test]
    fn test_missing_trailing_newline() {
        let src = "+a\n+b";
        let tokens: Vec<_> = Scanner::new(src.as_bytes()).collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(text(src, tokens[1].line), "+b");
    }

    #[test]
    fn test_as_content_reinterprets_markers() {
        let src = "--- not a header";
        let token = Scanner::new(src.as_bytes()).next().unwrap();
        assert!(matches!(token.kind, TokenKind::OldPath(_)));
        let (kind, span) = token.as_content(src.as_bytes()).unwrap();
        assert_eq!(kind, LineKind::Delete);
        assert_eq!(text(src, span), "-- not a header");
    }
}
