/// A byte range into the source buffer a parse was run over.
///
/// Offsets are `u32` so every arena column stays fixed-width; the parser
/// rejects buffers that do not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub len: u32,
}

impl Span {
    pub const EMPTY: Span = Span { start: 0, len: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Span {
            start: start as u32,
            len: (end - start) as u32,
        }
    }

    pub fn end(self) -> usize {
        self.start as usize + self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Borrow the bytes this span covers.
    ///
    /// Panics if the span does not lie within `src`.
    pub fn slice(self, src: &[u8]) -> &[u8] {
        &src[self.start as usize..self.end()]
    }

    /// A sub-span starting `offset` bytes into this one.
    pub fn skip(self, offset: usize) -> Span {
        let offset = offset.min(self.len as usize);
        Span {
            start: self.start + offset as u32,
            len: self.len - offset as u32,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_slice() {
        let src = b"hello world";
        let span = Span::new(6, 11);
        assert_eq!(span.slice(src), b"world");
        assert_eq!(span.end(), 11);
    }

    #[test]
    fn test_span_skip_clamps() {
        let span = Span::new(2, 5);
        assert_eq!(span.skip(1), Span::new(3, 5));
        assert_eq!(span.skip(10), Span::new(5, 5));
        assert!(span.skip(3).is_empty());
    }
}
