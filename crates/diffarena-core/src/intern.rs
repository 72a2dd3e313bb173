use rustc_hash::FxHashMap;
use std::borrow::Cow;

/// A deduplicating pool for file paths seen during one parse.
///
/// Entries normally borrow straight from the diff buffer, so interning a
/// path costs a hash lookup and nothing else. Paths that had to be decoded
/// (git's C-quoted form) are stored as owned bytes instead. Decoding back
/// to text is deferred until a caller asks for it.
#[derive(Debug, Default)]
pub struct InternPool<'src> {
    /// Map from path bytes to its ID
    ids: FxHashMap<Cow<'src, [u8]>, PathId>,
    /// Map from ID to path bytes
    entries: Vec<Cow<'src, [u8]>>,
}

/// A unique identifier for an interned path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(u32);

impl<'src> InternPool<'src> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        InternPool {
            ids: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Intern a path borrowed from the source buffer.
    /// If an equal byte sequence is already interned, returns the existing ID.
    pub fn intern(&mut self, bytes: &'src [u8]) -> PathId {
        if let Some(&id) = self.ids.get(bytes) {
            return id;
        }
        self.insert(Cow::Borrowed(bytes))
    }

    /// Intern a path that does not live in the source buffer.
    pub fn intern_owned(&mut self, bytes: Vec<u8>) -> PathId {
        if let Some(&id) = self.ids.get(bytes.as_slice()) {
            return id;
        }
        self.insert(Cow::Owned(bytes))
    }

    fn insert(&mut self, bytes: Cow<'src, [u8]>) -> PathId {
        let id = PathId(self.entries.len() as u32);
        self.entries.push(bytes.clone());
        self.ids.insert(bytes, id);
        id
    }

    /// Raw bytes of an interned path.
    /// Panics if the ID did not come from this pool.
    pub fn bytes(&self, id: PathId) -> &[u8] {
        &self.entries[id.0 as usize]
    }

    /// Decode an interned path to text.
    ///
    /// Borrows when the bytes are valid UTF-8; invalid sequences are
    /// replaced, which is the only case that allocates.
    /// Panics if the ID did not come from this pool.
    pub fn decode(&self, id: PathId) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes(id))
    }

    pub fn try_decode(&self, id: PathId) -> Option<Cow<'_, str>> {
        self.entries
            .get(id.0 as usize)
            .map(|bytes| String::from_utf8_lossy(bytes))
    }

    /// Look up a path without interning it.
    pub fn get(&self, bytes: &[u8]) -> Option<PathId> {
        self.ids.get(bytes).copied()
    }

    /// Iterate IDs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (PathId, &[u8])> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, bytes)| (PathId(i as u32), bytes.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that own a decoded copy rather than borrowing.
    pub fn owned_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Cow::Owned(_)))
            .count()
    }

    /// Heap bytes held by the pool's tables and owned entries.
    pub fn memory_usage(&self) -> usize {
        let owned: usize = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Cow::Owned(bytes) => Some(bytes.capacity() * 2),
                Cow::Borrowed(_) => None,
            })
            .sum();
        owned
            + self.entries.capacity() * std::mem::size_of::<Cow<'src, [u8]>>()
            + self.ids.capacity()
                * (std::mem::size_of::<Cow<'src, [u8]>>() + std::mem::size_of::<PathId>())
    }
}

impl PathId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a PathId from a raw u32 value
    /// This is unchecked and doesn't validate the ID exists in a pool
    pub fn from_u32(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_basic() {
        let src = b"src/a.rs src/b.rs src/a.rs";
        let mut pool = InternPool::new();

        let id1 = pool.intern(&src[0..8]);
        let id2 = pool.intern(&src[9..17]);
        let id3 = pool.intern(&src[18..26]);

        assert_eq!(id1, id3);
        assert_ne!(id1, id2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.decode(id1), "src/a.rs");
        assert_eq!(pool.decode(id2), "src/b.rs");
    }

    #[test]
    fn test_decode_borrows_valid_utf8() {
        let src = "docs/überblick.md".as_bytes();
        let mut pool = InternPool::new();
        let id = pool.intern(src);
        assert!(matches!(pool.decode(id), Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let src: &[u8] = b"bad\xffname";
        let mut pool = InternPool::new();
        let id = pool.intern(src);
        assert_eq!(pool.decode(id), "bad\u{fffd}name");
        assert_eq!(pool.bytes(id), src);
    }

    #[test]
    fn test_owned_and_borrowed_share_ids() {
        let src = b"lib.rs";
        let mut pool = InternPool::new();
        let borrowed = pool.intern(src);
        let owned = pool.intern_owned(b"lib.rs".to_vec());
        assert_eq!(borrowed, owned);
        assert_eq!(pool.owned_count(), 0);

        let fresh = pool.intern_owned("tést.txt".as_bytes().to_vec());
        assert_ne!(fresh, borrowed);
        assert_eq!(pool.owned_count(), 1);
    }

    #[test]
    fn test_equality_is_byte_exact() {
        let src = b"Readme.md README.md";
        let mut pool = InternPool::new();
        let a = pool.intern(&src[0..9]);
        let b = pool.intern(&src[10..19]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_try_decode() {
        let mut pool = InternPool::new();
        let id = pool.intern(b"test");
        assert_eq!(pool.try_decode(id).as_deref(), Some("test"));
        assert!(pool.try_decode(PathId::from_u32(9999)).is_none());
    }

    #[test]
    #[should_panic]
    fn test_decode_out_of_range_panics() {
        let pool = InternPool::new();
        let _ = pool.decode(PathId::from_u32(0));
    }
}
