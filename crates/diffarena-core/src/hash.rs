use crate::config::ParseOptions;

/// Bumped whenever parse output changes shape for the same input.
pub const OUTPUT_VERSION: u32 = 1;

/// Blake3 hex digest of a raw diff buffer
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Key for caching parse output externally.
///
/// Covers the input bytes, the options that change what gets parsed, and
/// [`OUTPUT_VERSION`]. Capacity hints and diagnostic collection only affect
/// how the parse runs, so they are left out.
pub fn cache_key(bytes: &[u8], options: &ParseOptions) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&OUTPUT_VERSION.to_le_bytes());
    hasher.update(&[
        options.strip_path_prefixes as u8,
        options.unquote_paths as u8,
        options.keep_carriage_returns as u8,
    ]);
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaCapacity;
    use crate::config::CapacityHint;

    #[test]
    fn test_content_hash_consistency() {
        let diff = b"diff --git a/x b/x\n";
        assert_eq!(content_hash(diff), content_hash(diff));
        assert_eq!(content_hash(diff).len(), 64);
    }

    #[test]
    fn test_content_hash_different_content() {
        assert_ne!(content_hash(b"+a\n"), content_hash(b"+b\n"));
    }

    #[test]
    fn test_cache_key_tracks_output_options() {
        let diff = b"--- a/x\n+++ b/x\n";
        let defaults = ParseOptions::default();
        let raw_paths = ParseOptions {
            strip_path_prefixes: false,
            ..ParseOptions::default()
        };

        assert_ne!(cache_key(diff, &defaults), cache_key(diff, &raw_paths));
        assert_ne!(cache_key(diff, &defaults), content_hash(diff));
    }

    #[test]
    fn test_cache_key_ignores_tuning_options() {
        let diff = b"--- a/x\n+++ b/x\n";
        let tuned = ParseOptions {
            collect_diagnostics: false,
            capacity: CapacityHint::Explicit(ArenaCapacity {
                files: 1,
                hunks: 1,
                lines: 1,
            }),
            ..ParseOptions::default()
        };

        assert_eq!(cache_key(diff, &ParseOptions::default()), cache_key(diff, &tuned));
    }
}
