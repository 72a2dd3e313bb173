pub mod adapter;
pub mod arena;
pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod hash;
pub mod intern;
pub mod parser;
pub mod result;
pub mod scanner;
pub mod span;
pub mod status;

pub use adapter::{
    extract_file_paths, has_file_matching, lazy_file_diffs, materialize, to_file_diffs,
    ChangeStats, ConvertOptions, FileDiff, FileDiffs, Hunk, LazyFileDiff, LazyHunk,
};
pub use arena::{
    ArenaCapacity, DiffArena, FileIndex, FileStatus, HunkIndex, LineIndex, LineKind,
};
pub use batch::parse_batch;
pub use config::{CapacityHint, ParseOptions};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLevel};
pub use errors::{DiffError, Result};
pub use hash::{cache_key, content_hash};
pub use intern::{InternPool, PathId};
pub use parser::{parse, parse_str, parse_with, StreamingParser};
pub use result::{ParseResult, ParseStats};
pub use span::Span;
pub use status::{reconcile, NameStatusEntry, NameStatusListing, ReconcileSummary};
