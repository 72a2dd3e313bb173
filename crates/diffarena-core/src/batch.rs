use crate::config::ParseOptions;
use crate::parser::parse_with;
use crate::result::ParseResult;
use rayon::prelude::*;

/// Parse independent diff buffers in parallel.
///
/// Results come back in input order. Each result owns its own arena and
/// intern pool; path ids are only comparable within one result.
pub fn parse_batch<'src>(sources: &[&'src [u8]], options: &ParseOptions) -> Vec<ParseResult<'src>> {
    let span = tracing::debug_span!("parse_batch", buffers = sources.len());
    let _enter = span.enter();

    sources
        .par_iter()
        .map(|&source| parse_with(source, options))
        .collect()
}
