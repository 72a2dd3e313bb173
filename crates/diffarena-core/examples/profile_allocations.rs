/// Heap allocation profiler using dhat
///
/// Measures how many heap blocks a parse takes, and how many more the
/// eager conversion adds, on a large synthetic diff.
///
/// Usage:
/// ```bash
/// cargo run --release --example profile_allocations
/// ```
///
/// Output: dhat-heap.json (open with https://nnethercote.github.io/dh_view/dh_view.html)
use diffarena_core::{lazy_file_diffs, materialize, parse};
use diffarena_test_helpers::synthetic::SyntheticDiff;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn blocks() -> u64 {
    dhat::HeapStats::get().total_blocks
}

fn main() {
    let shape = SyntheticDiff::new(2000, 20);
    let source = shape.render();

    let _profiler = dhat::Profiler::new_heap();

    println!("Profiling DiffArena allocations...");
    println!(
        "Input: {} files, {} lines, {} bytes",
        shape.files,
        shape.files * shape.lines_per_file,
        source.len()
    );
    println!();

    let before = blocks();
    let result = parse(source.as_bytes());
    let parsed = blocks();
    println!("1. Parse: {} blocks", parsed - before);
    println!("   {} bytes of arena + pool", result.memory_usage());

    let additions: usize = lazy_file_diffs(&result)
        .map(|file| file.change_stats().additions)
        .sum();
    let lazy = blocks();
    println!("2. Lazy change stats ({additions} additions): {} blocks", lazy - parsed);

    let files = materialize(&result);
    let eager = blocks();
    println!("3. Eager materialize ({} files): {} blocks", files.len(), eager - lazy);

    println!();
    println!("Profiling complete. Results written to dhat-heap.json");
}
