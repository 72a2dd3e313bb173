//! Generated diffs for stress tests and benches

use std::fmt::Write;

/// Shape of a generated diff.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticDiff {
    pub files: usize,
    /// Changed lines per file, split between additions and deletions
    pub lines_per_file: usize,
    /// Lines per hunk before a new `@@` header starts
    pub hunk_size: usize,
}

impl SyntheticDiff {
    pub fn new(files: usize, lines_per_file: usize) -> Self {
        Self {
            files,
            lines_per_file,
            hunk_size: 10,
        }
    }

    /// Additions across the whole diff
    pub fn additions(&self) -> usize {
        self.files * self.lines_per_file.div_ceil(2)
    }

    /// Deletions across the whole diff
    pub fn deletions(&self) -> usize {
        self.files * (self.lines_per_file / 2)
    }

    pub fn hunks(&self) -> usize {
        self.files * self.lines_per_file.div_ceil(self.hunk_size.max(1))
    }

    pub fn render(&self) -> String {
        let hunk_size = self.hunk_size.max(1);
        let mut out = String::with_capacity(self.files * (self.lines_per_file * 40 + 160));

        for file in 0..self.files {
            let path = format!("src/module_{:04}/file_{file}.ts", file / 100);
            // writing to a String cannot fail
            let _ = writeln!(out, "diff --git a/{path} b/{path}");
            let _ = writeln!(out, "index {:07x}..{:07x} 100644", file, file + 1);
            let _ = writeln!(out, "--- a/{path}");
            let _ = writeln!(out, "+++ b/{path}");

            let mut line = 0;
            let mut start = 1;
            while line < self.lines_per_file {
                let chunk = hunk_size.min(self.lines_per_file - line);
                let additions = (line..line + chunk).filter(|l| l % 2 == 0).count();
                let deletions = chunk - additions;
                let _ = writeln!(
                    out,
                    "@@ -{start},{deletions} +{start},{additions} @@ function handler{file}() {{"
                );
                for l in line..line + chunk {
                    if l % 2 == 0 {
                        let _ = writeln!(out, "+  const value{l} = compute({file}, {l});");
                    } else {
                        let _ = writeln!(out, "-  const value{l} = legacy({file}, {l});");
                    }
                }
                line += chunk;
                start += chunk + 20;
            }
        }

        out
    }
}

/// `files` files with `lines_per_file` changed lines each.
pub fn synthetic_diff(files: usize, lines_per_file: usize) -> String {
    SyntheticDiff::new(files, lines_per_file).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_match_render() {
        let shape = SyntheticDiff::new(3, 25);
        let text = shape.render();

        assert_eq!(text.matches("diff --git ").count(), 3);
        assert_eq!(text.matches("\n@@ ").count(), shape.hunks());
        assert_eq!(text.lines().filter(|l| l.starts_with("+ ")).count(), shape.additions());
        assert_eq!(text.lines().filter(|l| l.starts_with("- ")).count(), shape.deletions());
    }

    #[test]
    fn test_empty_shape() {
        assert!(synthetic_diff(0, 10).is_empty());
    }
}
