//! Diffstat histogram: per-file added/removed counts and a proportional
//! `+`/`-` bar. `spec.md` §1 keeps the formula in scope while excluding
//! "diffstat histogram rendering beyond its formula" — full terminal
//! pagination, word-wrap, and color are the CLI's concern, not this
//! module's (`src/bin/patchwork.rs` layers `colored` on top the way the
//! teacher's `command::diff::colorize_diff` does for unified-diff text).

use crate::model::PatchSet;

/// Added/removed counts for one file in a `PatchSet`.
#[derive(Debug, Clone)]
pub struct FileStat {
    pub name: Vec<u8>,
    pub added: usize,
    pub removed: usize,
}

impl FileStat {
    pub fn total(&self) -> usize {
        self.added + self.removed
    }
}

/// The whole set's per-file stats, in `PatchSet` order.
#[derive(Debug, Clone)]
pub struct Diffstat {
    pub files: Vec<FileStat>,
}

const BAR_WIDTH: usize = 60;

/// Compute per-file added/removed counts directly from each `FilePatch`'s
/// already-derived `added`/`removed` fields.
pub fn compute(set: &PatchSet) -> Diffstat {
    let files = set
        .items
        .iter()
        .map(|fp| FileStat {
            name: fp.display_name().to_vec(),
            added: fp.added,
            removed: fp.removed,
        })
        .collect();
    Diffstat { files }
}

impl Diffstat {
    pub fn max_changes(&self) -> usize {
        self.files.iter().map(FileStat::total).max().unwrap_or(0)
    }

    /// Render `git diff --stat`-style output: one line per file with a
    /// `+`/`-` bar scaled so the busiest file's bar is at most `BAR_WIDTH`
    /// characters, followed by a summary line.
    pub fn render(&self) -> String {
        let max = self.max_changes();
        let scale = if max > BAR_WIDTH {
            BAR_WIDTH as f64 / max as f64
        } else {
            1.0
        };
        let name_width = self
            .files
            .iter()
            .map(|f| String::from_utf8_lossy(&f.name).chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for f in &self.files {
            let plus = ((f.added as f64) * scale).round() as usize;
            let minus = ((f.removed as f64) * scale).round() as usize;
            out.push_str(&format!(
                " {:<width$} | {:>4} {}{}\n",
                String::from_utf8_lossy(&f.name),
                f.total(),
                "+".repeat(plus),
                "-".repeat(minus),
                width = name_width,
            ));
        }
        let total_added: usize = self.files.iter().map(|f| f.added).sum();
        let total_removed: usize = self.files.iter().map(|f| f.removed).sum();
        out.push_str(&format!(
            " {} file{} changed, {} insertion{}(+), {} deletion{}(-)\n",
            self.files.len(),
            if self.files.len() == 1 { "" } else { "s" },
            total_added,
            if total_added == 1 { "" } else { "s" },
            total_removed,
            if total_removed == 1 { "" } else { "s" },
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn single_line_insertion_renders_one_plus() {
        let patch = b"--- a/t\n+++ b/t\n@@ -1,3 +1,4 @@\n line1\n+inserted\n line2\n line3\n";
        let set = parser::parse(patch);
        let stat = compute(&set);
        let rendered = stat.render();
        assert!(rendered.contains("t | 1 +"), "got: {rendered}");
    }

    #[test]
    fn bar_scales_down_when_changes_exceed_bar_width() {
        let mut set = PatchSet::new();
        set.items.push(crate::model::FilePatch {
            header: Vec::new(),
            source: b"a".to_vec(),
            target: b"a".to_vec(),
            hunks: Vec::new(),
            dialect: crate::model::Dialect::Plain,
            added: 120,
            removed: 0,
        });
        let stat = compute(&set);
        let rendered = stat.render();
        let plus_count = rendered.matches('+').count();
        assert!(plus_count <= BAR_WIDTH);
    }

    #[test]
    fn summary_line_totals_across_files() {
        let patch = b"--- a/x\n+++ b/x\n@@ -1 +1 @@\n-x\n+y\n--- a/z\n+++ b/z\n@@ -1 +1 @@\n-z\n+w\n";
        let set = parser::parse(patch);
        let stat = compute(&set);
        let rendered = stat.render();
        assert!(rendered.contains("2 files changed"));
    }
}
