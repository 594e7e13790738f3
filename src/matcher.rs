//! Hunk matcher: for each hunk in a `FilePatch`, decide whether it applies
//! at its declared location, at a nearby offset, already applied in
//! reverse, or not at all. See `spec.md` §4.4.
//!
//! `spec.md` §9 leaves the semantics of `--fuzz` ambiguous between "count of
//! tolerated mismatching context lines" and "position offset"; this module
//! implements the position-offset interpretation the spec settles on.

use crate::model::Hunk;
use crate::reader::RawLine;

/// How a single hunk was resolved against the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkOutcome {
    /// Matched the source-side content, possibly shifted from the header's
    /// declared position by `offset` lines.
    Forward { offset: isize },
    /// The target-side content was already present at the search position;
    /// the hunk is treated as already applied (idempotent re-apply).
    AlreadyApplied,
    /// No acceptable match was found within the fuzz window.
    Conflict,
}

/// The resolved outcome for one hunk plus the 0-based line index into the
/// target file where its matched content begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkMatch {
    pub outcome: HunkOutcome,
    pub position: usize,
}

/// Resolve every hunk of a `FilePatch` against `lines`, the target file's
/// lines. Matches for earlier hunks bias the search position of later
/// hunks via a running shift counter, so cascading insertions still locate
/// correctly (`spec.md` §4.4, "Ordering").
pub fn match_hunks(hunks: &[Hunk], lines: &[RawLine], fuzz: usize) -> Vec<HunkMatch> {
    let mut running_shift: isize = 0;
    let mut out = Vec::with_capacity(hunks.len());

    for hunk in hunks {
        let declared = hunk.start_src.saturating_sub(1) as isize;
        let base = (declared + running_shift).max(0) as usize;
        let expected_src = hunk.source_lines();

        if let Some(pos) = search_offset(lines, &expected_src, base, fuzz) {
            let offset = pos as isize - declared;
            running_shift = offset;
            tracing::debug!(start_src = hunk.start_src, offset, "hunk matched forward");
            out.push(HunkMatch {
                outcome: HunkOutcome::Forward { offset },
                position: pos,
            });
            continue;
        }

        let expected_tgt = hunk.target_lines();
        if matches_at(lines, &expected_tgt, base) {
            tracing::debug!(start_src = hunk.start_src, "hunk already applied");
            out.push(HunkMatch {
                outcome: HunkOutcome::AlreadyApplied,
                position: base,
            });
            continue;
        }

        tracing::warn!(start_src = hunk.start_src, "hunk conflict: no acceptable match");
        out.push(HunkMatch {
            outcome: HunkOutcome::Conflict,
            position: base,
        });
    }

    out
}

/// Try the declared position first, then search outward by offset
/// ±1, ±2, … up to `fuzz`, returning the first position whose slice of
/// `lines` matches `expected` byte-for-byte (terminators stripped).
fn search_offset(lines: &[RawLine], expected: &[&[u8]], base: usize, fuzz: usize) -> Option<usize> {
    if matches_at(lines, expected, base) {
        return Some(base);
    }
    for delta in 1..=fuzz {
        if base >= delta && matches_at(lines, expected, base - delta) {
            return Some(base - delta);
        }
        if matches_at(lines, expected, base + delta) {
            return Some(base + delta);
        }
    }
    None
}

fn matches_at(lines: &[RawLine], expected: &[&[u8]], pos: usize) -> bool {
    if expected.is_empty() {
        return true;
    }
    if pos.checked_add(expected.len()).is_none_or(|end| end > lines.len()) {
        return false;
    }
    lines[pos..pos + expected.len()]
        .iter()
        .zip(expected.iter())
        .all(|(line, want)| line.content() == *want)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BodyLine, LineKind};
    use crate::reader::LineReader;

    fn hunk(start_src: usize, body: Vec<(LineKind, &str)>) -> Hunk {
        let body: Vec<BodyLine> = body
            .into_iter()
            .map(|(kind, content)| BodyLine::new(kind, content.as_bytes().to_vec()))
            .collect();
        let lines_src = body
            .iter()
            .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Remove))
            .count();
        let lines_tgt = body
            .iter()
            .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Add))
            .count();
        Hunk {
            start_src,
            lines_src,
            start_tgt: start_src,
            lines_tgt,
            desc: Vec::new(),
            body,
            invalid: false,
        }
    }

    fn lines_of(text: &[u8]) -> Vec<RawLine> {
        LineReader::new(text).filter(|l| !l.is_eof).collect()
    }

    #[test]
    fn matches_at_declared_position() {
        let lines = lines_of(b"a\nb\nc\n");
        let h = hunk(2, vec![(LineKind::Context, "b"), (LineKind::Remove, "c"), (LineKind::Add, "C")]);
        let m = match_hunks(std::slice::from_ref(&h), &lines, 0);
        assert_eq!(m[0].outcome, HunkOutcome::Forward { offset: 0 });
        assert_eq!(m[0].position, 1);
    }

    #[test]
    fn finds_shifted_position_within_fuzz() {
        let lines = lines_of(b"x\nx\na\nb\nc\n");
        let h = hunk(1, vec![(LineKind::Context, "a"), (LineKind::Remove, "b"), (LineKind::Add, "B")]);
        let m = match_hunks(std::slice::from_ref(&h), &lines, 2);
        assert_eq!(m[0].outcome, HunkOutcome::Forward { offset: 2 });
        assert_eq!(m[0].position, 2);
    }

    #[test]
    fn zero_fuzz_rejects_shifted_hunk() {
        let lines = lines_of(b"x\nx\na\nb\nc\n");
        let h = hunk(1, vec![(LineKind::Context, "a"), (LineKind::Remove, "b"), (LineKind::Add, "B")]);
        let m = match_hunks(std::slice::from_ref(&h), &lines, 0);
        assert_eq!(m[0].outcome, HunkOutcome::Conflict);
    }

    #[test]
    fn detects_already_applied_hunk() {
        // Target already contains the post-patch content.
        let lines = lines_of(b"a\nB\nc\n");
        let h = hunk(1, vec![(LineKind::Context, "a"), (LineKind::Remove, "b"), (LineKind::Add, "B")]);
        let m = match_hunks(std::slice::from_ref(&h), &lines, 0);
        assert_eq!(m[0].outcome, HunkOutcome::AlreadyApplied);
    }

    #[test]
    fn running_shift_biases_later_hunks() {
        let lines = lines_of(b"pre1\npre2\na\nb\nc\nd\ne\n");
        let h1 = hunk(1, vec![(LineKind::Context, "a"), (LineKind::Add, "A2")]);
        let h2 = hunk(4, vec![(LineKind::Context, "d"), (LineKind::Remove, "e"), (LineKind::Add, "E")]);
        let m = match_hunks(&[h1, h2], &lines, 2);
        assert_eq!(m[0].position, 2);
        assert_eq!(m[1].position, 5);
    }
}
