//! Single-pass, line-driven parser state machine. See `spec.md` §4.2.
//!
//! ```text
//! HEADER → FILENAMES → HUNKHEAD → HUNKBODY ─┐
//!    ↑          ↑          ↑                │
//!    └──────────┴──────────┴────────────────┘
//! ```
//!
//! The parser never returns an `Err` for structural problems inside the
//! patch body — those are recorded as diagnostics on the returned
//! [`PatchSet`] per `spec.md` §7. It can only fail to produce a `PatchSet`
//! at all if the source bytes can't be obtained (see [`crate::reader::InputError`]).

mod hunk;

use crate::detect;
use crate::model::{Dialect, FilePatch, PatchSet};
use crate::reader::{LineReader, RawLine};

/// Knobs that affect parsing tolerance. See `spec.md` §9's open question on
/// blank-line-as-context handling.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// When `true`, a blank line inside a hunk body terminates the body
    /// instead of being tolerated as a single-space context line.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { strict: false }
    }
}

/// Parse already-in-memory patch bytes into a [`PatchSet`]. This never
/// fails: malformed input degrades into diagnostics and dropped/invalid
/// items rather than an `Err`.
pub fn parse(input: &[u8]) -> PatchSet {
    parse_with_options(input, ParseOptions::default())
}

pub fn parse_with_options(input: &[u8], opts: ParseOptions) -> PatchSet {
    let lines: Vec<RawLine> = LineReader::new(input).filter(|l| !l.is_eof).collect();
    let mut cursor = Cursor::new(lines);
    let mut set = PatchSet::new();
    let mut pending_header: Vec<Vec<u8>> = Vec::new();
    let mut block_started = false;

    while let Some(content) = cursor.peek_content() {
        if starts_with(&content, b"--- ") || starts_with(&content, b"+++ ") {
            match try_filenames(&mut cursor, &mut set) {
                Some((mut source, mut target)) => {
                    let header = std::mem::take(&mut pending_header);
                    block_started = false;
                    let mut hunks = Vec::new();

                    loop {
                        let Some(next) = cursor.peek_content() else {
                            break;
                        };
                        if hunk::is_hunk_header(&next) {
                            if let Some(h) = hunk::parse_hunk(&mut cursor, &mut set, opts) {
                                hunks.push(h);
                            }
                            continue;
                        }
                        if starts_with(&next, b"--- ") {
                            if hunks.is_empty() {
                                if let Some((s2, t2)) = try_filenames(&mut cursor, &mut set) {
                                    let line_no = cursor.last_consumed_line();
                                    set.push_warning(
                                        line_no,
                                        "duplicated --- / +++ pair before first hunk; using the latest",
                                    );
                                    source = s2;
                                    target = t2;
                                    continue;
                                }
                                break;
                            }
                            break;
                        }
                        // Any other structural line closes this FilePatch and
                        // is tolerated as trailing garbage.
                        let line_no = cursor.peek_line_number();
                        set.push_warning(line_no, "trailing garbage after hunk");
                        break;
                    }

                    if hunks.is_empty() {
                        set.push_error(
                            cursor.last_consumed_line(),
                            "file patch has no hunks",
                        );
                    } else {
                        let mut patch = FilePatch {
                            header,
                            source,
                            target,
                            hunks,
                            dialect: Dialect::Plain,
                            added: 0,
                            removed: 0,
                        };
                        patch.recompute_counts();
                        set.items.push(patch);
                    }
                }
                None => {
                    // try_filenames already advanced past the offending
                    // line(s) and recorded a diagnostic.
                    continue;
                }
            }
        } else {
            let content = cursor.advance().unwrap();
            if is_block_starter(&content) {
                if block_started {
                    pending_header.clear();
                }
                block_started = true;
            }
            pending_header.push(content);
        }
    }

    detect::run(&mut set);
    set
}

/// Parse the patch at `path` from disk. Fails only if the file cannot be
/// read at all (`spec.md` §7's `InputError`).
pub fn parse_path(path: &std::path::Path) -> Result<PatchSet, crate::reader::InputError> {
    let bytes = LineReader::from_path(path)?;
    Ok(parse(&bytes))
}

pub(crate) fn starts_with(content: &[u8], prefix: &[u8]) -> bool {
    content.starts_with(prefix)
}

fn is_block_starter(content: &[u8]) -> bool {
    starts_with(content, b"diff --git ")
        || starts_with(content, b"Index: ")
        || starts_with(content, b"diff -r ")
        || content == b"# HG changeset patch"
        || starts_with(content, b"rename from ")
        || starts_with(content, b"rename to ")
}

/// Consume a `--- X` / `+++ Y` pair (in either order, per `spec.md` §4.2's
/// tolerance for swapped filename lines). Returns `None` on a structural
/// mismatch, having already recorded a `ParseError` and advanced the cursor
/// past the offending line so the caller makes progress.
fn try_filenames(cursor: &mut Cursor, set: &mut PatchSet) -> Option<(Vec<u8>, Vec<u8>)> {
    let first = cursor.peek_content()?;
    if starts_with(&first, b"--- ") {
        let src_line = cursor.advance().unwrap();
        match cursor.peek_content() {
            Some(next) if starts_with(&next, b"+++ ") => {
                let tgt_line = cursor.advance().unwrap();
                Some((extract_name(&src_line, b"--- "), extract_name(&tgt_line, b"+++ ")))
            }
            _ => {
                set.push_error(
                    cursor.last_consumed_line(),
                    "'---' line not followed by a matching '+++' line",
                );
                None
            }
        }
    } else if starts_with(&first, b"+++ ") {
        let tgt_line = cursor.advance().unwrap();
        match cursor.peek_content() {
            Some(next) if starts_with(&next, b"--- ") => {
                let src_line = cursor.advance().unwrap();
                set.push_warning(
                    cursor.last_consumed_line(),
                    "'+++' appeared before '---'; swapped",
                );
                Some((extract_name(&src_line, b"--- "), extract_name(&tgt_line, b"+++ ")))
            }
            _ => {
                set.push_error(
                    cursor.last_consumed_line(),
                    "'+++' line not followed by a matching '---' line",
                );
                None
            }
        }
    } else {
        None
    }
}

/// Extract the filename portion of a `--- ` / `+++ ` line, stopping at a
/// tab-delimited timestamp if present. Normalization beyond this raw split
/// (quote stripping, `a/`/`b/` prefixes, `/dev/null`) is the detector's job
/// (`spec.md` §4.3), not the parser's.
fn extract_name(line: &[u8], prefix: &[u8]) -> Vec<u8> {
    let rest = &line[prefix.len()..];
    match rest.iter().position(|&b| b == b'\t') {
        Some(idx) => rest[..idx].to_vec(),
        None => rest.to_vec(),
    }
}

/// A materialized, peekable cursor over the patch's lines. The whole input
/// is held in memory for the duration of parsing (`spec.md` §5: the parser
/// builds the `PatchSet` in full before returning).
pub(crate) struct Cursor {
    lines: Vec<RawLine>,
    idx: usize,
}

impl Cursor {
    fn new(lines: Vec<RawLine>) -> Self {
        Cursor { lines, idx: 0 }
    }

    pub(crate) fn peek_content(&self) -> Option<Vec<u8>> {
        self.lines.get(self.idx).map(|l| l.content().to_vec())
    }

    pub(crate) fn peek_line_number(&self) -> Option<usize> {
        self.lines.get(self.idx).map(|l| l.line_number)
    }

    pub(crate) fn advance(&mut self) -> Option<Vec<u8>> {
        let line = self.lines.get(self.idx)?.content().to_vec();
        self.idx += 1;
        Some(line)
    }

    pub(crate) fn last_consumed_line(&self) -> Option<usize> {
        if self.idx == 0 {
            None
        } else {
            self.lines.get(self.idx - 1).map(|l| l.line_number)
        }
    }
}
