//! HUNKHEAD / HUNKBODY states: parsing one `@@ ... @@` header and its body.

use super::{Cursor, ParseOptions};
use crate::model::{BodyLine, Hunk, LineKind};
use crate::model::PatchSet;

pub(super) fn is_hunk_header(content: &[u8]) -> bool {
    content.starts_with(b"@@ ")
}

/// Parse one hunk starting at the cursor's current `@@` line. On a
/// malformed header (unparseable/negative counts), records a warning,
/// discards the hunk entirely, and leaves the cursor positioned at the next
/// `@@` or `---` line so the caller can resynchronize. On a body that ends
/// short of its declared counts, runs into a literal `---`/`+++` line
/// (the next file's own header, not body content), or would push either
/// side's count past its declared total, returns the hunk anyway with
/// `invalid = true`, leaving the offending line unconsumed.
pub(super) fn parse_hunk(
    cursor: &mut Cursor,
    set: &mut PatchSet,
    opts: ParseOptions,
) -> Option<Hunk> {
    let header_line = cursor.advance().unwrap();
    let header_line_no = cursor.last_consumed_line();

    let Some((start_src, lines_src, start_tgt, lines_tgt, desc)) = parse_header(&header_line)
    else {
        set.push_warning(header_line_no, "malformed hunk header; discarding hunk");
        seek_resync(cursor);
        return None;
    };

    let mut body = Vec::new();
    let mut src_count = 0usize;
    let mut tgt_count = 0usize;
    let mut invalid = false;

    loop {
        if src_count >= lines_src && tgt_count >= lines_tgt {
            break;
        }
        let Some(line) = cursor.peek_content() else {
            invalid = true;
            break;
        };

        if line.first() == Some(&b'\\') {
            cursor.advance();
            if let Some(last) = body.last_mut() {
                let last: &mut BodyLine = last;
                last.no_newline_at_eof = true;
            }
            continue;
        }

        // A literal `--- `/`+++ ` line is the next file's filename header,
        // not body content, even though its first byte would otherwise read
        // as a Remove/Add prefix. Treat it the same as any other structural
        // line that ends the body early: stop here, leave it unconsumed for
        // the outer driver, and flag the short body.
        if line.starts_with(b"--- ") || line.starts_with(b"+++ ") {
            invalid = true;
            break;
        }

        if line.is_empty() {
            if opts.strict {
                invalid = true;
                break;
            }
            if src_count + 1 > lines_src || tgt_count + 1 > lines_tgt {
                invalid = true;
                break;
            }
            cursor.advance();
            body.push(BodyLine::new(LineKind::Context, Vec::new()));
            src_count += 1;
            tgt_count += 1;
            continue;
        }

        let (kind, content) = match line[0] {
            b' ' => (LineKind::Context, line[1..].to_vec()),
            b'+' => (LineKind::Add, line[1..].to_vec()),
            b'-' => (LineKind::Remove, line[1..].to_vec()),
            _ => {
                invalid = true;
                break;
            }
        };

        // Check before consuming: a line that would push either side's
        // count past its declared total is just as malformed as a body that
        // ends short of one, per the Hunk invariant in `spec.md` §3.
        let (would_src, would_tgt) = match kind {
            LineKind::Context => (src_count + 1, tgt_count + 1),
            LineKind::Add => (src_count, tgt_count + 1),
            LineKind::Remove => (src_count + 1, tgt_count),
        };
        if would_src > lines_src || would_tgt > lines_tgt {
            invalid = true;
            break;
        }

        cursor.advance();
        src_count = would_src;
        tgt_count = would_tgt;
        body.push(BodyLine::new(kind, content));
    }

    if invalid {
        set.push_warning(
            header_line_no,
            "hunk body ended before declared counts were satisfied",
        );
    }

    Some(Hunk {
        start_src,
        lines_src,
        start_tgt,
        lines_tgt,
        desc,
        body,
        invalid,
    })
}

/// After a malformed header, skip lines until the next `@@` or `--- ` line,
/// or end of input, so the outer driver can resume from a clean state.
fn seek_resync(cursor: &mut Cursor) {
    while let Some(content) = cursor.peek_content() {
        if is_hunk_header(&content) || content.starts_with(b"--- ") {
            return;
        }
        cursor.advance();
    }
}

/// Parse `@@ -<n>[,<m>] +<n>[,<m>] @@[ <desc>]`. Missing counts default to
/// `1`. Returns `None` on any structural or numeric failure.
fn parse_header(line: &[u8]) -> Option<(usize, usize, usize, usize, Vec<u8>)> {
    let rest = line.strip_prefix(b"@@ ")?;
    let rest = rest.strip_prefix(b"-")?;
    let sep = rest.iter().position(|&b| b == b' ')?;
    let (src_range, rest) = (&rest[..sep], &rest[sep + 1..]);
    let rest = rest.strip_prefix(b"+")?;
    let sep = rest.iter().position(|&b| b == b' ')?;
    let (tgt_range, rest) = (&rest[..sep], &rest[sep + 1..]);
    let rest = rest.strip_prefix(b"@@")?;
    let desc = if let Some(d) = rest.strip_prefix(b" ") {
        d.to_vec()
    } else if rest.is_empty() {
        Vec::new()
    } else {
        return None;
    };

    let (start_src, lines_src) = parse_range(src_range)?;
    let (start_tgt, lines_tgt) = parse_range(tgt_range)?;
    Some((start_src, lines_src, start_tgt, lines_tgt, desc))
}

fn parse_range(range: &[u8]) -> Option<(usize, usize)> {
    let text = std::str::from_utf8(range).ok()?;
    match text.split_once(',') {
        Some((start, len)) => {
            let start = parse_nonneg(start)?;
            let len = parse_nonneg(len)?;
            Some((start, len))
        }
        None => {
            let start = parse_nonneg(text)?;
            Some((start, 1))
        }
    }
}

fn parse_nonneg(text: &str) -> Option<usize> {
    if text.starts_with('-') {
        return None;
    }
    text.parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_defaults_missing_count_to_one() {
        let (s1, l1, s2, l2, desc) = parse_header(b"@@ -1 +1 @@").unwrap();
        assert_eq!((s1, l1, s2, l2), (1, 1, 1, 1));
        assert!(desc.is_empty());
    }

    #[test]
    fn header_parses_counts_and_desc() {
        let (s1, l1, s2, l2, desc) = parse_header(b"@@ -10,3 +10,4 @@ fn main() {").unwrap();
        assert_eq!((s1, l1, s2, l2), (10, 3, 10, 4));
        assert_eq!(desc, b"fn main() {");
    }

    #[test]
    fn header_rejects_negative_counts() {
        assert!(parse_header(b"@@ -1,-3 +1 @@").is_none());
    }

    #[test]
    fn header_rejects_garbage() {
        assert!(parse_header(b"@@ nope @@").is_none());
    }

    #[test]
    fn body_exceeding_declared_source_count_is_invalid() {
        // Declares 1 source line but the body removes two; the second
        // removal must not be silently accepted.
        let patch = b"--- a/t\n+++ b/t\n@@ -1,1 +1,1 @@\n-a\n-b\n+c\n";
        let set = crate::parser::parse(patch);
        assert_eq!(set.items.len(), 1);
        let hunk = &set.items[0].hunks[0];
        assert!(hunk.invalid);
        assert_eq!(hunk.body.len(), 1);
        assert_eq!(hunk.removed(), 1);
    }

    #[test]
    fn body_exceeding_declared_target_count_is_invalid() {
        // The second `+` line would push the target side past its declared
        // count while the source side is still unsatisfied, so it must be
        // rejected before the normal both-sides-satisfied break ever fires.
        let patch = b"--- a/t\n+++ b/t\n@@ -1,1 +1,1 @@\n+c\n+d\n-a\n";
        let set = crate::parser::parse(patch);
        assert_eq!(set.items.len(), 1);
        let hunk = &set.items[0].hunks[0];
        assert!(hunk.invalid);
        assert_eq!(hunk.body.len(), 1);
        assert_eq!(hunk.added(), 1);
    }
}
