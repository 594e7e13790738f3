//! Format detector and filename normalizer. Runs once, after parsing, over
//! every `FilePatch` in a `PatchSet`. See `spec.md` §4.3.

use crate::model::{Dialect, FilePatch, PatchSet};

/// Assign a dialect to every `FilePatch` and the overall `PatchSet`, then
/// normalize filenames in place.
pub fn run(set: &mut PatchSet) {
    let signals: Vec<Option<Dialect>> = set.items.iter().map(|fp| signal(fp)).collect();

    let majority = majority_dialect(&signals);

    for (fp, signal) in set.items.iter_mut().zip(signals.iter()) {
        fp.dialect = signal.or(majority).unwrap_or(Dialect::Plain);
        normalize_names(fp);
    }

    set.dialect = overall_dialect(&set.items);
}

/// The strongest header signal present in a `FilePatch`'s raw header lines,
/// in priority order git > mercurial > subversion > plain.
fn signal(fp: &FilePatch) -> Option<Dialect> {
    let mut svn = false;
    for line in &fp.header {
        if line.starts_with(b"diff --git ") || line.starts_with(b"rename from ") || line.starts_with(b"rename to ") {
            return Some(Dialect::Git);
        }
        if line.starts_with(b"diff -r ") || line == b"# HG changeset patch" {
            return Some(Dialect::Mercurial);
        }
        if line.starts_with(b"Index: ") {
            svn = true;
        }
    }
    if svn { Some(Dialect::Subversion) } else { None }
}

/// The dialect shared by the largest number of `FilePatch`es with a
/// detected signal, used as a fallback for items with no signal of their
/// own (`spec.md` §4.3 point 1).
fn majority_dialect(signals: &[Option<Dialect>]) -> Option<Dialect> {
    let mut git = 0;
    let mut hg = 0;
    let mut svn = 0;
    for s in signals.iter().flatten() {
        match s {
            Dialect::Git => git += 1,
            Dialect::Mercurial => hg += 1,
            Dialect::Subversion => svn += 1,
            _ => {}
        }
    }
    let max = git.max(hg).max(svn);
    if max == 0 {
        return None;
    }
    if git == max {
        Some(Dialect::Git)
    } else if hg == max {
        Some(Dialect::Mercurial)
    } else {
        Some(Dialect::Subversion)
    }
}

fn overall_dialect(items: &[FilePatch]) -> Option<Dialect> {
    let mut iter = items.iter().map(|fp| fp.dialect);
    let first = iter.next()?;
    if iter.all(|d| d == first) {
        Some(first)
    } else {
        Some(Dialect::Mixed)
    }
}

fn strip_quotes(name: &[u8]) -> &[u8] {
    if name.len() >= 2 && name.first() == Some(&b'"') && name.last() == Some(&b'"') {
        &name[1..name.len() - 1]
    } else {
        name
    }
}

/// Legacy `diff` output appends a tab-delimited timestamp; the parser
/// already split on the first `\t` when extracting the raw name, so this is
/// a defensive no-op for names that still carry one (e.g. from detectors
/// that re-run on already-normalized input).
fn strip_timestamp(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b'\t') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

fn strip_prefix_pair<'a>(source: &'a [u8], target: &'a [u8]) -> (&'a [u8], &'a [u8]) {
    let s = source.strip_prefix(b"a/");
    let t = target.strip_prefix(b"b/");
    match (s, t) {
        (Some(s), Some(t)) => (s, t),
        _ => (source, target),
    }
}

fn normalize_names(fp: &mut FilePatch) {
    let source = strip_timestamp(strip_quotes(&fp.source)).to_vec();
    let target = strip_timestamp(strip_quotes(&fp.target)).to_vec();

    let (source, target) = match fp.dialect {
        Dialect::Git | Dialect::Mercurial => {
            let (s, t) = strip_prefix_pair(&source, &target);
            (s.to_vec(), t.to_vec())
        }
        Dialect::Subversion | Dialect::Plain | Dialect::Mixed => (source, target),
    };

    fp.source = normalize_dev_null(source);
    fp.target = normalize_dev_null(target);
}

fn normalize_dev_null(name: Vec<u8>) -> Vec<u8> {
    if name == b"/dev/null" || name == b"dev/null" {
        FilePatch::DEV_NULL.to_vec()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hunk;

    fn dummy_patch(header: Vec<&[u8]>, source: &[u8], target: &[u8]) -> FilePatch {
        FilePatch {
            header: header.into_iter().map(|h| h.to_vec()).collect(),
            source: source.to_vec(),
            target: target.to_vec(),
            hunks: vec![Hunk {
                start_src: 1,
                lines_src: 1,
                start_tgt: 1,
                lines_tgt: 1,
                desc: Vec::new(),
                body: Vec::new(),
                invalid: false,
            }],
            dialect: Dialect::Plain,
            added: 0,
            removed: 0,
        }
    }

    #[test]
    fn detects_git_dialect_and_strips_ab_prefixes() {
        let mut set = PatchSet::new();
        set.items.push(dummy_patch(
            vec![b"diff --git a/src/x.py b/src/x.py"],
            b"a/src/x.py",
            b"b/src/x.py",
        ));
        run(&mut set);
        assert_eq!(set.items[0].dialect, Dialect::Git);
        assert_eq!(set.items[0].source, b"src/x.py");
        assert_eq!(set.items[0].target, b"src/x.py");
        assert_eq!(set.dialect, Some(Dialect::Git));
    }

    #[test]
    fn subversion_keeps_names_as_is() {
        let mut set = PatchSet::new();
        set.items.push(dummy_patch(vec![b"Index: t"], b"t", b"t"));
        run(&mut set);
        assert_eq!(set.items[0].dialect, Dialect::Subversion);
        assert_eq!(set.items[0].source, b"t");
    }

    #[test]
    fn mixed_dialects_yield_mixed_set_dialect() {
        let mut set = PatchSet::new();
        set.items.push(dummy_patch(
            vec![b"diff --git a/x b/x"],
            b"a/x",
            b"b/x",
        ));
        set.items.push(dummy_patch(vec![b"Index: y"], b"y", b"y"));
        run(&mut set);
        assert_eq!(set.dialect, Some(Dialect::Mixed));
    }

    #[test]
    fn dev_null_is_normalized_to_sentinel() {
        let mut set = PatchSet::new();
        set.items.push(dummy_patch(
            vec![b"diff --git a/new b/new"],
            b"/dev/null",
            b"b/new",
        ));
        run(&mut set);
        assert_eq!(set.items[0].source, FilePatch::DEV_NULL);
        assert!(set.items[0].is_add());
    }

    #[test]
    fn quoted_filenames_are_unquoted() {
        let mut set = PatchSet::new();
        set.items.push(dummy_patch(
            vec![b"Index: weird"],
            b"\"a file\"",
            b"\"a file\"",
        ));
        run(&mut set);
        assert_eq!(set.items[0].source, b"a file");
    }

    #[test]
    fn unsignalled_item_inherits_set_majority() {
        let mut set = PatchSet::new();
        set.items.push(dummy_patch(
            vec![b"diff --git a/x b/x"],
            b"a/x",
            b"b/x",
        ));
        set.items.push(dummy_patch(vec![], b"a/y", b"b/y"));
        run(&mut set);
        assert_eq!(set.items[1].dialect, Dialect::Git);
        assert_eq!(set.items[1].source, b"y");
    }
}
