//! Rewriter: streams a target file through a matched hunk plan, producing
//! new file content and guaranteeing atomic replacement. See `spec.md` §4.5.
//!
//! File creation, deletion, and rename are tolerated by the parser
//! (`spec.md` §1, §4.3) but are never executed here: a `FilePatch` whose
//! source or target is the `/dev/null` sentinel is reported as
//! [`FileResult::Skipped`], not attempted.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::matcher::{self, HunkOutcome};
use crate::model::{FilePatch, Hunk, LineKind, PatchSet};
use crate::pathutil::{self, PathError};
use crate::reader::{LineReader, RawLine};

/// At-rewrite-time failure for a single file. Per `spec.md` §7's
/// `ApplyError` kind: a failed file is left byte-identical to its pre-call
/// state; sibling files in the same `PatchSet` are unaffected.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("target file not found: {0}")]
    MissingTarget(PathBuf),
    #[error("resolving target filename: {0}")]
    Path(#[from] PathError),
    #[error("hunk at source line {0} has no acceptable match (conflict)")]
    Conflict(usize),
    #[error("hunk at source line {0} is invalid (malformed body)")]
    InvalidHunk(usize),
    #[error("writing target file: {0}")]
    Io(#[from] std::io::Error),
}

/// The knobs from `spec.md` §6's "Apply options" table.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Leading path components to remove from each target filename.
    pub strip: usize,
    /// Directory target filenames resolve against after stripping.
    pub root: PathBuf,
    /// Perform matching and rendering but never write to disk.
    pub dry_run: bool,
    /// Maximum position-offset search window for the matcher.
    pub fuzz: usize,
    /// Permit a stripped filename that is still absolute (a security error
    /// by default; `spec.md` §4.5).
    pub allow_absolute: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            strip: 0,
            root: PathBuf::from("."),
            dry_run: false,
            fuzz: 0,
            allow_absolute: false,
        }
    }
}

/// The outcome of successfully resolving and (unless `dry_run`) rewriting
/// one file.
#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub path: PathBuf,
    /// `true` when every hunk was found already applied in reverse; no
    /// bytes were written even in non-dry-run mode.
    pub already_applied: bool,
}

/// What happened to one `FilePatch` within a `PatchSet` apply/revert.
#[derive(Debug)]
pub enum FileResult {
    Applied(ApplyReport),
    /// A create/delete/rename entry — tolerated by the parser, not
    /// executed by the core (`spec.md` §1).
    Skipped,
    Failed(ApplyError),
}

/// One file's outcome, labeled with the filename the patch declared.
#[derive(Debug)]
pub struct FileOutcome {
    pub filename: Vec<u8>,
    pub result: FileResult,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self.result, FileResult::Failed(_))
    }
}

/// The result of applying (or reverting) a whole `PatchSet`. Per `spec.md`
/// §7, the overall result is the logical AND of all per-file outcomes;
/// partial failure *across* files is permitted, partial failure *within* a
/// file is not (each file either fully updates or is left untouched).
#[derive(Debug)]
pub struct ApplySummary {
    pub files: Vec<FileOutcome>,
}

impl ApplySummary {
    pub fn success(&self) -> bool {
        self.files.iter().all(FileOutcome::is_ok)
    }
}

/// Strip and resolve a `FilePatch`'s chosen filename against `opts`, per
/// `spec.md` §4.5's "Strip and root options".
pub fn resolve_target(fp: &FilePatch, opts: &ApplyOptions) -> Result<PathBuf, ApplyError> {
    let name = fp.display_name();
    let stripped = pathutil::secure_strip(name, opts.strip, opts.allow_absolute)?;
    let rel = String::from_utf8_lossy(&stripped).into_owned();
    Ok(opts.root.join(rel))
}

/// Apply every non-create/delete `FilePatch` in `set` against the
/// filesystem per `opts`.
pub fn apply_patchset(set: &PatchSet, opts: &ApplyOptions) -> ApplySummary {
    run_patchset(set, opts)
}

/// Revert `set`: swap source/target roles on every hunk and re-run the
/// matcher and rewriter (`spec.md` §4.5). After a successful forward apply,
/// `revert_patchset(apply_patchset(set))` is a byte-exact round trip.
pub fn revert_patchset(set: &PatchSet, opts: &ApplyOptions) -> ApplySummary {
    let reversed: Vec<FilePatch> = set.items.iter().map(reverse_file_patch).collect();
    let reversed_set = PatchSet {
        items: reversed,
        dialect: set.dialect,
        diagnostics: Vec::new(),
    };
    run_patchset(&reversed_set, opts)
}

fn reverse_file_patch(fp: &FilePatch) -> FilePatch {
    let mut reversed = FilePatch {
        header: fp.header.clone(),
        source: fp.target.clone(),
        target: fp.source.clone(),
        hunks: fp.hunks.iter().map(Hunk::reversed).collect(),
        dialect: fp.dialect,
        added: 0,
        removed: 0,
    };
    reversed.recompute_counts();
    reversed
}

fn run_patchset(set: &PatchSet, opts: &ApplyOptions) -> ApplySummary {
    let files = set
        .items
        .iter()
        .map(|fp| {
            let filename = fp.display_name().to_vec();
            if fp.is_add() || fp.is_delete() {
                tracing::debug!(
                    name = %String::from_utf8_lossy(&filename),
                    "skipping create/delete entry; not executed by the core"
                );
                return FileOutcome {
                    filename,
                    result: FileResult::Skipped,
                };
            }
            let result = match apply_file(fp, opts) {
                Ok(report) => FileResult::Applied(report),
                Err(e) => FileResult::Failed(e),
            };
            FileOutcome { filename, result }
        })
        .collect();
    ApplySummary { files }
}

/// Apply a single `FilePatch` against the file it resolves to.
pub fn apply_file(fp: &FilePatch, opts: &ApplyOptions) -> Result<ApplyReport, ApplyError> {
    let target = resolve_target(fp, opts)?;
    apply_to_path(fp, &target, opts)
}

fn apply_to_path(fp: &FilePatch, target: &Path, opts: &ApplyOptions) -> Result<ApplyReport, ApplyError> {
    if let Some(h) = fp.hunks.iter().find(|h| h.invalid) {
        return Err(ApplyError::InvalidHunk(h.start_src));
    }

    let bytes = fs::read(target).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApplyError::MissingTarget(target.to_path_buf())
        } else {
            ApplyError::Io(e)
        }
    })?;
    let lines: Vec<RawLine> = LineReader::new(&bytes).filter(|l| !l.is_eof).collect();

    let matches = matcher::match_hunks(&fp.hunks, &lines, opts.fuzz);

    if let Some((h, _)) = fp
        .hunks
        .iter()
        .zip(matches.iter())
        .find(|(_, m)| matches!(m.outcome, HunkOutcome::Conflict))
    {
        return Err(ApplyError::Conflict(h.start_src));
    }

    let already_applied = matches
        .iter()
        .all(|m| matches!(m.outcome, HunkOutcome::AlreadyApplied));
    if already_applied {
        return Ok(ApplyReport {
            path: target.to_path_buf(),
            already_applied: true,
        });
    }

    let output = render(&lines, &fp.hunks, &matches);

    if !opts.dry_run {
        write_atomic(target, &output)?;
        tracing::info!(path = %target.display(), "patched");
    }

    Ok(ApplyReport {
        path: target.to_path_buf(),
        already_applied: false,
    })
}

/// Dry-run a single `FilePatch`: match but never write, returning whether
/// every hunk would apply. Per `spec.md` §8's dry-run-equivalence property,
/// this shares `apply_to_path`'s matcher path exactly.
pub fn would_apply(fp: &FilePatch, target: &Path, opts: &ApplyOptions) -> Result<(), ApplyError> {
    let mut dry = opts.clone();
    dry.dry_run = true;
    apply_to_path(fp, target, &dry).map(|_| ())
}

fn render(lines: &[RawLine], hunks: &[Hunk], matches: &[matcher::HunkMatch]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut cursor = 0usize;
    let dominant = dominant_terminator(lines);

    for (hunk, m) in hunks.iter().zip(matches.iter()) {
        while cursor < m.position {
            out.extend_from_slice(&lines[cursor].bytes);
            cursor += 1;
        }
        match m.outcome {
            HunkOutcome::AlreadyApplied => {
                let len = hunk.target_lines().len();
                for line in &lines[cursor..cursor + len] {
                    out.extend_from_slice(&line.bytes);
                }
                cursor += len;
            }
            HunkOutcome::Forward { .. } => {
                let consumed = hunk.source_lines().len();
                emit_hunk_body(&mut out, hunk, lines, cursor, consumed, &dominant);
                cursor += consumed;
            }
            HunkOutcome::Conflict => unreachable!("conflicts are rejected before rendering"),
        }
    }

    while cursor < lines.len() {
        out.extend_from_slice(&lines[cursor].bytes);
        cursor += 1;
    }

    out
}

/// Emit one hunk's target-side content (context + additions), choosing each
/// emitted line's terminator from the source line "at that position" when
/// one remains, else the file's dominant terminator (`spec.md` §4.5).
/// Honors per-line `\ No newline at end of file` markers by suppressing the
/// terminator they attach to.
fn emit_hunk_body(
    out: &mut Vec<u8>,
    hunk: &Hunk,
    lines: &[RawLine],
    cursor: usize,
    consumed: usize,
    dominant: &[u8],
) {
    let mut src_offset = 0usize;
    for body_line in &hunk.body {
        match body_line.kind {
            LineKind::Remove => {
                src_offset += 1;
            }
            LineKind::Context | LineKind::Add => {
                out.extend_from_slice(&body_line.content);
                if !body_line.no_newline_at_eof {
                    let source_term = if src_offset < consumed {
                        lines[cursor + src_offset].terminator()
                    } else {
                        &[][..]
                    };
                    // The source line at this position may itself have been
                    // the file's final, unterminated line. If this emitted
                    // line carries no no-newline marker of its own, the
                    // target side does have a terminator here regardless —
                    // fall back to the dominant style rather than
                    // propagating an empty one (`spec.md` §4.5: "if the
                    // source had one and the target does not, append one").
                    let term = if source_term.is_empty() { dominant } else { source_term };
                    out.extend_from_slice(term);
                }
                if body_line.kind == LineKind::Context {
                    src_offset += 1;
                }
            }
        }
    }
}

/// The file's prevailing line-ending style. A line with no terminator at
/// all (the file's last line, if it lacks a trailing newline) reflects
/// end-of-file, not a style choice, so it is excluded from the vote —
/// otherwise a single-line file with no trailing newline would "dominant"
/// into an empty terminator for newly appended lines.
fn dominant_terminator(lines: &[RawLine]) -> Vec<u8> {
    let mut counts: HashMap<&[u8], usize> = HashMap::new();
    for line in lines {
        let term = line.terminator();
        if !term.is_empty() {
            *counts.entry(term).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(term, _)| term.to_vec())
        .unwrap_or_else(|| b"\n".to_vec())
}

/// Write `contents` to a sibling temp file in `target`'s directory, fsync,
/// then rename over `target`. Aborting before `persist` (any `?` above)
/// leaves `target` untouched, since the temp file is removed on drop.
fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
