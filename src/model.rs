//! Closed, immutable records for the parsed patch tree: `Line`-level body
//! content, `Hunk`, `FilePatch`, and `PatchSet`. Construction goes through
//! `parser::Builder`; once built, a `PatchSet` is never mutated except by
//! the rewriter, which only reads it.

/// One of the version-control flavors a patch block can be tagged with.
/// `Mixed` is only ever assigned to a `PatchSet`, never to an individual
/// `FilePatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Plain,
    Git,
    Mercurial,
    Subversion,
    Mixed,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Dialect::Plain => "plain",
            Dialect::Git => "git",
            Dialect::Mercurial => "mercurial",
            Dialect::Subversion => "subversion",
            Dialect::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

/// The role a single body line plays within a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Context,
    Add,
    Remove,
}

/// One line of a hunk's body: its role, its content (terminator stripped),
/// and whether the *next* line in the raw patch was a `\ No newline at end
/// of file` marker attaching to this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLine {
    pub kind: LineKind,
    pub content: Vec<u8>,
    pub no_newline_at_eof: bool,
}

impl BodyLine {
    pub fn new(kind: LineKind, content: Vec<u8>) -> Self {
        BodyLine {
            kind,
            content,
            no_newline_at_eof: false,
        }
    }
}

/// One contiguous change block within one file. See `spec.md` §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub start_src: usize,
    pub lines_src: usize,
    pub start_tgt: usize,
    pub lines_tgt: usize,
    pub desc: Vec<u8>,
    pub body: Vec<BodyLine>,
    pub invalid: bool,
}

impl Hunk {
    /// Lines that must be present on the source (pre-patch) side: context
    /// and removed lines, in order, content only (no terminator).
    pub fn source_lines(&self) -> Vec<&[u8]> {
        self.body
            .iter()
            .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Remove))
            .map(|l| l.content.as_slice())
            .collect()
    }

    /// Lines that must be present on the target (post-patch) side: context
    /// and added lines, in order, content only (no terminator).
    pub fn target_lines(&self) -> Vec<&[u8]> {
        self.body
            .iter()
            .filter(|l| matches!(l.kind, LineKind::Context | LineKind::Add))
            .map(|l| l.content.as_slice())
            .collect()
    }

    /// Number of added lines (`+`-prefixed).
    pub fn added(&self) -> usize {
        self.body
            .iter()
            .filter(|l| l.kind == LineKind::Add)
            .count()
    }

    /// Number of removed lines (`-`-prefixed).
    pub fn removed(&self) -> usize {
        self.body
            .iter()
            .filter(|l| l.kind == LineKind::Remove)
            .count()
    }

    /// Swap source/target roles for a revert: added lines become removed
    /// lines and vice versa, and the start/count pairs swap sides.
    pub fn reversed(&self) -> Hunk {
        let body = self
            .body
            .iter()
            .map(|l| BodyLine {
                kind: match l.kind {
                    LineKind::Add => LineKind::Remove,
                    LineKind::Remove => LineKind::Add,
                    LineKind::Context => LineKind::Context,
                },
                content: l.content.clone(),
                no_newline_at_eof: l.no_newline_at_eof,
            })
            .collect();
        Hunk {
            start_src: self.start_tgt,
            lines_src: self.lines_tgt,
            start_tgt: self.start_src,
            lines_tgt: self.lines_src,
            desc: self.desc.clone(),
            body,
            invalid: self.invalid,
        }
    }
}

/// Changes to one logical file. See `spec.md` §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    pub header: Vec<Vec<u8>>,
    pub source: Vec<u8>,
    pub target: Vec<u8>,
    pub hunks: Vec<Hunk>,
    pub dialect: Dialect,
    pub added: usize,
    pub removed: usize,
}

impl FilePatch {
    /// The sentinel used in place of a real filename on the deleted/created
    /// side of a patch.
    pub const DEV_NULL: &'static [u8] = b"/dev/null";

    /// `true` when the source side is the `/dev/null` sentinel (file added).
    pub fn is_add(&self) -> bool {
        self.source == Self::DEV_NULL
    }

    /// `true` when the target side is the `/dev/null` sentinel (file removed).
    pub fn is_delete(&self) -> bool {
        self.target == Self::DEV_NULL
    }

    /// The filename this patch actually targets on disk: whichever side
    /// isn't the `/dev/null` sentinel, after normalization. Never fabricates
    /// a name not present in the input.
    pub fn display_name(&self) -> &[u8] {
        if self.target != Self::DEV_NULL {
            &self.target
        } else {
            &self.source
        }
    }

    pub fn recompute_counts(&mut self) {
        self.added = self.hunks.iter().map(Hunk::added).sum();
        self.removed = self.hunks.iter().map(Hunk::removed).sum();
    }
}

/// A category of recoverable parse anomaly or fatal parse failure, recorded
/// against a `PatchSet` rather than just bumping a bare counter (`spec.md`
/// §9 redesign note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    ParseError,
    ParseWarning,
}

/// One recorded parse-time event: what happened, and at what line of the
/// original input (if known).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: Option<usize>,
    pub message: String,
}

/// The whole parsed artifact: an ordered sequence of `FilePatch` plus the
/// set's overall dialect and a structured diagnostic log. See `spec.md` §3.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    pub items: Vec<FilePatch>,
    pub dialect: Option<Dialect>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PatchSet {
    pub fn new() -> Self {
        PatchSet::default()
    }

    /// Count of fatal per-item parse failures (the item was dropped).
    pub fn errors(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::ParseError)
            .count()
    }

    /// Count of recovered anomalies (the item was kept, possibly with
    /// `invalid` hunks).
    pub fn warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::ParseWarning)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn push_error(&mut self, line: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(line = ?line, "{}", message);
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::ParseError,
            line,
            message,
        });
    }

    pub(crate) fn push_warning(&mut self, line: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(line = ?line, "{}", message);
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::ParseWarning,
            line,
            message,
        });
    }
}
