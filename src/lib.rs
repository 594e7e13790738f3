//! `patchwork`: a tolerant, multi-dialect unified-diff parser paired with a
//! fuzzy hunk-matching and file-rewriting engine.
//!
//! The pipeline is `bytes → lines → PatchSet → (matcher, target file) →
//! rewritten file`, split across these modules:
//!
//! - [`reader`] — the line-oriented source reader (`spec.md` §4.1)
//! - [`parser`] — the parser state machine producing a [`model::PatchSet`] (§4.2)
//! - [`detect`] — dialect detection and filename normalization (§4.3)
//! - [`matcher`] — hunk location at declared/offset/reverse positions (§4.4)
//! - [`rewrite`] — the atomic rewriter, apply/revert/dry-run (§4.5)
//! - [`pathutil`] — byte-string path utilities (§4.6)
//! - [`model`] — the closed data model (`PatchSet`, `FilePatch`, `Hunk`) (§3)
//!
//! Around the core, [`config`] loads optional on-disk defaults and
//! [`diffstat`] computes the added/removed histogram; [`logging`] is for
//! the CLI binary only. Control flow throughout is single-threaded and
//! synchronous (`spec.md` §5); this crate does not spawn threads or perform
//! I/O beyond what each function's contract documents.

pub mod config;
pub mod detect;
pub mod diffstat;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod parser;
pub mod pathutil;
pub mod reader;
pub mod rewrite;

pub use model::{BodyLine, Dialect, Diagnostic, DiagnosticKind, FilePatch, Hunk, LineKind, PatchSet};
pub use parser::{ParseOptions, parse, parse_path, parse_with_options};
pub use reader::InputError;
pub use rewrite::{
    ApplyError, ApplyOptions, ApplyReport, ApplySummary, FileOutcome, FileResult, apply_patchset,
    revert_patchset,
};
