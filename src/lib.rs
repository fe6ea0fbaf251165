//! trameform — Vuetify template markup → trame widget code.
//!
//! Pipeline: lenient markup parse → depth-first code emission (one call or
//! `with` block per element, kebab-case tags → PascalCase constructors,
//! attributes → keyword arguments) → reflow to black-style layout at a
//! configurable line width.
//!
//! Malformed *markup* is never an error; the parser recovers and the emitted
//! tree is authoritative. Two things do fail a conversion:
//! [`ConvertError::Structural`] when the tree holds a node kind the emitter
//! has no rule for, and [`ConvertError::Format`] when the emitted buffer is
//! not well-formed code.

pub mod codegen;
pub mod dom;
pub mod format;
pub mod parse;

use thiserror::Error;

pub use format::FormatError;

/// Default maximum line width for the generated code.
pub const DEFAULT_LINE_LIMIT: usize = 80;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The parsed tree contains a node kind the emitter cannot classify.
    /// An internal contract violation, not a user-input error; no partial
    /// output survives it.
    #[error("cannot emit code for {kind} node {rendered:?}")]
    Structural {
        kind: &'static str,
        rendered: String,
    },
    /// The emitted buffer is not well-formed code. Distinct from
    /// [`ConvertError::Structural`] so callers can report "invalid generated
    /// code" rather than "invalid input".
    #[error("generated code is malformed: {0}")]
    Format(#[from] FormatError),
}

/// Convert Vuetify template markup to formatted trame widget code.
///
/// Pure function of its inputs: a fresh tree and line buffer per call, no
/// state across calls. A `line_limit` of 0 falls back to
/// [`DEFAULT_LINE_LIMIT`].
pub fn convert(markup: &str, line_limit: usize) -> Result<String, ConvertError> {
    let width = if line_limit == 0 {
        DEFAULT_LINE_LIMIT
    } else {
        line_limit
    };

    let tree = parse::parse(markup);
    let lines = codegen::emit_document(&tree)?;
    tracing::debug!(lines = lines.len(), width, "emitted code lines");
    let raw = codegen::render(&lines);
    Ok(format::format(&raw, width)?)
}
