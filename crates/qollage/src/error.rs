//! Error types for Qollage operations.
//!
//! [`QollageError`] is returned by every fallible stage of the pipeline. Only
//! best-effort rendering recovers from an error locally; everything else
//! reaches the caller unchanged.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::structure::Position;

/// The main error type for Qollage operations.
#[derive(Debug, Error)]
pub enum QollageError {
    /// The operation kind has no glyph, or it acts on no lines.
    #[error("unsupported operation `{name}` at {position}")]
    UnsupportedOperation { position: Position, name: String },

    /// A qubit, mode, register or bit reference lies outside the declared bounds.
    #[error("invalid reference `{reference}` at {position}: index must be below {bound}")]
    InvalidRegisterReference {
        position: Position,
        reference: String,
        bound: usize,
    },

    #[error("rendering did not finish within {}s", timeout.as_secs_f32())]
    RenderTimeout { timeout: Duration },

    /// The external typesetting engine failed; `diagnostic` is its output verbatim.
    #[error("render backend failed: {diagnostic}")]
    RenderBackendFailure { diagnostic: String },

    /// Writing the output file failed. No partial file is left behind.
    #[error("failed to write {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Export error: {0}")]
    Export(#[from] crate::export::Error),
}

impl QollageError {
    pub fn io_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }
}
