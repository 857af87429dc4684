//! Error types for textmirror-extract.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from extracting text out of one source document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source file could not be read at all.
    #[error("cannot read source document {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file was read but is not a usable PDF (corrupt, encrypted,
    /// or otherwise unparsable).
    #[error("not a readable PDF document {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: pdf_extract::OutputError,
    },
}
