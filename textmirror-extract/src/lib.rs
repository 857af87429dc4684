//! # textmirror-extract
//!
//! The text-extraction collaborator: turns one PDF into one string of text.
//!
//! [`TextExtractor`] is the seam the synchronization core and the daemon
//! program against; [`PdfTextExtractor`] is the production implementation.

pub mod error;
pub mod pdf;

pub use error::ExtractError;
pub use pdf::{PdfTextExtractor, TextExtractor};
