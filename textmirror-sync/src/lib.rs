//! # textmirror-sync
//!
//! Mtime-gated reconciliation between source PDFs and their derived text
//! artifacts.
//!
//! [`Reconciler::reconcile_all`] is the startup catch-up pass shared by the
//! CLI and the daemon; [`Reconciler::reconcile_one`] is the incremental
//! per-event path. Both re-read the filesystem for every decision; there
//! is no cached pair state anywhere.

pub mod error;
pub mod invoke;
pub mod locks;
pub mod reconcile;
pub mod staleness;

pub use error::SyncError;
pub use locks::{PathClaim, PathLocks};
pub use reconcile::{is_pdf_source, list_sources, FileOutcome, ReconcileOutcome, Reconciler};
pub use staleness::{derived_path, needs_conversion, ConversionPair};
