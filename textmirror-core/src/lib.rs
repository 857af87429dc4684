//! Textmirror core library — configuration types, loading, errors.
//!
//! Public API surface:
//! - [`types`] — [`WatchTarget`], [`WatcherLossPolicy`], resolved [`Config`]
//! - [`error`] — [`ConfigError`]
//! - [`config`] — [`config::load`]

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{Config, WatchTarget, WatcherLossPolicy};
