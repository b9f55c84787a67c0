//! The errors a store operation can report to its caller.
//!
//! The taxonomy follows how the UI must render each case:
//!
//! - [`Validation`] is caught before any network call and is never logged.
//! - [`Duplicate`] is the recognized unique-constraint conflict; it carries
//!   the offending name so the caller can render "already exists".
//! - [`Backend`] carries the backend's message verbatim.
//! - [`NotConnected`] is the one global, persistent condition.
//!
//! [`Validation`]: StoreError::Validation
//! [`Duplicate`]: StoreError::Duplicate
//! [`Backend`]: StoreError::Backend
//! [`NotConnected`]: StoreError::NotConnected

use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("\"{0}\" already exists")]
    Duplicate(String),
    #[error("{0}")]
    Backend(String),
    #[error("backend connection is not initialized")]
    NotConnected,
}
