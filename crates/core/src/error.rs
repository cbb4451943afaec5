//! Crate error type.
//!
//! Contract violations (adding while an iterator is live, deleting with a foreign element
//! id, a non-canonical insert rectangle) are programming errors and panic, the same way the
//! originating C library's `ASSERT` aborts rather than returning a value a caller could
//! silently ignore. Only conditions that a well-behaved caller can legitimately run into at
//! runtime are modeled as [`Error`]/[`Result`].

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Returned by [`crate::BPlane::delete`] when called on a plane that holds no elements.
    #[error("delete called on an empty plane")]
    EmptyPlane,
}

pub type Result<T> = std::result::Result<T, Error>;
