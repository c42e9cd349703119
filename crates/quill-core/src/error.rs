//! # Error Module
//!
//! The single error type returned by every fallible core operation.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Errors produced by the Quill core.
#[derive(Debug, Error)]
pub enum QuillError {
    /// The requested record does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    /// A write was attempted without an authenticated actor.
    #[error("authentication credentials were not provided")]
    NotAuthenticated,

    /// The actor is authenticated but does not own the target record.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Request payload failed field validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The request body was not valid JSON.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// The request body was not declared as JSON.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// A unique value (such as a username) is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An argument outside of request payloads was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),
}

impl QuillError {
    /// Shorthand for a missing post.
    #[must_use]
    pub fn post_not_found(id: crate::PostId) -> Self {
        Self::NotFound {
            kind: "post",
            id: id.0,
        }
    }

    /// Shorthand for a missing comment.
    #[must_use]
    pub fn comment_not_found(id: crate::CommentId) -> Self {
        Self::NotFound {
            kind: "comment",
            id: id.0,
        }
    }

    /// Shorthand for a missing user.
    #[must_use]
    pub fn user_not_found(id: crate::UserId) -> Self {
        Self::NotFound {
            kind: "user",
            id: id.0,
        }
    }

    /// Wrap any backend error as a storage failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<ValidationErrors> for QuillError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, QuillError>;
