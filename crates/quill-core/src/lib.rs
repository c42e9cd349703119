//! # Quill Core
//!
//! Domain logic for the Quill blog service.
//!
//! This crate owns every rule of the service: identifiers, records, input
//! validation, author permissions, the JSON representations returned to
//! clients, and storage behind the [`BlogStore`] trait.
//!
//! It performs no I/O of its own apart from the redb-backed store, never
//! reads the wall clock and never generates randomness. Callers pass
//! timestamps and password salts in, which keeps every operation
//! reproducible in tests.
//!
//! The entry point is [`Blog`], which wraps a store and enforces the
//! authentication, ownership and validation order for each operation.

pub mod blog;
pub mod error;
pub mod model;
pub mod password;
pub mod permission;
pub mod store;
pub mod validation;
pub mod view;

pub use blog::{Blog, Credentials};
pub use error::{QuillError, Result};
pub use model::{Comment, CommentId, Post, PostId, Timestamp, User, UserId};
pub use permission::Actor;
pub use store::{BlogStore, MemoryStore, RedbStore, Stats};
pub use validation::{Body, CommentInput, PostInput, PostPatch, ValidationErrors};
pub use view::{CommentView, PostDetail, PostSummary, UserView};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum length of a post title, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// Minimum length of a trimmed post title, in characters.
pub const TITLE_MIN_CHARS: usize = 2;

/// Minimum length of trimmed post content, in characters.
pub const POST_CONTENT_MIN_CHARS: usize = 5;

/// Minimum length of trimmed comment content, in characters.
pub const COMMENT_CONTENT_MIN_CHARS: usize = 2;

/// Maximum length of a username, in characters.
pub const USERNAME_MAX_CHARS: usize = 150;
