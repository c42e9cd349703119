//! # Model Module
//!
//! Stored records and their identifiers.
//!
//! Identifiers are assigned by the store, start at 1 and are never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock instant attached to records. Always UTC.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a registered user.
    UserId
);
record_id!(
    /// Identifier of a blog post.
    PostId
);
record_id!(
    /// Identifier of a comment.
    CommentId
);

// =============================================================================
// RECORDS
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Encoded hash produced by [`crate::password::hash_password`].
    pub password_hash: String,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Post {
    /// Sort key for listings: newest first, later ids first on ties.
    #[must_use]
    pub fn listing_key(&self) -> (std::cmp::Reverse<Timestamp>, std::cmp::Reverse<PostId>) {
        (
            std::cmp::Reverse(self.created_at),
            std::cmp::Reverse(self.id),
        )
    }
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post: PostId,
    pub author: UserId,
    pub content: String,
    pub created_at: Timestamp,
}

impl Comment {
    /// Sort key for listings: oldest first, earlier ids first on ties.
    #[must_use]
    pub fn listing_key(&self) -> (Timestamp, CommentId) {
        (self.created_at, self.id)
    }
}

/// Sort posts into listing order in place.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by_key(Post::listing_key);
}

/// Sort comments into listing order in place.
pub fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by_key(Comment::listing_key);
}

// =============================================================================
// TESTS
// =============================================================================
