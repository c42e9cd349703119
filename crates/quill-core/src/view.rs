//! # View Module
//!
//! JSON representations returned to clients.
//!
//! Records reference users by id; views embed the public part of the user
//! (never the password hash).

use crate::{Comment, CommentId, Post, PostId, Timestamp, User, UserId};
use serde::{Deserialize, Serialize};

/// Public part of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// A comment with its author embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: CommentId,
    pub content: String,
    pub author: UserView,
    pub created_at: Timestamp,
}

impl CommentView {
    #[must_use]
    pub fn new(comment: &Comment, author: UserView) -> Self {
        Self {
            id: comment.id,
            content: comment.content.clone(),
            author,
            created_at: comment.created_at,
        }
    }
}

/// A post as shown in listings: no body, only the comment count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub author: UserView,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub comments_count: usize,
}

impl PostSummary {
    #[must_use]
    pub fn new(post: &Post, author: UserView, comments_count: usize) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            author,
            created_at: post.created_at,
            updated_at: post.updated_at,
            comments_count,
        }
    }
}

/// A single post with its body and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: UserView,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub comments: Vec<CommentView>,
}

impl PostDetail {
    #[must_use]
    pub fn new(post: &Post, author: UserView, comments: Vec<CommentView>) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            author,
            created_at: post.created_at,
            updated_at: post.updated_at,
            comments,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn user_view_hides_password_hash() {
        let user = User {
            id: UserId(3),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "pbkdf2_sha256$1$s$abc".into(),
        };
        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "username": "alice", "email": "alice@example.com"})
        );
    }
}
