//! In-memory store.
//!
//! Uses `BTreeMap` exclusively for deterministic ordering.

use super::{BlogStore, Sequences, Stats};
use crate::error::{QuillError, Result};
use crate::model::{sort_comments, sort_posts};
use crate::{Comment, CommentId, Post, PostId, Timestamp, User, UserId};
use std::collections::{BTreeMap, BTreeSet};

/// A store that lives and dies with the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: BTreeMap<UserId, User>,

    /// Reverse lookup: username -> UserId
    usernames: BTreeMap<String, UserId>,

    posts: BTreeMap<PostId, Post>,

    comments: BTreeMap<CommentId, Comment>,

    /// Comment ids per post, for listing and cascade delete.
    post_comments: BTreeMap<PostId, BTreeSet<CommentId>>,

    sequences: Sequences,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlogStore for MemoryStore {
    fn insert_user(&mut self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        if self.usernames.contains_key(username) {
            return Err(QuillError::Conflict(format!(
                "username {username:?} is already taken"
            )));
        }

        let user = User {
            id: self.sequences.next_user(),
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
        };
        self.usernames.insert(user.username.clone(), user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .usernames
            .get(username)
            .and_then(|id| self.users.get(id))
            .cloned())
    }

    fn insert_post(
        &mut self,
        title: &str,
        content: &str,
        author: UserId,
        now: Timestamp,
    ) -> Result<Post> {
        if !self.users.contains_key(&author) {
            return Err(QuillError::user_not_found(author));
        }

        let post = Post {
            id: self.sequences.next_post(),
            title: title.to_owned(),
            content: content.to_owned(),
            author,
            created_at: now,
            updated_at: now,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    fn post(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.posts.get(&id).cloned())
    }

    fn posts(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<_> = self.posts.values().cloned().collect();
        sort_posts(&mut posts);
        Ok(posts)
    }

    fn update_post(&mut self, post: &Post) -> Result<()> {
        let slot = self
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| QuillError::post_not_found(post.id))?;
        *slot = post.clone();
        Ok(())
    }

    fn delete_post(&mut self, id: PostId) -> Result<bool> {
        if self.posts.remove(&id).is_none() {
            return Ok(false);
        }
        for comment in self.post_comments.remove(&id).unwrap_or_default() {
            self.comments.remove(&comment);
        }
        Ok(true)
    }

    fn insert_comment(
        &mut self,
        post: PostId,
        author: UserId,
        content: &str,
        now: Timestamp,
    ) -> Result<Comment> {
        if !self.posts.contains_key(&post) {
            return Err(QuillError::post_not_found(post));
        }
        if !self.users.contains_key(&author) {
            return Err(QuillError::user_not_found(author));
        }

        let comment = Comment {
            id: self.sequences.next_comment(),
            post,
            author,
            content: content.to_owned(),
            created_at: now,
        };
        self.post_comments
            .entry(post)
            .or_default()
            .insert(comment.id);
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    fn comment(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self.comments.get(&id).cloned())
    }

    fn comments_for(&self, post: PostId) -> Result<Vec<Comment>> {
        let mut comments: Vec<_> = self
            .post_comments
            .get(&post)
            .into_iter()
            .flatten()
            .filter_map(|id| self.comments.get(id).cloned())
            .collect();
        sort_comments(&mut comments);
        Ok(comments)
    }

    fn comment_count(&self, post: PostId) -> Result<usize> {
        Ok(self.post_comments.get(&post).map_or(0, BTreeSet::len))
    }

    fn update_comment(&mut self, comment: &Comment) -> Result<()> {
        let slot = self
            .comments
            .get_mut(&comment.id)
            .ok_or_else(|| QuillError::comment_not_found(comment.id))?;
        *slot = comment.clone();
        Ok(())
    }

    fn delete_comment(&mut self, id: CommentId) -> Result<bool> {
        let Some(comment) = self.comments.remove(&id) else {
            return Ok(false);
        };
        if let Some(ids) = self.post_comments.get_mut(&comment.post) {
            ids.remove(&id);
        }
        Ok(true)
    }

    fn stats(&self) -> Result<Stats> {
        Ok(Stats {
            users: self.users.len(),
            posts: self.posts.len(),
            comments: self.comments.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    #[test]
    fn memory_store_conformance() {
        conformance::run_all(&|| Box::new(MemoryStore::new()) as Box<dyn BlogStore>);
    }

    #[test]
    fn insert_post_requires_known_author() {
        let mut store = MemoryStore::new();
        let result = store.insert_post("Title", "content", UserId(7), conformance::at(1));
        assert!(matches!(result, Err(QuillError::NotFound { kind: "user", id: 7 })));
    }
}
