//! # Store Module
//!
//! Persistence behind the [`BlogStore`] trait.
//!
//! Two implementations:
//! - [`MemoryStore`]: BTreeMap-backed, deterministic, used by tests and the
//!   `memory` backend
//! - [`RedbStore`]: embedded redb database with ACID write transactions
//!
//! Stores assign ids and keep referential integrity (comments need an
//! existing post, deleting a post deletes its comments). They do not check
//! permissions or validate text; that is the job of [`crate::Blog`].

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::error::Result;
use crate::{Comment, CommentId, Post, PostId, Timestamp, User, UserId};
use serde::{Deserialize, Serialize};

/// The BlogStore trait defines the storage operations.
///
/// Object safe so the app can pick a backend at runtime.
pub trait BlogStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the username is taken.
    fn insert_user(&mut self, username: &str, email: &str, password_hash: &str) -> Result<User>;

    /// Lookup a user by id.
    fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Lookup a user by exact username.
    fn user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Insert a post. `created_at` and `updated_at` are both `now`.
    fn insert_post(
        &mut self,
        title: &str,
        content: &str,
        author: UserId,
        now: Timestamp,
    ) -> Result<Post>;

    /// Lookup a post by id.
    fn post(&self, id: PostId) -> Result<Option<Post>>;

    /// All posts in listing order (newest first).
    fn posts(&self) -> Result<Vec<Post>>;

    /// Replace a stored post. Fails with `NotFound` if it does not exist.
    fn update_post(&mut self, post: &Post) -> Result<()>;

    /// Delete a post and all of its comments. Returns whether it existed.
    fn delete_post(&mut self, id: PostId) -> Result<bool>;

    /// Insert a comment. Fails with `NotFound` if the post does not exist.
    fn insert_comment(
        &mut self,
        post: PostId,
        author: UserId,
        content: &str,
        now: Timestamp,
    ) -> Result<Comment>;

    /// Lookup a comment by id.
    fn comment(&self, id: CommentId) -> Result<Option<Comment>>;

    /// Comments of a post in listing order (oldest first).
    fn comments_for(&self, post: PostId) -> Result<Vec<Comment>>;

    /// Number of comments on a post.
    fn comment_count(&self, post: PostId) -> Result<usize>;

    /// Replace a stored comment. Fails with `NotFound` if it does not exist.
    fn update_comment(&mut self, comment: &Comment) -> Result<()>;

    /// Delete a comment. Returns whether it existed.
    fn delete_comment(&mut self, id: CommentId) -> Result<bool>;

    /// Record counts.
    fn stats(&self) -> Result<Stats>;
}

/// Record counts of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
}

/// Last assigned id per record kind. Ids are never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Sequences {
    pub last_user: u64,
    pub last_post: u64,
    pub last_comment: u64,
}

impl Sequences {
    pub fn next_user(&mut self) -> UserId {
        self.last_user = self.last_user.saturating_add(1);
        UserId(self.last_user)
    }

    pub fn next_post(&mut self) -> PostId {
        self.last_post = self.last_post.saturating_add(1);
        PostId(self.last_post)
    }

    pub fn next_comment(&mut self) -> CommentId {
        self.last_comment = self.last_comment.saturating_add(1);
        CommentId(self.last_comment)
    }
}

// =============================================================================
// SHARED CONFORMANCE TESTS
// =============================================================================

/// Behaviour every store must share. Each backend's test module runs these.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod conformance {
    use super::*;
    use crate::QuillError;
    use chrono::{TimeZone, Utc};

    pub fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    pub fn ids_start_at_one_and_are_not_reused(store: &mut dyn BlogStore) {
        let user = store.insert_user("alice", "", "hash").unwrap();
        assert_eq!(user.id, UserId(1));

        let first = store.insert_post("First", "content one", user.id, at(1)).unwrap();
        assert_eq!(first.id, PostId(1));
        assert!(store.delete_post(first.id).unwrap());

        let second = store.insert_post("Second", "content two", user.id, at(2)).unwrap();
        assert_eq!(second.id, PostId(2));
    }

    pub fn usernames_are_unique(store: &mut dyn BlogStore) {
        store.insert_user("alice", "", "hash").unwrap();
        let result = store.insert_user("alice", "other@example.com", "hash");
        assert!(matches!(result, Err(QuillError::Conflict(_))));

        // Case-sensitive.
        assert!(store.insert_user("Alice", "", "hash").is_ok());
        assert_eq!(
            store.user_by_username("alice").unwrap().map(|u| u.id),
            Some(UserId(1))
        );
    }

    pub fn posts_list_newest_first(store: &mut dyn BlogStore) {
        let user = store.insert_user("alice", "", "hash").unwrap();
        store.insert_post("Old", "content", user.id, at(10)).unwrap();
        store.insert_post("New", "content", user.id, at(30)).unwrap();
        store.insert_post("Mid", "content", user.id, at(20)).unwrap();

        let titles: Vec<_> = store.posts().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["New", "Mid", "Old"]);
    }

    pub fn update_replaces_record(store: &mut dyn BlogStore) {
        let user = store.insert_user("alice", "", "hash").unwrap();
        let mut post = store.insert_post("Title", "content", user.id, at(1)).unwrap();
        post.title = "Changed".into();
        post.updated_at = at(5);
        store.update_post(&post).unwrap();

        let stored = store.post(post.id).unwrap().unwrap();
        assert_eq!(stored.title, "Changed");
        assert_eq!(stored.created_at, at(1));
        assert_eq!(stored.updated_at, at(5));

        let mut ghost = post.clone();
        ghost.id = PostId(999);
        assert!(matches!(
            store.update_post(&ghost),
            Err(QuillError::NotFound { .. })
        ));
    }

    pub fn comments_follow_their_post(store: &mut dyn BlogStore) {
        let user = store.insert_user("alice", "", "hash").unwrap();
        let post = store.insert_post("Title", "content", user.id, at(1)).unwrap();
        let other = store.insert_post("Other", "content", user.id, at(2)).unwrap();

        let late = store.insert_comment(post.id, user.id, "second", at(20)).unwrap();
        let early = store.insert_comment(post.id, user.id, "first", at(10)).unwrap();
        let elsewhere = store.insert_comment(other.id, user.id, "elsewhere", at(5)).unwrap();

        let ids: Vec<_> = store.comments_for(post.id).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
        assert_eq!(store.comment_count(post.id).unwrap(), 2);

        assert!(store.delete_post(post.id).unwrap());
        assert!(store.comment(early.id).unwrap().is_none());
        assert!(store.comment(late.id).unwrap().is_none());
        assert!(store.comment(elsewhere.id).unwrap().is_some());
        assert_eq!(
            store.stats().unwrap(),
            Stats {
                users: 1,
                posts: 1,
                comments: 1
            }
        );
    }

    pub fn comment_needs_existing_post(store: &mut dyn BlogStore) {
        let user = store.insert_user("alice", "", "hash").unwrap();
        let result = store.insert_comment(PostId(42), user.id, "hello", at(1));
        assert!(matches!(result, Err(QuillError::NotFound { .. })));
    }

    pub fn comment_update_and_delete(store: &mut dyn BlogStore) {
        let user = store.insert_user("alice", "", "hash").unwrap();
        let post = store.insert_post("Title", "content", user.id, at(1)).unwrap();
        let mut comment = store.insert_comment(post.id, user.id, "before", at(2)).unwrap();

        comment.content = "after".into();
        store.update_comment(&comment).unwrap();
        assert_eq!(
            store.comment(comment.id).unwrap().map(|c| c.content),
            Some("after".to_owned())
        );

        assert!(store.delete_comment(comment.id).unwrap());
        assert!(!store.delete_comment(comment.id).unwrap());
        assert_eq!(store.comment_count(post.id).unwrap(), 0);
    }

    pub fn run_all(make: &dyn Fn() -> Box<dyn BlogStore>) {
        ids_start_at_one_and_are_not_reused(make().as_mut());
        usernames_are_unique(make().as_mut());
        posts_list_newest_first(make().as_mut());
        update_replaces_record(make().as_mut());
        comments_follow_their_post(make().as_mut());
        comment_needs_existing_post(make().as_mut());
        comment_update_and_delete(make().as_mut());
    }
}
