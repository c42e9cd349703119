//! # Blog Module
//!
//! The service layer. Every client-facing operation goes through [`Blog`].
//!
//! Checks run in a fixed order for each operation:
//! 1. authentication (anonymous writes fail first)
//! 2. lookup of the target record (missing records fail next)
//! 3. ownership of the target record
//! 4. validation of the request body
//!
//! So an anonymous request against a missing post reports missing
//! credentials, and a non-author sending garbage is told they may not
//! edit, not that the garbage is invalid.

use crate::error::{QuillError, Result};
use crate::password::{hash_password, verify_password};
use crate::permission::{Actor, MSG_COMMENT_NOT_AUTHOR, MSG_NOT_AUTHOR};
use crate::store::{BlogStore, MemoryStore, Stats};
use crate::validation::{Body, CommentInput, PostInput, PostPatch};
use crate::view::{CommentView, PostDetail, PostSummary, UserView};
use crate::{Comment, CommentId, Post, PostId, Timestamp, USERNAME_MAX_CHARS, UserId};
use std::collections::BTreeMap;

/// A user's stored password hash, detached from the store.
///
/// Verification is slow: take these out under a lock on the blog and verify
/// after releasing it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: UserId,
    password_hash: String,
}

impl Credentials {
    /// The user id if `password` matches.
    #[must_use]
    pub fn verify(&self, password: &str) -> Option<UserId> {
        verify_password(password, &self.password_hash).then_some(self.user)
    }
}

/// A blog backed by some store.
pub struct Blog {
    store: Box<dyn BlogStore>,
}

impl std::fmt::Debug for Blog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blog").finish_non_exhaustive()
    }
}

impl Default for Blog {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Blog {
    /// Wrap a store.
    pub fn new(store: impl BlogStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Wrap an already boxed store.
    #[must_use]
    pub fn from_boxed(store: Box<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// A blog with an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn BlogStore {
        self.store.as_ref()
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Create an account. `salt` must not contain `$`.
    pub fn register_user(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        salt: &str,
    ) -> Result<UserView> {
        validate_username(username)?;
        let email = email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(QuillError::InvalidInput(format!(
                "{email:?} is not a valid email address"
            )));
        }
        if password.is_empty() {
            return Err(QuillError::InvalidInput("password must not be empty".into()));
        }
        if salt.is_empty() || salt.contains('$') {
            return Err(QuillError::InvalidInput(
                "salt must be non-empty and must not contain '$'".into(),
            ));
        }

        let hash = hash_password(password, salt);
        let user = self.store.insert_user(username, email, &hash)?;
        Ok(UserView::from(&user))
    }

    /// Check credentials. Unknown users and wrong passwords both give `None`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserId>> {
        Ok(self
            .credentials(username)?
            .and_then(|credentials| credentials.verify(password)))
    }

    /// The stored hash of `username`, for verifying away from the blog.
    pub fn credentials(&self, username: &str) -> Result<Option<Credentials>> {
        Ok(self
            .store
            .user_by_username(username)?
            .map(|user| Credentials {
                user: user.id,
                password_hash: user.password_hash,
            }))
    }

    // =========================================================================
    // POSTS
    // =========================================================================

    /// All posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let mut authors = AuthorCache::default();
        self.store
            .posts()?
            .iter()
            .map(|post| {
                let author = authors.view(self.store(), post.author)?;
                let count = self.store.comment_count(post.id)?;
                Ok(PostSummary::new(post, author, count))
            })
            .collect()
    }

    /// One post with its comments.
    pub fn post_detail(&self, id: PostId) -> Result<PostDetail> {
        let post = self.load_post(id)?;
        self.detail_of(&post)
    }

    /// Create a post authored by the actor.
    ///
    /// Returns the full detail view (id, author, timestamps, comments), not
    /// just the submitted `title` and `content`. Clients reading only those
    /// two fields see the same values they sent, trimmed.
    pub fn create_post(
        &mut self,
        actor: Actor,
        body: impl Into<Body>,
        now: Timestamp,
    ) -> Result<PostDetail> {
        let author = actor.require_authenticated()?;
        let input = PostInput::parse(body.into().json()?)?;
        let post = self
            .store
            .insert_post(&input.title, &input.content, author, now)?;
        self.detail_of(&post)
    }

    /// Update a post. `partial` leaves absent fields unchanged.
    ///
    /// Like [`Blog::create_post`], answers with the full detail view.
    pub fn update_post(
        &mut self,
        actor: Actor,
        id: PostId,
        body: impl Into<Body>,
        partial: bool,
        now: Timestamp,
    ) -> Result<PostDetail> {
        actor.require_authenticated()?;
        let mut post = self.load_post(id)?;
        actor.require_owner(post.author, MSG_NOT_AUTHOR)?;

        let body = body.into();
        let value = body.json()?;
        let patch = if partial {
            PostPatch::parse(value)?
        } else {
            PostPatch::from(PostInput::parse(value)?)
        };
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        post.updated_at = now;

        self.store.update_post(&post)?;
        self.detail_of(&post)
    }

    /// Delete a post and its comments.
    pub fn delete_post(&mut self, actor: Actor, id: PostId) -> Result<()> {
        actor.require_authenticated()?;
        let post = self.load_post(id)?;
        actor.require_owner(post.author, MSG_NOT_AUTHOR)?;

        if self.store.delete_post(id)? {
            Ok(())
        } else {
            Err(QuillError::post_not_found(id))
        }
    }

    // =========================================================================
    // COMMENTS
    // =========================================================================

    /// Comments of a post, oldest first.
    pub fn list_comments(&self, post: PostId) -> Result<Vec<CommentView>> {
        let post = self.load_post(post)?;
        self.comment_views(post.id)
    }

    /// Comment on a post as the actor.
    pub fn create_comment(
        &mut self,
        actor: Actor,
        post: PostId,
        body: impl Into<Body>,
        now: Timestamp,
    ) -> Result<CommentView> {
        let author = actor.require_authenticated()?;
        let post = self.load_post(post)?;
        let input = CommentInput::parse(body.into().json()?)?;

        let comment = self
            .store
            .insert_comment(post.id, author, &input.content, now)?;
        self.comment_view(&comment)
    }

    /// Replace the text of a comment. `created_at` is kept.
    pub fn update_comment(
        &mut self,
        actor: Actor,
        id: CommentId,
        body: impl Into<Body>,
    ) -> Result<CommentView> {
        actor.require_authenticated()?;
        let mut comment = self.load_comment(id)?;
        actor.require_owner(comment.author, MSG_COMMENT_NOT_AUTHOR)?;

        let input = CommentInput::parse(body.into().json()?)?;
        comment.content = input.content;
        self.store.update_comment(&comment)?;
        self.comment_view(&comment)
    }

    /// Delete a comment.
    pub fn delete_comment(&mut self, actor: Actor, id: CommentId) -> Result<()> {
        actor.require_authenticated()?;
        let comment = self.load_comment(id)?;
        actor.require_owner(comment.author, MSG_COMMENT_NOT_AUTHOR)?;

        if self.store.delete_comment(id)? {
            Ok(())
        } else {
            Err(QuillError::comment_not_found(id))
        }
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Record counts.
    pub fn stats(&self) -> Result<Stats> {
        self.store.stats()
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn load_post(&self, id: PostId) -> Result<Post> {
        self.store
            .post(id)?
            .ok_or_else(|| QuillError::post_not_found(id))
    }

    fn load_comment(&self, id: CommentId) -> Result<Comment> {
        self.store
            .comment(id)?
            .ok_or_else(|| QuillError::comment_not_found(id))
    }

    fn detail_of(&self, post: &Post) -> Result<PostDetail> {
        let mut authors = AuthorCache::default();
        let author = authors.view(self.store(), post.author)?;
        let comments = self.comment_views_with(post.id, &mut authors)?;
        Ok(PostDetail::new(post, author, comments))
    }

    fn comment_view(&self, comment: &Comment) -> Result<CommentView> {
        let author = AuthorCache::default().view(self.store(), comment.author)?;
        Ok(CommentView::new(comment, author))
    }

    fn comment_views(&self, post: PostId) -> Result<Vec<CommentView>> {
        self.comment_views_with(post, &mut AuthorCache::default())
    }

    fn comment_views_with(
        &self,
        post: PostId,
        authors: &mut AuthorCache,
    ) -> Result<Vec<CommentView>> {
        self.store
            .comments_for(post)?
            .iter()
            .map(|comment| {
                let author = authors.view(self.store(), comment.author)?;
                Ok(CommentView::new(comment, author))
            })
            .collect()
    }
}

/// Per-call memo of user views, so a listing loads each author once.
#[derive(Default)]
struct AuthorCache(BTreeMap<UserId, UserView>);

impl AuthorCache {
    fn view(&mut self, store: &dyn BlogStore, id: UserId) -> Result<UserView> {
        if let Some(view) = self.0.get(&id) {
            return Ok(view.clone());
        }
        let user = store.user(id)?.ok_or_else(|| QuillError::user_not_found(id))?;
        let view = UserView::from(&user);
        self.0.insert(id, view.clone());
        Ok(view)
    }
}

fn validate_username(username: &str) -> Result<()> {
    let length = username.chars().count();
    if length == 0 || length > USERNAME_MAX_CHARS {
        return Err(QuillError::InvalidInput(format!(
            "username must be 1 to {USERNAME_MAX_CHARS} characters"
        )));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(QuillError::InvalidInput(
            "username may only contain letters, digits and @/./+/-/_".into(),
        ));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
