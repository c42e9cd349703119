//! # Permission Module
//!
//! Who may do what.
//!
//! Reads are open to everyone. Writes need an authenticated actor, and
//! changing an existing post or comment needs the actor to be its author.

use crate::error::{QuillError, Result};
use crate::UserId;

pub const MSG_NOT_AUTHOR: &str = "You do not have permission to perform this action.";
pub const MSG_COMMENT_NOT_AUTHOR: &str = "Only the comment author can modify or delete it.";

/// The caller of an operation: an authenticated user or anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actor(Option<UserId>);

impl Actor {
    /// An unauthenticated caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }

    /// An authenticated caller.
    #[must_use]
    pub const fn user(id: UserId) -> Self {
        Self(Some(id))
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.0
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    /// Require an authenticated actor, returning its id.
    pub fn require_authenticated(&self) -> Result<UserId> {
        self.0.ok_or(QuillError::NotAuthenticated)
    }

    /// Require the actor to be `owner`.
    pub fn require_owner(&self, owner: UserId, message: &str) -> Result<UserId> {
        let id = self.require_authenticated()?;
        if id == owner {
            Ok(id)
        } else {
            Err(QuillError::PermissionDenied(message.to_owned()))
        }
    }
}

impl From<Option<UserId>> for Actor {
    fn from(id: Option<UserId>) -> Self {
        Self(id)
    }
}
