//! Disk-backed store using redb.
//!
//! Uses redb embedded database for:
//! - ACID transactions (a post and its comments are deleted atomically)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are encoded with postcard. Id sequences live in the META table.

use super::{BlogStore, Sequences, Stats};
use crate::error::{QuillError, Result};
use crate::model::{sort_comments, sort_posts};
use crate::{Comment, CommentId, Post, PostId, Timestamp, User, UserId};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Record id -> postcard-encoded record.
type RecordTable = TableDefinition<'static, u64, &'static [u8]>;

const USERS: RecordTable = TableDefinition::new("users");
const USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames");
const POSTS: RecordTable = TableDefinition::new("posts");
const COMMENTS: RecordTable = TableDefinition::new("comments");
/// (post id, comment id) -> ()
const POST_COMMENTS: TableDefinition<(u64, u64), ()> = TableDefinition::new("post_comments");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

const SEQUENCES_KEY: &str = "sequences";

/// Convert any redb error into a storage error.
trait StorageResultExt<T> {
    fn storage(self) -> Result<T>;
}

impl<T, E: std::fmt::Display> StorageResultExt<T> for std::result::Result<T, E> {
    fn storage(self) -> Result<T> {
        self.map_err(QuillError::storage)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(postcard::from_bytes(bytes)?)
}

/// A store persisted in a single redb file.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open the database at `path`, creating it and its tables if needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path).storage()?;
        Self::with_tables(db)
    }

    /// Open an existing database. Fails if `path` does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(QuillError::Storage(format!(
                "no database at {}",
                path.display()
            )));
        }
        let db = Database::open(path).storage()?;
        Self::with_tables(db)
    }

    fn with_tables(db: Database) -> Result<Self> {
        let store = Self { db };

        store.write(|txn| {
            txn.open_table(USERS).storage()?;
            txn.open_table(USERNAMES).storage()?;
            txn.open_table(POSTS).storage()?;
            txn.open_table(COMMENTS).storage()?;
            txn.open_table(POST_COMMENTS).storage()?;
            txn.open_table(META).storage()?;
            Ok(())
        })?;

        Ok(store)
    }

    /// Run `f` in a write transaction, committing only if it succeeds.
    fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_write().storage()?;
        let value = f(&txn)?;
        txn.commit().storage()?;
        Ok(value)
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        table: RecordTable,
        id: u64,
    ) -> Result<Option<T>> {
        let txn = self.db.begin_read().storage()?;
        let table = txn.open_table(table).storage()?;
        match table.get(id).storage()? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    fn all_records<T: DeserializeOwned>(&self, table: RecordTable) -> Result<Vec<T>> {
        let txn = self.db.begin_read().storage()?;
        let table = txn.open_table(table).storage()?;
        let mut records = Vec::new();
        for entry in table.iter().storage()? {
            let (_, value) = entry.storage()?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    fn table_len(&self, table: RecordTable) -> Result<usize> {
        let txn = self.db.begin_read().storage()?;
        let table = txn.open_table(table).storage()?;
        Ok(table.len().storage()? as usize)
    }

    /// Replace an existing record, failing with `missing` if absent.
    fn replace_record<T: Serialize>(
        &self,
        table: RecordTable,
        id: u64,
        record: &T,
        missing: QuillError,
    ) -> Result<()> {
        let bytes = encode(record)?;
        self.write(|txn| {
            let mut table = txn.open_table(table).storage()?;
            if table.get(id).storage()?.is_none() {
                return Err(missing);
            }
            table.insert(id, bytes.as_slice()).storage()?;
            Ok(())
        })
    }
}

fn read_sequences(txn: &WriteTransaction) -> Result<Sequences> {
    let meta = txn.open_table(META).storage()?;
    let guard = meta.get(SEQUENCES_KEY).storage()?;
    match guard {
        Some(bytes) => decode(bytes.value()),
        None => Ok(Sequences::default()),
    }
}

fn write_sequences(txn: &WriteTransaction, sequences: &Sequences) -> Result<()> {
    let bytes = encode(sequences)?;
    let mut meta = txn.open_table(META).storage()?;
    meta.insert(SEQUENCES_KEY, bytes.as_slice()).storage()?;
    Ok(())
}

fn contains(txn: &WriteTransaction, table: RecordTable, id: u64) -> Result<bool> {
    let table = txn.open_table(table).storage()?;
    Ok(table.get(id).storage()?.is_some())
}

impl BlogStore for RedbStore {
    fn insert_user(&mut self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        self.write(|txn| {
            let mut names = txn.open_table(USERNAMES).storage()?;
            if names.get(username).storage()?.is_some() {
                return Err(QuillError::Conflict(format!(
                    "username {username:?} is already taken"
                )));
            }

            let mut sequences = read_sequences(txn)?;
            let user = User {
                id: sequences.next_user(),
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash: password_hash.to_owned(),
            };
            let bytes = encode(&user)?;

            names.insert(username, user.id.0).storage()?;
            let mut users = txn.open_table(USERS).storage()?;
            users.insert(user.id.0, bytes.as_slice()).storage()?;
            write_sequences(txn, &sequences)?;
            Ok(user)
        })
    }

    fn user(&self, id: UserId) -> Result<Option<User>> {
        self.get_record(USERS, id.0)
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let id = {
            let txn = self.db.begin_read().storage()?;
            let names = txn.open_table(USERNAMES).storage()?;
            names.get(username).storage()?.map(|guard| guard.value())
        };
        match id {
            Some(id) => self.get_record(USERS, id),
            None => Ok(None),
        }
    }

    fn insert_post(
        &mut self,
        title: &str,
        content: &str,
        author: UserId,
        now: Timestamp,
    ) -> Result<Post> {
        self.write(|txn| {
            if !contains(txn, USERS, author.0)? {
                return Err(QuillError::user_not_found(author));
            }

            let mut sequences = read_sequences(txn)?;
            let post = Post {
                id: sequences.next_post(),
                title: title.to_owned(),
                content: content.to_owned(),
                author,
                created_at: now,
                updated_at: now,
            };
            let bytes = encode(&post)?;

            let mut posts = txn.open_table(POSTS).storage()?;
            posts.insert(post.id.0, bytes.as_slice()).storage()?;
            write_sequences(txn, &sequences)?;
            Ok(post)
        })
    }

    fn post(&self, id: PostId) -> Result<Option<Post>> {
        self.get_record(POSTS, id.0)
    }

    fn posts(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.all_records(POSTS)?;
        sort_posts(&mut posts);
        Ok(posts)
    }

    fn update_post(&mut self, post: &Post) -> Result<()> {
        self.replace_record(POSTS, post.id.0, post, QuillError::post_not_found(post.id))
    }

    fn delete_post(&mut self, id: PostId) -> Result<bool> {
        self.write(|txn| {
            let mut posts = txn.open_table(POSTS).storage()?;
            if posts.remove(id.0).storage()?.is_none() {
                return Ok(false);
            }

            let mut links = txn.open_table(POST_COMMENTS).storage()?;
            let mut doomed = Vec::new();
            for entry in links.range((id.0, 0)..=(id.0, u64::MAX)).storage()? {
                let (key, _) = entry.storage()?;
                doomed.push(key.value().1);
            }

            let mut comments = txn.open_table(COMMENTS).storage()?;
            for comment in doomed {
                links.remove((id.0, comment)).storage()?;
                comments.remove(comment).storage()?;
            }
            Ok(true)
        })
    }

    fn insert_comment(
        &mut self,
        post: PostId,
        author: UserId,
        content: &str,
        now: Timestamp,
    ) -> Result<Comment> {
        self.write(|txn| {
            if !contains(txn, POSTS, post.0)? {
                return Err(QuillError::post_not_found(post));
            }
            if !contains(txn, USERS, author.0)? {
                return Err(QuillError::user_not_found(author));
            }

            let mut sequences = read_sequences(txn)?;
            let comment = Comment {
                id: sequences.next_comment(),
                post,
                author,
                content: content.to_owned(),
                created_at: now,
            };
            let bytes = encode(&comment)?;

            let mut comments = txn.open_table(COMMENTS).storage()?;
            comments.insert(comment.id.0, bytes.as_slice()).storage()?;
            let mut links = txn.open_table(POST_COMMENTS).storage()?;
            links.insert((post.0, comment.id.0), ()).storage()?;
            write_sequences(txn, &sequences)?;
            Ok(comment)
        })
    }

    fn comment(&self, id: CommentId) -> Result<Option<Comment>> {
        self.get_record(COMMENTS, id.0)
    }

    fn comments_for(&self, post: PostId) -> Result<Vec<Comment>> {
        let txn = self.db.begin_read().storage()?;
        let links = txn.open_table(POST_COMMENTS).storage()?;
        let records = txn.open_table(COMMENTS).storage()?;

        let mut comments = Vec::new();
        for entry in links.range((post.0, 0)..=(post.0, u64::MAX)).storage()? {
            let (key, _) = entry.storage()?;
            if let Some(guard) = records.get(key.value().1).storage()? {
                comments.push(decode::<Comment>(guard.value())?);
            }
        }
        sort_comments(&mut comments);
        Ok(comments)
    }

    fn comment_count(&self, post: PostId) -> Result<usize> {
        let txn = self.db.begin_read().storage()?;
        let links = txn.open_table(POST_COMMENTS).storage()?;
        let mut count = 0usize;
        for entry in links.range((post.0, 0)..=(post.0, u64::MAX)).storage()? {
            entry.storage()?;
            count = count.saturating_add(1);
        }
        Ok(count)
    }

    fn update_comment(&mut self, comment: &Comment) -> Result<()> {
        self.replace_record(
            COMMENTS,
            comment.id.0,
            comment,
            QuillError::comment_not_found(comment.id),
        )
    }

    fn delete_comment(&mut self, id: CommentId) -> Result<bool> {
        self.write(|txn| {
            let mut comments = txn.open_table(COMMENTS).storage()?;
            let removed = comments
                .remove(id.0)
                .storage()?
                .map(|guard| decode::<Comment>(guard.value()))
                .transpose()?;
            let Some(comment) = removed else {
                return Ok(false);
            };

            let mut links = txn.open_table(POST_COMMENTS).storage()?;
            links.remove((comment.post.0, id.0)).storage()?;
            Ok(true)
        })
    }

    fn stats(&self) -> Result<Stats> {
        Ok(Stats {
            users: self.table_len(USERS)?,
            posts: self.table_len(POSTS)?,
            comments: self.table_len(COMMENTS)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use std::cell::Cell;

    #[test]
    fn redb_store_conformance() {
        let dir = tempfile::tempdir().unwrap();
        let counter = Cell::new(0u32);
        let make = || {
            counter.set(counter.get() + 1);
            let path = dir.path().join(format!("store-{}.redb", counter.get()));
            Box::new(RedbStore::create(path).unwrap()) as Box<dyn BlogStore>
        };
        conformance::run_all(&make);
    }

    #[test]
    fn open_refuses_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.redb");

        assert!(matches!(RedbStore::open(&path), Err(QuillError::Storage(_))));
        assert!(!path.exists());
    }

    #[test]
    fn open_reads_created_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.redb");
        {
            let mut store = RedbStore::create(&path).unwrap();
            store.insert_user("alice", "", "hash").unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.stats().unwrap().users, 1);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.redb");

        let post_id = {
            let mut store = RedbStore::create(&path).unwrap();
            let user = store.insert_user("alice", "a@example.com", "hash").unwrap();
            let post = store
                .insert_post("Persisted", "still here", user.id, conformance::at(1))
                .unwrap();
            store
                .insert_comment(post.id, user.id, "a comment", conformance::at(2))
                .unwrap();
            post.id
        };

        let mut store = RedbStore::create(&path).unwrap();
        let post = store.post(post_id).unwrap().unwrap();
        assert_eq!(post.title, "Persisted");
        assert_eq!(post.created_at, conformance::at(1));
        assert_eq!(store.comment_count(post_id).unwrap(), 1);

        // Sequences continue after reopen.
        let bob = store.insert_user("bob", "", "hash").unwrap();
        assert_eq!(bob.id, UserId(2));
    }
}
