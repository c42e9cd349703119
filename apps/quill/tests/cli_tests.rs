//! Integration tests for Quill CLI commands.
//!
//! Uses tempfile for testing file-based operations.

#![allow(clippy::unwrap_used, clippy::panic)]

use quill::cli::{cmd_create_user, cmd_init, cmd_status};
use quill::config::{Backend, open_blog};
use quill::error::CliError;
use quill_core::{Actor, QuillError, Stats};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_redb_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("blog.redb");

    cmd_init(&db_path, false).unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("blog.redb");

    cmd_init(&db_path, false).unwrap();
    let result = cmd_init(&db_path, false);
    assert!(matches!(result, Err(CliError::AlreadyExists(_))));
}

#[test]
fn test_init_force_starts_over() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("blog.redb");

    cmd_init(&db_path, false).unwrap();
    cmd_create_user(Backend::Redb, &db_path, "alice", "", "secret").unwrap();
    assert_eq!(cmd_status(Backend::Redb, &db_path).unwrap().users, 1);

    cmd_init(&db_path, true).unwrap();
    assert_eq!(cmd_status(Backend::Redb, &db_path).unwrap(), Stats::default());
}

// =============================================================================
// CREATE-USER COMMAND TESTS
// =============================================================================

#[test]
fn test_create_user_can_authenticate() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("blog.redb");
    cmd_init(&db_path, false).unwrap();

    let user =
        cmd_create_user(Backend::Redb, &db_path, "alice", "alice@example.com", "secret").unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.id.0, 1);

    let blog = open_blog(Backend::Redb, &db_path).unwrap();
    assert_eq!(blog.authenticate("alice", "secret").unwrap(), Some(user.id));
    assert_eq!(blog.authenticate("alice", "wrong").unwrap(), None);
}

#[test]
fn test_create_user_rejects_duplicate_username() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("blog.redb");
    cmd_init(&db_path, false).unwrap();

    cmd_create_user(Backend::Redb, &db_path, "alice", "", "secret").unwrap();
    let result = cmd_create_user(Backend::Redb, &db_path, "alice", "", "other");
    assert!(matches!(
        result,
        Err(CliError::Core(QuillError::Conflict(_)))
    ));
}

#[test]
fn test_create_user_rejects_memory_backend() {
    let temp = create_temp_dir();
    let result = cmd_create_user(
        Backend::Memory,
        &temp.path().join("unused"),
        "alice",
        "",
        "secret",
    );
    assert!(matches!(result, Err(CliError::InvalidArgument(_))));
}

#[test]
fn test_create_user_requires_init() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("blog.redb");

    let result = cmd_create_user(Backend::Redb, &db_path, "alice", "", "secret");
    assert!(matches!(result, Err(CliError::MissingDatabase(_))));
    assert!(!db_path.exists());
}

// =============================================================================
// STATUS COMMAND TESTS
// =============================================================================

#[test]
fn test_status_counts_records() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("blog.redb");
    cmd_init(&db_path, false).unwrap();

    let alice = cmd_create_user(Backend::Redb, &db_path, "alice", "", "secret").unwrap();
    {
        let mut blog = open_blog(Backend::Redb, &db_path).unwrap();
        let post = blog
            .create_post(
                Actor::user(alice.id),
                json!({"title": "Hello", "content": "First post body"}),
                chrono::Utc::now(),
            )
            .unwrap();
        blog.create_comment(
            Actor::user(alice.id),
            post.id,
            json!({"content": "Self reply"}),
            chrono::Utc::now(),
        )
        .unwrap();
    }

    let stats = cmd_status(Backend::Redb, &db_path).unwrap();
    assert_eq!(
        stats,
        Stats {
            users: 1,
            posts: 1,
            comments: 1,
        }
    );
}

#[test]
fn test_status_memory_backend_is_empty() {
    let temp = create_temp_dir();
    let stats = cmd_status(Backend::Memory, &temp.path().join("unused")).unwrap();
    assert_eq!(stats, Stats::default());
    assert!(!temp.path().join("unused").exists());
}

#[test]
fn test_status_missing_database_is_error() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("typo.redb");

    let result = cmd_status(Backend::Redb, &db_path);
    assert!(matches!(result, Err(CliError::MissingDatabase(path)) if path == db_path));
    assert!(!db_path.exists());
}
