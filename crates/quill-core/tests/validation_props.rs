//! Property tests for request body validation.

#![allow(clippy::unwrap_used, clippy::panic)]

use proptest::prelude::*;
use quill_core::validation::{MSG_POST_CONTENT_TOO_SHORT, MSG_TITLE_TOO_SHORT};
use quill_core::{CommentInput, PostInput, TITLE_MAX_CHARS};
use serde_json::json;

/// Text of exactly `n` non-whitespace characters, mixing ASCII and Hangul.
fn word(min: usize, max: usize) -> impl Strategy<Value = String> {
    let ch = prop_oneof![Just('a'), Just('Z'), Just('7'), Just('가'), Just('!')];
    proptest::collection::vec(ch, min..=max).prop_map(|chars| chars.into_iter().collect())
}

fn padding() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just(' '), Just('\t'), Just('\n')], 0..4)
        .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn padded_valid_posts_are_accepted_and_trimmed(
        title in word(2, TITLE_MAX_CHARS),
        content in word(5, 64),
        left in padding(),
        right in padding(),
    ) {
        let body = json!({
            "title": format!("{left}{title}{right}"),
            "content": format!("{right}{content}{left}"),
        });
        let input = PostInput::parse(&body).unwrap();
        prop_assert_eq!(input.title, title);
        prop_assert_eq!(input.content, content);
    }

    #[test]
    fn one_character_titles_are_rejected(title in word(1, 1), pad in padding()) {
        let body = json!({"title": format!("{pad}{title}{pad}"), "content": "Valid content"});
        let errors = PostInput::parse(&body).unwrap_err();
        prop_assert_eq!(errors.messages("title"), [MSG_TITLE_TOO_SHORT]);
        prop_assert!(!errors.contains("content"));
    }

    #[test]
    fn short_content_is_rejected(content in word(1, 4)) {
        let body = json!({"title": "Valid Title", "content": content});
        let errors = PostInput::parse(&body).unwrap_err();
        prop_assert_eq!(errors.messages("content"), [MSG_POST_CONTENT_TOO_SHORT]);
    }

    #[test]
    fn comment_acceptance_matches_trimmed_length(content in word(1, 8), pad in padding()) {
        let body = json!({"content": format!("{pad}{content}{pad}")});
        let accepted = CommentInput::parse(&body).is_ok();
        prop_assert_eq!(accepted, content.chars().count() >= 2);
    }
}
