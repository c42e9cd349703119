//! # Validation Module
//!
//! Turns untrusted JSON request bodies into typed inputs.
//!
//! Every field is checked and every failure is reported, keyed by field
//! name. Unknown keys are ignored, so a client can never smuggle in server
//! owned values such as `author` or `created_at`.
//!
//! String handling:
//! - numbers are accepted and converted to their decimal text
//! - values are trimmed before checks and stored trimmed
//! - lengths count characters, not bytes

use crate::error::QuillError;
use crate::{
    COMMENT_CONTENT_MIN_CHARS, POST_CONTENT_MIN_CHARS, TITLE_MAX_CHARS, TITLE_MIN_CHARS,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NULL: &str = "This field may not be null.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_NOT_A_STRING: &str = "Not a valid string.";
pub const MSG_TITLE_TOO_SHORT: &str = "Title must be at least 2 characters long.";
pub const MSG_POST_CONTENT_TOO_SHORT: &str = "Content must be at least 5 characters long.";
pub const MSG_COMMENT_TOO_SHORT: &str = "Comment must be at least 2 characters long.";

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

// =============================================================================
// REQUEST BODY
// =============================================================================

/// A request body as received by the transport.
///
/// Parse failures are carried instead of raised so they surface at the
/// validation step, after authentication and ownership checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Well-formed JSON of any shape.
    Json(Value),
    /// The bytes were not valid JSON.
    Malformed(String),
    /// The body was not declared as JSON.
    UnsupportedMediaType(String),
}

impl Body {
    /// The parsed JSON, or the transport error.
    pub fn json(&self) -> crate::Result<&Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Malformed(reason) => Err(QuillError::MalformedBody(reason.clone())),
            Self::UnsupportedMediaType(reason) => {
                Err(QuillError::UnsupportedMediaType(reason.clone()))
            }
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

// =============================================================================
// ERROR COLLECTION
// =============================================================================

/// Field name -> messages, in deterministic key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a field has at least one message.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Field names with errors.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TYPED INPUTS
// =============================================================================

/// Complete post payload, used for create and full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

/// Partial post payload. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Comment payload, used for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInput {
    pub content: String,
}

impl PostInput {
    /// Validate a full post body.
    pub fn parse(body: &Value) -> Result<Self, ValidationErrors> {
        let patch = parse_post(body, true)?;
        match (patch.title, patch.content) {
            (Some(title), Some(content)) => Ok(Self { title, content }),
            // Required mode reports missing fields, so both are present here.
            _ => {
                let mut errors = ValidationErrors::new();
                errors.add(NON_FIELD_ERRORS, MSG_REQUIRED);
                Err(errors)
            }
        }
    }
}

impl PostPatch {
    /// Validate a partial post body.
    pub fn parse(body: &Value) -> Result<Self, ValidationErrors> {
        parse_post(body, false)
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

impl From<PostInput> for PostPatch {
    fn from(input: PostInput) -> Self {
        Self {
            title: Some(input.title),
            content: Some(input.content),
        }
    }
}

impl CommentInput {
    /// Validate a comment body.
    pub fn parse(body: &Value) -> Result<Self, ValidationErrors> {
        let object = expect_object(body)?;
        let mut errors = ValidationErrors::new();

        let content = string_field(object, "content", true, &mut errors).and_then(|content| {
            min_chars(
                content,
                "content",
                COMMENT_CONTENT_MIN_CHARS,
                MSG_COMMENT_TOO_SHORT,
                &mut errors,
            )
        });

        errors.into_result(|| Self {
            content: content.unwrap_or_default(),
        })
    }
}

fn parse_post(body: &Value, required: bool) -> Result<PostPatch, ValidationErrors> {
    let object = expect_object(body)?;
    let mut errors = ValidationErrors::new();

    let title = string_field(object, "title", required, &mut errors).and_then(|title| {
        if title.chars().count() > TITLE_MAX_CHARS {
            errors.add(
                "title",
                format!("Ensure this field has no more than {TITLE_MAX_CHARS} characters."),
            );
            None
        } else {
            min_chars(title, "title", TITLE_MIN_CHARS, MSG_TITLE_TOO_SHORT, &mut errors)
        }
    });

    let content = string_field(object, "content", required, &mut errors).and_then(|content| {
        min_chars(
            content,
            "content",
            POST_CONTENT_MIN_CHARS,
            MSG_POST_CONTENT_TOO_SHORT,
            &mut errors,
        )
    });

    errors.into_result(|| PostPatch { title, content })
}

// =============================================================================
// FIELD HELPERS
// =============================================================================

fn expect_object(body: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    let kind = match body {
        Value::Object(map) => return Ok(map),
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
    };
    let mut errors = ValidationErrors::new();
    errors.add(
        NON_FIELD_ERRORS,
        format!("Invalid data. Expected an object, but got {kind}."),
    );
    Err(errors)
}

/// Read, coerce and trim a string field. `None` means absent or invalid;
/// invalid values have already been recorded in `errors`.
fn string_field(
    object: &Map<String, Value>,
    field: &str,
    required: bool,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let raw = match object.get(field) {
        None => {
            if required {
                errors.add(field, MSG_REQUIRED);
            }
            return None;
        }
        Some(Value::Null) => {
            errors.add(field, MSG_NULL);
            return None;
        }
        Some(Value::String(s)) => s.as_str().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            errors.add(field, MSG_NOT_A_STRING);
            return None;
        }
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.add(field, MSG_BLANK);
        return None;
    }
    Some(trimmed.to_owned())
}

fn min_chars(
    value: String,
    field: &str,
    min: usize,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    if value.chars().count() < min {
        errors.add(field, message);
        None
    } else {
        Some(value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
