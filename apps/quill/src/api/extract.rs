//! Request extractors: the acting user and the JSON body.

use super::AppState;
use super::error::ApiError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quill_core::validation::Body;
use quill_core::{Actor, Credentials, UserId};
use serde_json::Value;
use std::convert::Infallible;
use tracing::debug;

/// The authenticated user, or anonymous when no Basic credentials were sent.
///
/// Credentials that are sent but wrong reject the request with 401 instead
/// of silently falling back to anonymous.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Actor);

impl CurrentUser {
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.0
    }
}

/// Split a Basic `Authorization` value into username and password.
///
/// Returns `Ok(None)` for other schemes, which are treated as anonymous.
pub fn parse_basic(value: &str) -> Result<Option<(String, String)>, ApiError> {
    let Some((scheme, encoded)) = value.trim().split_once(' ') else {
        return Ok(None);
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return Ok(None);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::MalformedCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ApiError::MalformedCredentials)?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(ApiError::MalformedCredentials)?;
    Ok(Some((username.to_owned(), password.to_owned())))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(Actor::anonymous()));
        };
        let header = header.to_str().map_err(|_| ApiError::MalformedCredentials)?;
        let Some((username, password)) = parse_basic(header)? else {
            return Ok(Self(Actor::anonymous()));
        };

        let credentials = {
            let blog = state.blog().read().await;
            blog.credentials(&username)?
        };
        let Some(credentials) = credentials else {
            return Err(ApiError::InvalidCredentials);
        };
        match verify_credentials(credentials, password).await? {
            Some(id) => {
                debug!(user = %id, "authenticated");
                Ok(Self(Actor::user(id)))
            }
            None => Err(ApiError::InvalidCredentials),
        }
    }
}

/// Check a password on the blocking pool so hashing never stalls the runtime.
///
/// Takes no [`AppState`]: the blog lock is never held while hashing.
pub async fn verify_credentials(
    credentials: Credentials,
    password: String,
) -> Result<Option<UserId>, ApiError> {
    tokio::task::spawn_blocking(move || credentials.verify(&password))
        .await
        .map_err(|err| ApiError::Internal(format!("password check failed: {err}")))
}

/// A JSON request body whose parse errors are deferred to the core.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Body);

impl From<JsonBody> for Body {
    fn from(body: JsonBody) -> Self {
        body.0
    }
}

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Body::Json(value),
            Err(JsonRejection::MissingJsonContentType(rejection)) => {
                Body::UnsupportedMediaType(rejection.body_text())
            }
            Err(rejection) => Body::Malformed(rejection.body_text()),
        };
        Ok(Self(body))
    }
}
