//! # HTTP API
//!
//! JSON REST surface over [`Blog`].
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Liveness probe |
//! | GET, POST | `/api/posts/` | List or create posts |
//! | GET, PUT, PATCH, DELETE | `/api/posts/{id}/` | Read, update or delete a post |
//! | GET, POST | `/api/posts/{id}/comments/` | List or add comments |
//! | PUT, DELETE | `/api/comments/{id}/` | Edit or delete a comment |
//!
//! Writes need HTTP Basic credentials. Reads are public.

mod error;
mod extract;
mod handlers;

pub use error::{
    ApiError, BASIC_REALM, DETAIL_INVALID_CREDENTIALS, DETAIL_NOT_AUTHENTICATED, DETAIL_NOT_FOUND,
    DETAIL_RATE_LIMITED,
};
pub use extract::{CurrentUser, JsonBody, parse_basic};
pub use handlers::HealthResponse;

use crate::config::ServerConfig;
use crate::error::CliError;
use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use quill_core::Blog;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state of the server.
#[derive(Clone)]
pub struct AppState {
    blog: Arc<RwLock<Blog>>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AppState {
    /// State without rate limiting.
    #[must_use]
    pub fn new(blog: Blog) -> Self {
        Self {
            blog: Arc::new(RwLock::new(blog)),
            limiter: None,
        }
    }

    /// Limit all clients together to `per_second` requests. 0 disables.
    #[must_use]
    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.limiter = NonZeroU32::new(per_second)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        self
    }

    #[must_use]
    pub fn blog(&self) -> &Arc<RwLock<Blog>> {
        &self.blog
    }
}

async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(limiter) = &state.limiter
        && limiter.check().is_err()
    {
        warn!(path = %request.uri().path(), "request throttled");
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

/// Router with permissive CORS.
pub fn create_router(state: AppState) -> Router {
    build_router(state, CorsLayer::permissive())
}

/// Router with the given CORS policy.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/posts/",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/api/posts/{id}/",
            get(handlers::post_detail)
                .put(handlers::replace_post)
                .patch(handlers::patch_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/posts/{id}/comments/",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/api/comments/{id}/",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// Serve `blog` until Ctrl+C.
pub async fn run_server(config: ServerConfig, blog: Blog) -> Result<(), CliError> {
    let state = AppState::new(blog).with_rate_limit(config.rate_limit);
    let app = build_router(state, cors_layer(&config));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        bind = %config.bind,
        backend = %config.backend,
        database = %config.database.display(),
        rate_limit = config.rate_limit,
        "quill listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
