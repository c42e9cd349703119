//! # Configuration
//!
//! Validated runtime settings built from CLI arguments and environment
//! variables, plus backend selection.

use crate::error::CliError;
use axum::http::HeaderValue;
use quill_core::{Blog, MemoryStore, RedbStore};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default listen address.
pub const DEFAULT_BIND: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT));

/// Default database file.
pub const DEFAULT_DATABASE: &str = "quill.redb";

/// Default request budget per second across all clients.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Where records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// Process memory; everything is lost on exit.
    Memory,
    /// A redb database file.
    #[default]
    Redb,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
        })
    }
}

/// Open a blog on the chosen backend. `path` is ignored for memory.
///
/// A redb database must already exist; only [`create_blog`] makes one.
pub fn open_blog(backend: Backend, path: &Path) -> Result<Blog, CliError> {
    match backend {
        Backend::Memory => Ok(Blog::new(MemoryStore::new())),
        Backend::Redb if !path.is_file() => Err(CliError::MissingDatabase(path.to_path_buf())),
        Backend::Redb => Ok(Blog::new(RedbStore::open(path)?)),
    }
}

/// Create a redb database with empty tables at `path`.
pub fn create_blog(path: &Path) -> Result<Blog, CliError> {
    Ok(Blog::new(RedbStore::create(path)?))
}

/// Settings for `quill serve`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub backend: Backend,
    pub database: PathBuf,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: u32,
    /// Allowed CORS origin; `None` allows any.
    pub cors_origin: Option<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            backend: Backend::default(),
            database: PathBuf::from(DEFAULT_DATABASE),
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Validate raw values.
    pub fn new(
        bind: SocketAddr,
        backend: Backend,
        database: PathBuf,
        rate_limit: u32,
        cors_origin: Option<&str>,
    ) -> Result<Self, CliError> {
        let cors_origin = cors_origin
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| {
                    CliError::InvalidArgument(format!("invalid CORS origin {origin:?}"))
                })
            })
            .transpose()?;

        Ok(Self {
            bind,
            backend,
            database,
            rate_limit,
            cors_origin,
        })
    }
}
