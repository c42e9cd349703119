//! # CLI Module
//!
//! Command-line interface for Quill.
//!
//! ## Commands
//!
//! - `serve` - Start the HTTP server
//! - `init` - Create an empty database
//! - `create-user` - Add an account (the API has no registration)
//! - `status` - Print record counts

use crate::api;
use crate::config::{
    Backend, DEFAULT_BIND, DEFAULT_DATABASE, DEFAULT_RATE_LIMIT, ServerConfig, create_blog,
    open_blog,
};
use crate::error::CliError;
use clap::{Args, Parser, Subcommand};
use quill_core::{Stats, UserView};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use ulid::Ulid;

/// Quill - a small multi-author blog API.
#[derive(Debug, Parser)]
#[command(name = "quill", version, about)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Backend and database location shared by every command.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Storage backend.
    #[arg(long, value_enum, default_value_t = Backend::Redb, env = "QUILL_BACKEND")]
    pub backend: Backend,

    /// Database file (redb backend only).
    #[arg(short = 'D', long, default_value = DEFAULT_DATABASE, env = "QUILL_DATABASE")]
    pub database: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Address to listen on.
    #[arg(short, long, default_value_t = DEFAULT_BIND, env = "QUILL_BIND")]
    pub bind: SocketAddr,

    /// Requests per second across all clients; 0 disables limiting.
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT, env = "QUILL_RATE_LIMIT")]
    pub rate_limit: u32,

    /// Allowed CORS origin. Any origin when unset.
    #[arg(long, env = "QUILL_CORS_ORIGIN")]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve(ServeArgs),

    /// Create an empty database.
    Init {
        #[command(flatten)]
        store: StoreArgs,

        /// Replace an existing database.
        #[arg(long)]
        force: bool,
    },

    /// Add a user account.
    CreateUser {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(short, long)]
        username: String,

        #[arg(short, long, default_value = "")]
        email: String,

        #[arg(short, long, env = "QUILL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show record counts.
    Status {
        #[command(flatten)]
        store: StoreArgs,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve(args) => {
            let config = ServerConfig::new(
                args.bind,
                args.store.backend,
                args.store.database,
                args.rate_limit,
                args.cors_origin.as_deref(),
            )?;
            cmd_serve(config).await
        }
        Commands::Init { store, force } => {
            if store.backend == Backend::Memory {
                return Err(CliError::InvalidArgument(
                    "init needs the redb backend".into(),
                ));
            }
            cmd_init(&store.database, force)
        }
        Commands::CreateUser {
            store,
            username,
            email,
            password,
        } => {
            let user =
                cmd_create_user(store.backend, &store.database, &username, &email, &password)?;
            println!("created user {} (id {})", user.username, user.id);
            Ok(())
        }
        Commands::Status { store, json } => {
            let stats = cmd_status(store.backend, &store.database)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("backend:  {}", store.backend);
                println!("users:    {}", stats.users);
                println!("posts:    {}", stats.posts);
                println!("comments: {}", stats.comments);
            }
            Ok(())
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Open the store and serve until Ctrl+C.
pub async fn cmd_serve(config: ServerConfig) -> Result<(), CliError> {
    let blog = open_blog(config.backend, &config.database)?;
    api::run_server(config, blog).await
}

/// Create an empty redb database at `path`.
pub fn cmd_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() {
        if !force {
            return Err(CliError::AlreadyExists(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
    }
    create_blog(path)?;
    info!(path = %path.display(), "database initialized");
    Ok(())
}

/// Register an account in the database at `path`.
pub fn cmd_create_user(
    backend: Backend,
    path: &Path,
    username: &str,
    email: &str,
    password: &str,
) -> Result<UserView, CliError> {
    if backend == Backend::Memory {
        return Err(CliError::InvalidArgument(
            "users created in memory are lost on exit; use the redb backend".into(),
        ));
    }
    let mut blog = open_blog(backend, path)?;
    let salt = Ulid::new().to_string();
    let user = blog.register_user(username, email, password, &salt)?;
    info!(user = %user.id, username = %user.username, "user created");
    Ok(user)
}

/// Count records in the database at `path`.
pub fn cmd_status(backend: Backend, path: &Path) -> Result<Stats, CliError> {
    let blog = open_blog(backend, path)?;
    Ok(blog.stats()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_defaults() {
        let cli = Cli::try_parse_from(["quill", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            unreachable!("parsed serve");
        };
        assert_eq!(args.bind, DEFAULT_BIND);
        assert_eq!(args.rate_limit, DEFAULT_RATE_LIMIT);
        assert_eq!(args.store.database, PathBuf::from(DEFAULT_DATABASE));
    }

    #[test]
    fn parses_create_user() {
        let cli = Cli::try_parse_from([
            "quill",
            "-v",
            "create-user",
            "--backend",
            "redb",
            "-D",
            "blog.redb",
            "-u",
            "alice",
            "-p",
            "secret",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::CreateUser {
            username, email, ..
        } = cli.command
        else {
            unreachable!("parsed create-user");
        };
        assert_eq!(username, "alice");
        assert_eq!(email, "");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["quill", "status", "--backend", "sqlite"]).is_err());
    }
}
