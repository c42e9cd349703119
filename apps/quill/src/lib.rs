//! # Quill Library
//!
//! This library exposes the Quill modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

// Re-export quill_core for convenience
pub use quill_core;
