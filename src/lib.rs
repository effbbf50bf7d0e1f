//! # zipserve
//!
//! An ad-hoc HTTP file server for a directory tree, which also lets clients
//! browse into the zip archives inside that tree as if they were
//! directories.
//!
//! ## Request handling
//!
//! - [`path`] decodes the request path once and splits it at the first
//!   segment named like a zip archive.
//! - [`resolve`] classifies what the path names, on disk or inside the
//!   archive, as a [`ServeTarget`].
//! - [`listing`] renders directory listings, sorted in [`natural`] order
//!   with sizes from [`humanize`].
//! - [`server`] holds the dispatcher that ties these together and turns
//!   every [`ServeError`] into a status code, plus the plain or TLS transport.
//!
//! Symlinks are never served. Archive contents are read fresh on every
//! request; nothing is cached and nothing is written.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipserve::server::{AppState, TracingRequestLog, router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = std::fs::canonicalize(".")?;
//!     let app = router(AppState::new(root, Arc::new(TracingRequestLog)));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod humanize;
pub mod io;
pub mod listing;
pub mod natural;
pub mod path;
pub mod resolve;
pub mod server;
pub mod sniff;
pub mod zip;

pub use cli::{Cli, ServerConfig};
pub use error::ServeError;
pub use path::{PathPartition, segment};
pub use resolve::ServeTarget;
pub use zip::{ZipArchive, ZipFileEntry};
