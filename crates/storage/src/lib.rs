//! Storage layer for the Gavel governance indexer.
//!
//! This crate provides implementations of the repository traits defined in
//! `gavel-core`:
//!
//! - [`postgres`] - PostgreSQL adapter: connection pooling, migrations,
//!   batched multi-row writes and height-guarded upserts
//! - [`memory`] - In-process adapter with the same conflict semantics, for
//!   tests and embedding
//!
//! # Usage
//!
//! ```ignore
//! use gavel_storage::{Database, DatabaseConfig, PgRepositories};
//!
//! let config = DatabaseConfig::for_indexer(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let encoding = Arc::new(gavel_cosmos::make_encoding_config());
//! let repositories = Arc::new(PgRepositories::new(Arc::new(db), encoding));
//! ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepositories;
pub use postgres::{Database, DatabaseConfig, PgRepositories, PurgeStats};
