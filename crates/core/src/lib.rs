//! Core domain layer for the Gavel governance indexer.
//!
//! This crate contains the domain models, port traits (interfaces), the
//! proposal content codec and the address resolution dispatcher. It is the
//! innermost layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      gavel (binary)                         │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │        gavel-storage         │         gavel-cosmos         │
//! │   (PostgreSQL, in-memory)    │  (contents, msgs, resolvers) │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                    gavel-core  ← YOU ARE HERE               │
//! │          (models, ports, codec, address dispatcher)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (params, proposals, deposits, votes, tallies)
//! - [`ports`] - Repository traits for adapters to implement
//! - [`codec`] - Type-tagged envelopes for polymorphic proposal content
//! - [`addresses`] - Ordered resolver chain for message addresses
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Write guarantees
//!
//! The external ingestion pipeline may deliver events out of order, twice,
//! or in retried batches. Every write port tolerates this:
//!
//! 1. Singleton rows (params, tally snapshots) only move to a newer height
//! 2. Natural-key facts (proposals, deposits, votes) are inserted once
//! 3. A batch lands entirely or not at all

pub mod addresses;
pub mod codec;
pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
