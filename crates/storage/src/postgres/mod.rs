//! PostgreSQL storage adapter.
//!
//! This module implements the repository traits defined in `gavel-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool, migrations and purge
//! - [`PgRepositories`] - Composite repository implementing `Repositories` trait
//! - Individual repos: [`PgParamsRepository`], [`PgGovernanceRepository`]
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_indexer(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let encoding = Arc::new(gavel_cosmos::make_encoding_config());
//! let repositories = PgRepositories::new(Arc::new(db), encoding)
//!     .with_vote_policy(VotePolicy::LastVoteWins);
//! ```

mod database;
mod gov_repo;
mod helpers;
mod params_repo;

pub use database::{Database, DatabaseConfig, PurgeStats};
pub use gov_repo::PgGovernanceRepository;
pub use params_repo::PgParamsRepository;

use std::sync::Arc;

use gavel_core::codec::EncodingConfig;
use gavel_core::ports::{GovernanceRepository, ParamsRepository, Repositories, VotePolicy};

// =============================================================================
// Composite Repository
// =============================================================================

/// Aggregated PostgreSQL repositories implementing the `Repositories` trait.
pub struct PgRepositories {
    db: Arc<Database>,
    params: PgParamsRepository,
    governance: PgGovernanceRepository,
}

impl PgRepositories {
    /// Create a new repository aggregate from a database connection.
    ///
    /// `encoding` decodes proposal content on reads and must know every
    /// content kind the chain can produce.
    pub fn new(db: Arc<Database>, encoding: Arc<EncodingConfig>) -> Self {
        let pool = db.pool().clone();
        Self {
            params: PgParamsRepository::new(pool.clone()),
            governance: PgGovernanceRepository::new(pool, encoding),
            db,
        }
    }

    /// Set the vote conflict policy.
    pub fn with_vote_policy(mut self, policy: VotePolicy) -> Self {
        self.governance = self.governance.with_vote_policy(policy);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Repositories for PgRepositories {
    fn params(&self) -> &dyn ParamsRepository {
        &self.params
    }

    fn governance(&self) -> &dyn GovernanceRepository {
        &self.governance
    }
}
