//! PostgreSQL database connection and configuration.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, instrument};

use gavel_core::error::{StorageError, StorageResult};

const DEFAULT_URL: &str = "postgres://localhost/gavel";

/// Projection tables cleared by [`Database::purge`], children first.
const PROJECTION_TABLES: [&str; 7] = [
    "proposal_tally_result",
    "proposal_vote",
    "proposal_deposit",
    "proposal",
    "gov_params",
    "interchain_staking_params",
    "emoney_gas_prices",
];

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Connection acquisition timeout.
    pub acquire_timeout: Duration,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
    /// Maximum connection lifetime.
    pub max_lifetime: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl DatabaseConfig {
    /// Create config from the `DATABASE_URL` environment variable.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_URL.to_string()),
            ..Default::default()
        }
    }

    /// Create a configuration sized for the ingestion pipeline.
    pub fn for_indexer(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 10,
            min_connections: 3,
            ..Default::default()
        }
    }

    /// Create a configuration for short-lived operator commands.
    pub fn for_cli(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 2,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database with the given configuration.
    #[instrument(skip_all)]
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        debug!(
            max_conn = config.max_connections,
            min_conn = config.min_connections,
            "Creating connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect(&config.url)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        debug!("Connection pool created");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> StorageResult<()> {
        debug!("Running migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::MigrationError(e.to_string()))?;

        debug!("Migrations completed");

        Ok(())
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Remove all projected data, keeping the schema and migration history.
    ///
    /// Counts and truncation run in one transaction.
    #[instrument(skip(self))]
    pub async fn purge(&self) -> StorageResult<PurgeStats> {
        debug!("Starting database purge");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let mut counts = [0u64; PROJECTION_TABLES.len()];
        for (count, table) in counts.iter_mut().zip(PROJECTION_TABLES) {
            let (rows,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| StorageError::QueryError(e.to_string()))?;
            *count = rows as u64;
        }

        sqlx::query(&format!("TRUNCATE {}", PROJECTION_TABLES.join(", ")))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let [tallies, votes, deposits, proposals, gov, ics, gas] = counts;
        let stats = PurgeStats {
            proposals_removed: proposals,
            deposits_removed: deposits,
            votes_removed: votes,
            tally_results_removed: tallies,
            params_removed: gov + ics + gas,
        };

        debug!(?stats, "Database purge completed");

        Ok(stats)
    }
}

/// Statistics from a database purge operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Number of proposals removed.
    pub proposals_removed: u64,
    /// Number of deposits removed.
    pub deposits_removed: u64,
    /// Number of votes removed.
    pub votes_removed: u64,
    /// Number of tally snapshots removed.
    pub tally_results_removed: u64,
    /// Number of singleton parameter rows removed.
    pub params_removed: u64,
}
