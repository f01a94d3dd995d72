//! Gavel - operator CLI for the governance projection database.
//!
//! # Usage
//!
//! ```bash
//! # Apply migrations
//! gavel migrate
//!
//! # Show what has been projected so far
//! DATABASE_URL=postgres://localhost/gavel gavel status
//!
//! # Wipe projected data, keep the schema
//! gavel purge -y
//! ```

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use gavel_core::metrics::init_metrics;
use gavel_core::ports::{Repositories, VotePolicy};
use gavel_cosmos::make_encoding_config;
use gavel_storage::{Database, DatabaseConfig, PgRepositories};

/// Gavel CLI - governance indexer database tooling.
#[derive(Parser, Debug)]
#[command(name = "gavel")]
#[command(about = "Gavel - governance state projection for Cosmos SDK chains")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost/gavel")]
    database_url: String,

    /// Prometheus metrics port. Metrics are disabled when unset.
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Vote conflict policy: keep-first or last-vote-wins.
    #[arg(long, env = "VOTE_POLICY", default_value = "keep-first")]
    vote_policy: VotePolicy,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run database migrations and exit.
    Migrate,

    /// Print the stored parameter heights and open proposals.
    Status,

    /// Remove all projected data. Schema and migrations are preserved.
    Purge {
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    if let Some(port) = cli.metrics_port {
        install_metrics(port);
    }

    debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");

    let db = Database::connect(&DatabaseConfig::for_cli(&cli.database_url))
        .await
        .context("Failed to connect to database")?;

    let result = match cli.command {
        Command::Migrate => handle_migrate(&db).await,
        Command::Status => {
            let db = Arc::new(db.clone());
            let repositories = PgRepositories::new(db, Arc::new(make_encoding_config()))
                .with_vote_policy(cli.vote_policy);
            handle_status(&repositories, cli.vote_policy).await
        }
        Command::Purge { yes } => handle_purge(&db, yes).await,
    };

    db.close().await;
    result
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Start the Prometheus exporter. Failures are logged, never fatal.
fn install_metrics(port: u16) {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            init_metrics();
            info!("📊 Metrics:  http://localhost:{}/metrics", port);
        }
        Err(e) => warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e),
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

async fn handle_migrate(db: &Database) -> Result<()> {
    info!("🗄️  Running migrations...");
    db.migrate().await.context("Failed to run migrations")?;
    info!("✅ Database ready (migrations applied)");
    Ok(())
}

async fn handle_status(repositories: &PgRepositories, vote_policy: VotePolicy) -> Result<()> {
    if !repositories.database().is_healthy().await {
        anyhow::bail!("Database is not reachable");
    }

    let params = repositories.params();
    let governance = repositories.governance();

    info!("🗳️  Gavel status (vote policy: {})", vote_policy);

    match params.get_gov_params().await.context("Failed to read gov params")? {
        Some(gov) => info!(
            "   ⚖️  Gov params:  height {} (quorum {}, threshold {})",
            gov.height, gov.tally_params.quorum, gov.tally_params.threshold
        ),
        None => info!("   ⚖️  Gov params:  not indexed yet"),
    }

    match params
        .get_interchain_staking_params()
        .await
        .context("Failed to read interchain staking params")?
    {
        Some(ics) => info!("   🔗 ICS params:  height {}", ics.height),
        None => info!("   🔗 ICS params:  not indexed yet"),
    }

    match params
        .get_emoney_gas_prices()
        .await
        .context("Failed to read gas prices")?
    {
        Some(prices) => info!(
            "   ⛽ Gas prices:  height {} ({} denoms)",
            prices.height,
            prices.gas_prices.len()
        ),
        None => info!("   ⛽ Gas prices:  not indexed yet"),
    }

    let open = governance
        .get_open_proposal_ids()
        .await
        .context("Failed to list open proposals")?;
    info!("   📜 Open proposals: {}", open.len());

    for id in open {
        let Some(proposal) = governance
            .get_proposal(id)
            .await
            .with_context(|| format!("Failed to read proposal {id}"))?
        else {
            continue;
        };
        let tally = governance
            .get_tally_result(id)
            .await
            .with_context(|| format!("Failed to read tally of proposal {id}"))?;

        match tally {
            Some(t) => info!(
                "      #{} [{}] {} (yes {}, no {}, height {})",
                id, proposal.status, proposal.title(), t.yes, t.no, t.height
            ),
            None => info!("      #{} [{}] {}", id, proposal.status, proposal.title()),
        }
    }

    Ok(())
}

/// Handle the purge command.
async fn handle_purge(db: &Database, skip_confirmation: bool) -> Result<()> {
    warn!("⚠️  PURGE MODE: This will delete ALL projected data!");
    warn!("   - All proposals, deposits, votes and tally results");
    warn!("   - Governance, interchain-staking and gas-price parameters");
    warn!("   - Schema and migrations will be preserved");

    if !skip_confirmation {
        print!("\n🔴 Are you sure you want to purge all data? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            info!("❌ Purge cancelled");
            return Ok(());
        }
    }

    info!("🗑️  Purging database...");
    let stats = db.purge().await.context("Failed to purge database")?;

    info!("✅ Database purged successfully");
    info!("   📜 Proposals removed: {}", stats.proposals_removed);
    info!("   💰 Deposits removed: {}", stats.deposits_removed);
    info!("   🗳️  Votes removed: {}", stats.votes_removed);
    info!("   📊 Tally results removed: {}", stats.tally_results_removed);
    info!("   ⚖️  Parameter rows removed: {}", stats.params_removed);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://gavel:secret@db:5432/gavel"),
            "postgres://gavel:****@db:5432/gavel"
        );
        assert_eq!(mask_password("not a url"), "not a url");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["gavel", "--vote-policy", "last-vote-wins", "purge", "-y"])
            .unwrap();
        assert_eq!(cli.vote_policy, VotePolicy::LastVoteWins);
        assert!(matches!(cli.command, Command::Purge { yes: true }));

        let cli = Cli::try_parse_from(["gavel", "status"]).unwrap();
        assert_eq!(cli.vote_policy, VotePolicy::KeepFirst);
        assert!(cli.metrics_port.is_none());
    }
}
