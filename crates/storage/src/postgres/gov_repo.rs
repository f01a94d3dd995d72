//! Governance repository implementation for PostgreSQL.
//!
//! Every batch write runs in one transaction. Batches larger than the bind
//! parameter limit are split into several multi-row `INSERT`s inside that
//! same transaction, so a call is applied completely or not at all.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};

use gavel_core::codec::EncodingConfig;
use gavel_core::error::{StorageError, StorageResult};
use gavel_core::metrics::{record_rows_written, record_stale_write};
use gavel_core::models::{
    Deposit, Height, Proposal, ProposalStatus, ProposalUpdate, TallyResult, Vote, VoteOption,
};
use gavel_core::ports::{GovernanceRepository, VotePolicy};

use super::helpers::{
    DbCoin, coins_to_db, height_guarded_conflict, latest_by_key, rows_per_statement,
    skip_conflict, to_db_int,
};

const PROPOSAL_COLUMNS: &str = "id, title, description, content, proposer_address, \
     proposal_route, proposal_type, status, submit_time, deposit_end_time, \
     voting_start_time, voting_end_time";
const PROPOSAL_COLUMN_COUNT: usize = 12;

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: i64,
    content: Value,
    proposer_address: String,
    proposal_route: String,
    proposal_type: String,
    status: String,
    submit_time: DateTime<Utc>,
    deposit_end_time: DateTime<Utc>,
    voting_start_time: Option<DateTime<Utc>>,
    voting_end_time: Option<DateTime<Utc>>,
}

impl ProposalRow {
    fn into_proposal(self, encoding: &EncodingConfig) -> StorageResult<Proposal> {
        Ok(Proposal {
            proposal_id: self.id as u64,
            proposal_route: self.proposal_route,
            proposal_type: self.proposal_type,
            content: encoding.unmarshal_content(self.content)?,
            status: self.status.parse::<ProposalStatus>()?,
            submit_time: self.submit_time,
            deposit_end_time: self.deposit_end_time,
            voting_start_time: self.voting_start_time,
            voting_end_time: self.voting_end_time,
            proposer: self.proposer_address,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DepositRow {
    proposal_id: i64,
    depositor_address: String,
    amount: Vec<DbCoin>,
    height: i64,
}

impl DepositRow {
    fn into_deposit(self) -> Deposit {
        Deposit {
            proposal_id: self.proposal_id as u64,
            depositor: self.depositor_address,
            amount: self.amount.into_iter().map(Into::into).collect(),
            height: self.height as Height,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    proposal_id: i64,
    voter_address: String,
    option: String,
    height: i64,
}

impl VoteRow {
    fn into_vote(self) -> StorageResult<Vote> {
        Ok(Vote {
            proposal_id: self.proposal_id as u64,
            voter: self.voter_address,
            option: self.option.parse::<VoteOption>()?,
            height: self.height as Height,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TallyRow {
    proposal_id: i64,
    yes: String,
    abstain: String,
    no: String,
    no_with_veto: String,
    height: i64,
}

impl TallyRow {
    fn into_tally(self) -> TallyResult {
        TallyResult {
            proposal_id: self.proposal_id as u64,
            yes: self.yes,
            abstain: self.abstain,
            no: self.no,
            no_with_veto: self.no_with_veto,
            height: self.height as Height,
        }
    }
}

/// A proposal with its content already rendered for storage.
struct EncodedProposal<'a> {
    proposal: &'a Proposal,
    id: i64,
    content: Value,
}

/// A child row whose `proposal_id` and `height` fit in `BIGINT`.
struct CheckedRow<'a, T> {
    row: &'a T,
    proposal_id: i64,
    height: i64,
}

/// Convert the integer columns of a whole batch before any statement runs.
fn check_rows<'a, T, I, F>(rows: I, columns: F) -> StorageResult<Vec<CheckedRow<'a, T>>>
where
    I: IntoIterator<Item = &'a T>,
    T: 'a,
    F: Fn(&T) -> (u64, Height),
{
    let mut checked = Vec::new();
    for row in rows {
        let (proposal_id, height) = columns(row);
        checked.push(CheckedRow {
            row,
            proposal_id: to_db_int(proposal_id, "proposal_id")?,
            height: to_db_int(height, "height")?,
        });
    }
    Ok(checked)
}

// =============================================================================
// Repository Implementation
// =============================================================================

/// PostgreSQL implementation of GovernanceRepository.
pub struct PgGovernanceRepository {
    pool: PgPool,
    encoding: Arc<EncodingConfig>,
    vote_policy: VotePolicy,
}

impl PgGovernanceRepository {
    pub fn new(pool: PgPool, encoding: Arc<EncodingConfig>) -> Self {
        Self {
            pool,
            encoding,
            vote_policy: VotePolicy::default(),
        }
    }

    /// Set the vote conflict policy.
    pub fn with_vote_policy(mut self, policy: VotePolicy) -> Self {
        self.vote_policy = policy;
        self
    }

    /// Statement suffix resolving `(proposal_id, voter_address)` conflicts.
    fn vote_conflict_clause(&self) -> String {
        let key = ["proposal_id", "voter_address"];
        match self.vote_policy {
            VotePolicy::KeepFirst => skip_conflict(&key),
            VotePolicy::LastVoteWins => height_guarded_conflict("proposal_vote", &key, &["option"]),
        }
    }
}

#[async_trait]
impl GovernanceRepository for PgGovernanceRepository {
    #[instrument(skip_all, fields(count = proposals.len()))]
    async fn save_proposals(&self, proposals: &[Proposal]) -> StorageResult<()> {
        if proposals.is_empty() {
            return Ok(());
        }

        // Encode everything before the first statement runs.
        let mut encoded = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            encoded.push(EncodedProposal {
                proposal,
                id: to_db_int(proposal.proposal_id, "proposal_id")?,
                content: self.encoding.marshal_content(proposal.content.as_ref())?,
            });
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let mut inserted = 0;
        for chunk in encoded.chunks(rows_per_statement(PROPOSAL_COLUMN_COUNT)) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO proposal ({PROPOSAL_COLUMNS}) "));
            builder.push_values(chunk, |mut row, item| {
                let p = item.proposal;
                row.push_bind(item.id)
                    .push_bind(p.title())
                    .push_bind(p.description())
                    .push_bind(&item.content)
                    .push_bind(&p.proposer)
                    .push_bind(&p.proposal_route)
                    .push_bind(&p.proposal_type)
                    .push_bind(p.status.as_str())
                    .push_bind(p.submit_time)
                    .push_bind(p.deposit_end_time)
                    .push_bind(p.voting_start_time)
                    .push_bind(p.voting_end_time);
            });
            builder.push(skip_conflict(&["id"]));

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::QueryError(e.to_string()))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        record_rows_written("proposal", proposals.len());
        info!(
            submitted = proposals.len(),
            inserted,
            "Saved proposals"
        );
        Ok(())
    }

    #[instrument(skip_all, fields(proposal_id = update.proposal_id, status = %update.status))]
    async fn update_proposal(&self, update: &ProposalUpdate) -> StorageResult<()> {
        let id = to_db_int(update.proposal_id, "proposal_id")?;
        let result = sqlx::query(
            r#"
            UPDATE proposal
            SET status = $1, voting_start_time = $2, voting_end_time = $3
            WHERE id = $4
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.voting_start_time)
        .bind(update.voting_end_time)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            debug!("Status update matched no proposal");
        }
        Ok(())
    }

    async fn get_proposal(&self, id: u64) -> StorageResult<Option<Proposal>> {
        let id = to_db_int(id, "proposal_id")?;
        let row = sqlx::query_as::<_, ProposalRow>(
            r#"
            SELECT id, content, proposer_address, proposal_route, proposal_type,
                   status, submit_time, deposit_end_time, voting_start_time, voting_end_time
            FROM proposal
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(|r| r.into_proposal(&self.encoding)).transpose()
    }

    async fn get_open_proposal_ids(&self) -> StorageResult<Vec<u64>> {
        let [deposit_period, voting_period] = ProposalStatus::OPEN;
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM proposal
            WHERE status = $1 OR status = $2
            ORDER BY id ASC
            "#,
        )
        .bind(deposit_period.as_str())
        .bind(voting_period.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| id as u64).collect())
    }

    #[instrument(skip_all, fields(count = deposits.len()))]
    async fn save_deposits(&self, deposits: &[Deposit]) -> StorageResult<()> {
        if deposits.is_empty() {
            return Ok(());
        }

        let rows = check_rows(deposits, |d: &Deposit| (d.proposal_id, d.height))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let mut inserted = 0;
        for chunk in rows.chunks(rows_per_statement(4)) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO proposal_deposit (proposal_id, depositor_address, amount, height) ",
            );
            builder.push_values(chunk, |mut row, checked| {
                let deposit = checked.row;
                row.push_bind(checked.proposal_id)
                    .push_bind(&deposit.depositor)
                    .push_bind(coins_to_db(&deposit.amount))
                    .push_bind(checked.height);
            });
            builder.push(skip_conflict(&["proposal_id", "depositor_address", "height"]));

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::QueryError(e.to_string()))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        record_rows_written("deposit", deposits.len());
        info!(submitted = deposits.len(), inserted, "Saved deposits");
        Ok(())
    }

    async fn list_deposits(&self, proposal_id: u64) -> StorageResult<Vec<Deposit>> {
        let proposal_id = to_db_int(proposal_id, "proposal_id")?;
        let rows = sqlx::query_as::<_, DepositRow>(
            r#"
            SELECT proposal_id, depositor_address, amount, height
            FROM proposal_deposit
            WHERE proposal_id = $1
            ORDER BY height ASC, depositor_address ASC
            "#,
        )
        .bind(proposal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(DepositRow::into_deposit).collect())
    }

    #[instrument(skip_all, fields(count = votes.len(), policy = %self.vote_policy))]
    async fn save_votes(&self, votes: &[Vote]) -> StorageResult<()> {
        if votes.is_empty() {
            return Ok(());
        }

        // An upsert cannot touch the same row twice in one statement.
        let latest: Vec<&Vote> = match self.vote_policy {
            VotePolicy::KeepFirst => votes.iter().collect(),
            VotePolicy::LastVoteWins => latest_by_key(
                votes,
                |v| (v.proposal_id, v.voter.clone()),
                |v| v.height,
            ),
        };
        let rows = check_rows(latest, |v: &Vote| (v.proposal_id, v.height))?;
        let conflict = self.vote_conflict_clause();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let mut applied = 0;
        for chunk in rows.chunks(rows_per_statement(4)) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO proposal_vote (proposal_id, voter_address, option, height) ",
            );
            builder.push_values(chunk, |mut row, checked| {
                let vote = checked.row;
                row.push_bind(checked.proposal_id)
                    .push_bind(&vote.voter)
                    .push_bind(vote.option.as_str())
                    .push_bind(checked.height);
            });
            builder.push(&conflict);

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::QueryError(e.to_string()))?;
            applied += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        record_rows_written("vote", votes.len());
        info!(submitted = votes.len(), applied, "Saved votes");
        Ok(())
    }

    async fn list_votes(&self, proposal_id: u64) -> StorageResult<Vec<Vote>> {
        let proposal_id = to_db_int(proposal_id, "proposal_id")?;
        let rows = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT proposal_id, voter_address, option, height
            FROM proposal_vote
            WHERE proposal_id = $1
            ORDER BY voter_address ASC
            "#,
        )
        .bind(proposal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        rows.into_iter().map(VoteRow::into_vote).collect()
    }

    #[instrument(skip_all, fields(count = tallies.len()))]
    async fn save_tally_results(&self, tallies: &[TallyResult]) -> StorageResult<()> {
        if tallies.is_empty() {
            return Ok(());
        }

        let latest = latest_by_key(tallies, |t| t.proposal_id, |t| t.height);
        let rows = check_rows(latest, |t: &TallyResult| (t.proposal_id, t.height))?;
        let conflict = height_guarded_conflict(
            "proposal_tally_result",
            &["proposal_id"],
            &["yes", "abstain", "no", "no_with_veto"],
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        let mut applied = 0;
        for chunk in rows.chunks(rows_per_statement(6)) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO proposal_tally_result \
                 (proposal_id, yes, abstain, no, no_with_veto, height) ",
            );
            builder.push_values(chunk, |mut row, checked| {
                let tally = checked.row;
                row.push_bind(checked.proposal_id)
                    .push_bind(&tally.yes)
                    .push_bind(&tally.abstain)
                    .push_bind(&tally.no)
                    .push_bind(&tally.no_with_veto)
                    .push_bind(checked.height);
            });
            builder.push(&conflict);

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::QueryError(e.to_string()))?;
            applied += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::TransactionError(e.to_string()))?;

        record_rows_written("tally_result", tallies.len());

        let stale = rows.len() as u64 - applied.min(rows.len() as u64);
        for _ in 0..stale {
            record_stale_write("tally_result");
        }
        if stale > 0 {
            debug!(stale, "Stale tally results ignored by height guard");
        }
        info!(submitted = tallies.len(), applied, "Saved tally results");
        Ok(())
    }

    async fn get_tally_result(&self, proposal_id: u64) -> StorageResult<Option<TallyResult>> {
        let proposal_id = to_db_int(proposal_id, "proposal_id")?;
        let row = sqlx::query_as::<_, TallyRow>(
            r#"
            SELECT proposal_id, yes, abstain, no, no_with_veto, height
            FROM proposal_tally_result
            WHERE proposal_id = $1
            "#,
        )
        .bind(proposal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.map(TallyRow::into_tally))
    }
}
