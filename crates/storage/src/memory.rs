//! In-memory storage adapter.
//!
//! Mirrors the PostgreSQL adapter: same natural keys, same conflict rules,
//! same height guards, content stored in its encoded JSON form and decoded
//! on read, all-or-nothing batches, and a missing parent proposal rejected
//! like a foreign key. Each write validates and encodes its whole input
//! before taking the write lock.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use gavel_core::codec::EncodingConfig;
use gavel_core::error::{StorageError, StorageResult};
use gavel_core::metrics::{record_rows_written, record_stale_write};
use gavel_core::models::{
    Coin, Deposit, EMoneyGasPrices, GovParams, Height, InterchainStakingParams, Proposal,
    ProposalStatus, ProposalUpdate, TallyResult, Vote, VoteOption,
};
use gavel_core::ports::{GovernanceRepository, ParamsRepository, Repositories, VotePolicy};

/// Stored form of a proposal row.
#[derive(Debug, Clone)]
struct ProposalRecord {
    content: Value,
    proposer: String,
    proposal_route: String,
    proposal_type: String,
    status: ProposalStatus,
    submit_time: DateTime<Utc>,
    deposit_end_time: DateTime<Utc>,
    voting_start_time: Option<DateTime<Utc>>,
    voting_end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    gov_params: Option<GovParams>,
    interchain_staking_params: Option<InterchainStakingParams>,
    emoney_gas_prices: Option<EMoneyGasPrices>,
    proposals: BTreeMap<u64, ProposalRecord>,
    /// Keyed `(proposal_id, height, depositor)` so iteration follows list order.
    deposits: BTreeMap<(u64, Height, String), Vec<Coin>>,
    votes: BTreeMap<(u64, String), (VoteOption, Height)>,
    tallies: BTreeMap<u64, TallyResult>,
}

impl MemoryState {
    fn ensure_proposals_exist(
        &self,
        ids: impl IntoIterator<Item = u64>,
        table: &str,
    ) -> StorageResult<()> {
        for id in ids {
            if !self.proposals.contains_key(&id) {
                return Err(StorageError::QueryError(format!(
                    "insert into {table} violates foreign key: proposal {id} does not exist"
                )));
            }
        }
        Ok(())
    }
}

/// Replace `slot` unless it holds a row with a greater height.
///
/// Returns `false` when the write was suppressed.
fn put_guarded<T: Clone>(
    slot: &mut Option<T>,
    incoming: &T,
    height: impl Fn(&T) -> Height,
) -> bool {
    match slot {
        Some(current) if height(current) > height(incoming) => false,
        _ => {
            *slot = Some(incoming.clone());
            true
        }
    }
}

/// Repository set backed by process memory.
pub struct MemoryRepositories {
    state: RwLock<MemoryState>,
    encoding: Arc<EncodingConfig>,
    vote_policy: VotePolicy,
}

impl MemoryRepositories {
    pub fn new(encoding: Arc<EncodingConfig>) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            encoding,
            vote_policy: VotePolicy::default(),
        }
    }

    /// Set the vote conflict policy.
    pub fn with_vote_policy(mut self, policy: VotePolicy) -> Self {
        self.vote_policy = policy;
        self
    }

    fn stale(entity: &'static str, height: Height) {
        debug!(entity, height, "Stale write ignored by height guard");
        record_stale_write(entity);
    }
}

impl Repositories for MemoryRepositories {
    fn params(&self) -> &dyn ParamsRepository {
        self
    }

    fn governance(&self) -> &dyn GovernanceRepository {
        self
    }
}

// =============================================================================
// Parameters
// =============================================================================

#[async_trait]
impl ParamsRepository for MemoryRepositories {
    async fn save_gov_params(&self, params: &GovParams) -> StorageResult<()> {
        let mut state = self.state.write().await;
        record_rows_written("gov_params", 1);
        if !put_guarded(&mut state.gov_params, params, |p| p.height) {
            Self::stale("gov_params", params.height);
        }
        Ok(())
    }

    async fn get_gov_params(&self) -> StorageResult<Option<GovParams>> {
        Ok(self.state.read().await.gov_params.clone())
    }

    async fn save_interchain_staking_params(
        &self,
        params: &InterchainStakingParams,
    ) -> StorageResult<()> {
        let mut state = self.state.write().await;
        record_rows_written("interchain_staking_params", 1);
        if !put_guarded(&mut state.interchain_staking_params, params, |p| p.height) {
            Self::stale("interchain_staking_params", params.height);
        }
        Ok(())
    }

    async fn get_interchain_staking_params(&self) -> StorageResult<Option<InterchainStakingParams>> {
        Ok(self.state.read().await.interchain_staking_params.clone())
    }

    async fn save_emoney_gas_prices(&self, prices: &EMoneyGasPrices) -> StorageResult<()> {
        let mut state = self.state.write().await;
        record_rows_written("emoney_gas_prices", 1);
        if !put_guarded(&mut state.emoney_gas_prices, prices, |p| p.height) {
            Self::stale("emoney_gas_prices", prices.height);
        }
        Ok(())
    }

    async fn get_emoney_gas_prices(&self) -> StorageResult<Option<EMoneyGasPrices>> {
        Ok(self.state.read().await.emoney_gas_prices.clone())
    }
}

// =============================================================================
// Governance
// =============================================================================

#[async_trait]
impl GovernanceRepository for MemoryRepositories {
    async fn save_proposals(&self, proposals: &[Proposal]) -> StorageResult<()> {
        if proposals.is_empty() {
            return Ok(());
        }

        let mut records = Vec::with_capacity(proposals.len());
        for p in proposals {
            records.push((
                p.proposal_id,
                ProposalRecord {
                    content: self.encoding.marshal_content(p.content.as_ref())?,
                    proposer: p.proposer.clone(),
                    proposal_route: p.proposal_route.clone(),
                    proposal_type: p.proposal_type.clone(),
                    status: p.status,
                    submit_time: p.submit_time,
                    deposit_end_time: p.deposit_end_time,
                    voting_start_time: p.voting_start_time,
                    voting_end_time: p.voting_end_time,
                },
            ));
        }

        let mut state = self.state.write().await;
        for (id, record) in records {
            state.proposals.entry(id).or_insert(record);
        }
        record_rows_written("proposal", proposals.len());
        Ok(())
    }

    async fn update_proposal(&self, update: &ProposalUpdate) -> StorageResult<()> {
        let mut state = self.state.write().await;
        match state.proposals.get_mut(&update.proposal_id) {
            Some(record) => {
                record.status = update.status;
                record.voting_start_time = update.voting_start_time;
                record.voting_end_time = update.voting_end_time;
            }
            None => debug!(
                proposal_id = update.proposal_id,
                "Status update matched no proposal"
            ),
        }
        Ok(())
    }

    async fn get_proposal(&self, id: u64) -> StorageResult<Option<Proposal>> {
        let record = match self.state.read().await.proposals.get(&id) {
            Some(record) => record.clone(),
            None => return Ok(None),
        };

        Ok(Some(Proposal {
            proposal_id: id,
            content: self.encoding.unmarshal_content(record.content)?,
            proposal_route: record.proposal_route,
            proposal_type: record.proposal_type,
            status: record.status,
            submit_time: record.submit_time,
            deposit_end_time: record.deposit_end_time,
            voting_start_time: record.voting_start_time,
            voting_end_time: record.voting_end_time,
            proposer: record.proposer,
        }))
    }

    async fn get_open_proposal_ids(&self) -> StorageResult<Vec<u64>> {
        let state = self.state.read().await;
        Ok(state
            .proposals
            .iter()
            .filter(|(_, record)| record.status.is_open())
            .map(|(id, _)| *id)
            .collect())
    }

    async fn save_deposits(&self, deposits: &[Deposit]) -> StorageResult<()> {
        if deposits.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        state.ensure_proposals_exist(deposits.iter().map(|d| d.proposal_id), "proposal_deposit")?;

        for deposit in deposits {
            state
                .deposits
                .entry((deposit.proposal_id, deposit.height, deposit.depositor.clone()))
                .or_insert_with(|| deposit.amount.clone());
        }
        record_rows_written("deposit", deposits.len());
        Ok(())
    }

    async fn list_deposits(&self, proposal_id: u64) -> StorageResult<Vec<Deposit>> {
        let state = self.state.read().await;
        Ok(state
            .deposits
            .iter()
            .filter(|((id, _, _), _)| *id == proposal_id)
            .map(|((id, height, depositor), amount)| Deposit {
                proposal_id: *id,
                depositor: depositor.clone(),
                amount: amount.clone(),
                height: *height,
            })
            .collect())
    }

    async fn save_votes(&self, votes: &[Vote]) -> StorageResult<()> {
        if votes.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        state.ensure_proposals_exist(votes.iter().map(|v| v.proposal_id), "proposal_vote")?;

        for vote in votes {
            match state.votes.entry((vote.proposal_id, vote.voter.clone())) {
                Entry::Vacant(slot) => {
                    slot.insert((vote.option, vote.height));
                }
                Entry::Occupied(mut slot) => {
                    if self.vote_policy == VotePolicy::LastVoteWins && vote.height >= slot.get().1 {
                        slot.insert((vote.option, vote.height));
                    }
                }
            }
        }
        record_rows_written("vote", votes.len());
        Ok(())
    }

    async fn list_votes(&self, proposal_id: u64) -> StorageResult<Vec<Vote>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .iter()
            .filter(|((id, _), _)| *id == proposal_id)
            .map(|((id, voter), (option, height))| Vote {
                proposal_id: *id,
                voter: voter.clone(),
                option: *option,
                height: *height,
            })
            .collect())
    }

    async fn save_tally_results(&self, tallies: &[TallyResult]) -> StorageResult<()> {
        if tallies.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        state.ensure_proposals_exist(
            tallies.iter().map(|t| t.proposal_id),
            "proposal_tally_result",
        )?;

        for tally in tallies {
            let mut slot = state.tallies.remove(&tally.proposal_id);
            if !put_guarded(&mut slot, tally, |t| t.height) {
                Self::stale("tally_result", tally.height);
            }
            if let Some(stored) = slot {
                state.tallies.insert(tally.proposal_id, stored);
            }
        }
        record_rows_written("tally_result", tallies.len());
        Ok(())
    }

    async fn get_tally_result(&self, proposal_id: u64) -> StorageResult<Option<TallyResult>> {
        Ok(self.state.read().await.tallies.get(&proposal_id).cloned())
    }
}
