//! Port traits for the governance projection store.
//!
//! These traits define the storage interface used by the ingestion pipeline.
//! Implementations live in the infrastructure layer (`gavel-storage`).
//!
//! Every write is idempotent under replay: natural-key conflicts are skipped
//! and height-guarded rows never move backwards. A stale write returns
//! `Ok(())` exactly like an applied one.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{DomainError, StorageResult};
use crate::models::{
    Deposit, EMoneyGasPrices, GovParams, InterchainStakingParams, Proposal, ProposalUpdate,
    TallyResult, Vote,
};

// =============================================================================
// Vote policy
// =============================================================================

/// What a vote insert does when `(proposal_id, voter)` already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VotePolicy {
    /// Keep the stored vote; the new one is dropped.
    #[default]
    KeepFirst,
    /// Replace option and height when the incoming height is not older.
    LastVoteWins,
}

impl VotePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepFirst => "keep-first",
            Self::LastVoteWins => "last-vote-wins",
        }
    }
}

impl fmt::Display for VotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VotePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep-first" | "keep_first" => Ok(Self::KeepFirst),
            "last-vote-wins" | "last_vote_wins" => Ok(Self::LastVoteWins),
            _ => Err(DomainError::UnknownEnumValue {
                field: "vote policy",
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Repository Traits
// =============================================================================

/// Singleton parameter sets, one current row per category.
#[async_trait]
pub trait ParamsRepository: Send + Sync {
    /// Upsert governance params; ignored if older than the stored row.
    async fn save_gov_params(&self, params: &GovParams) -> StorageResult<()>;

    /// Get the current governance params, `None` if never written.
    async fn get_gov_params(&self) -> StorageResult<Option<GovParams>>;

    /// Upsert interchain-staking params; ignored if older than the stored row.
    async fn save_interchain_staking_params(
        &self,
        params: &InterchainStakingParams,
    ) -> StorageResult<()>;

    /// Get the current interchain-staking params.
    async fn get_interchain_staking_params(&self) -> StorageResult<Option<InterchainStakingParams>>;

    /// Upsert the gas price table; ignored if older than the stored row.
    async fn save_emoney_gas_prices(&self, prices: &EMoneyGasPrices) -> StorageResult<()>;

    /// Get the current gas price table.
    async fn get_emoney_gas_prices(&self) -> StorageResult<Option<EMoneyGasPrices>>;
}

/// Proposals and the facts attached to them.
#[async_trait]
pub trait GovernanceRepository: Send + Sync {
    /// Insert a batch of proposals. Existing ids are left untouched.
    async fn save_proposals(&self, proposals: &[Proposal]) -> StorageResult<()>;

    /// Apply a status transition. No height guard.
    async fn update_proposal(&self, update: &ProposalUpdate) -> StorageResult<()>;

    /// Get proposal by id, content decoded.
    async fn get_proposal(&self, id: u64) -> StorageResult<Option<Proposal>>;

    /// Ids of proposals in the deposit or voting period, ascending.
    async fn get_open_proposal_ids(&self) -> StorageResult<Vec<u64>>;

    /// Insert a batch of deposits. Duplicate `(proposal, depositor, height)` are skipped.
    async fn save_deposits(&self, deposits: &[Deposit]) -> StorageResult<()>;

    /// List deposits for a proposal, by height then depositor.
    async fn list_deposits(&self, proposal_id: u64) -> StorageResult<Vec<Deposit>>;

    /// Insert a batch of votes, resolving conflicts per the configured [`VotePolicy`].
    async fn save_votes(&self, votes: &[Vote]) -> StorageResult<()>;

    /// Insert a single vote.
    async fn save_vote(&self, vote: &Vote) -> StorageResult<()> {
        self.save_votes(std::slice::from_ref(vote)).await
    }

    /// List votes for a proposal, by voter.
    async fn list_votes(&self, proposal_id: u64) -> StorageResult<Vec<Vote>>;

    /// Upsert tally snapshots; each row is ignored if older than the stored one.
    async fn save_tally_results(&self, tallies: &[TallyResult]) -> StorageResult<()>;

    /// Get the current tally snapshot of a proposal.
    async fn get_tally_result(&self, proposal_id: u64) -> StorageResult<Option<TallyResult>>;
}

// =============================================================================
// Composite Repository
// =============================================================================

/// Combined repository access for the ingestion pipeline.
pub trait Repositories: Send + Sync {
    /// Access the parameter store.
    fn params(&self) -> &dyn ParamsRepository;

    /// Access the governance event store.
    fn governance(&self) -> &dyn GovernanceRepository;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_policy_parses_both_spellings() {
        assert_eq!("keep-first".parse::<VotePolicy>().unwrap(), VotePolicy::KeepFirst);
        assert_eq!(
            "LAST_VOTE_WINS".parse::<VotePolicy>().unwrap(),
            VotePolicy::LastVoteWins
        );
        assert!("newest".parse::<VotePolicy>().is_err());
    }

    #[test]
    fn default_vote_policy_keeps_first() {
        assert_eq!(VotePolicy::default(), VotePolicy::KeepFirst);
    }
}
