//! Governance facts: proposals, deposits, votes and tally snapshots.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::ProposalContent;
use crate::error::DomainError;

use super::{Coin, Height};

// =============================================================================
// Proposal status
// =============================================================================

/// Lifecycle status of a proposal, spelled as the chain spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[serde(rename = "PROPOSAL_STATUS_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "PROPOSAL_STATUS_DEPOSIT_PERIOD")]
    DepositPeriod,
    #[serde(rename = "PROPOSAL_STATUS_VOTING_PERIOD")]
    VotingPeriod,
    #[serde(rename = "PROPOSAL_STATUS_PASSED")]
    Passed,
    #[serde(rename = "PROPOSAL_STATUS_REJECTED")]
    Rejected,
    #[serde(rename = "PROPOSAL_STATUS_FAILED")]
    Failed,
    /// Proposal could not be read back from the chain.
    #[serde(rename = "PROPOSAL_STATUS_INVALID")]
    Invalid,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "PROPOSAL_STATUS_UNSPECIFIED",
            Self::DepositPeriod => "PROPOSAL_STATUS_DEPOSIT_PERIOD",
            Self::VotingPeriod => "PROPOSAL_STATUS_VOTING_PERIOD",
            Self::Passed => "PROPOSAL_STATUS_PASSED",
            Self::Rejected => "PROPOSAL_STATUS_REJECTED",
            Self::Failed => "PROPOSAL_STATUS_FAILED",
            Self::Invalid => "PROPOSAL_STATUS_INVALID",
        }
    }

    /// Whether the proposal still accepts deposits or votes.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::DepositPeriod | Self::VotingPeriod)
    }

    /// Statuses returned by the open-proposal index.
    pub const OPEN: [ProposalStatus; 2] = [Self::DepositPeriod, Self::VotingPeriod];
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROPOSAL_STATUS_UNSPECIFIED" => Ok(Self::Unspecified),
            "PROPOSAL_STATUS_DEPOSIT_PERIOD" => Ok(Self::DepositPeriod),
            "PROPOSAL_STATUS_VOTING_PERIOD" => Ok(Self::VotingPeriod),
            "PROPOSAL_STATUS_PASSED" => Ok(Self::Passed),
            "PROPOSAL_STATUS_REJECTED" => Ok(Self::Rejected),
            "PROPOSAL_STATUS_FAILED" => Ok(Self::Failed),
            "PROPOSAL_STATUS_INVALID" => Ok(Self::Invalid),
            other => Err(DomainError::UnknownEnumValue {
                field: "proposal status",
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Vote option
// =============================================================================

/// Option chosen by a voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOption {
    #[serde(rename = "VOTE_OPTION_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "VOTE_OPTION_YES")]
    Yes,
    #[serde(rename = "VOTE_OPTION_ABSTAIN")]
    Abstain,
    #[serde(rename = "VOTE_OPTION_NO")]
    No,
    #[serde(rename = "VOTE_OPTION_NO_WITH_VETO")]
    NoWithVeto,
}

impl VoteOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "VOTE_OPTION_UNSPECIFIED",
            Self::Yes => "VOTE_OPTION_YES",
            Self::Abstain => "VOTE_OPTION_ABSTAIN",
            Self::No => "VOTE_OPTION_NO",
            Self::NoWithVeto => "VOTE_OPTION_NO_WITH_VETO",
        }
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteOption {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VOTE_OPTION_UNSPECIFIED" => Ok(Self::Unspecified),
            "VOTE_OPTION_YES" => Ok(Self::Yes),
            "VOTE_OPTION_ABSTAIN" => Ok(Self::Abstain),
            "VOTE_OPTION_NO" => Ok(Self::No),
            "VOTE_OPTION_NO_WITH_VETO" => Ok(Self::NoWithVeto),
            other => Err(DomainError::UnknownEnumValue {
                field: "vote option",
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Proposal
// =============================================================================

/// A governance proposal as submitted on-chain.
///
/// Title and description are not stored separately: they are read from
/// the content, which is the single source of truth.
#[derive(Debug, Clone)]
pub struct Proposal {
    /// Chain-assigned proposal identifier.
    pub proposal_id: u64,
    /// Router key of the module handling the proposal (e.g. `"gov"`).
    pub proposal_route: String,
    /// Proposal type tag (e.g. `"Text"`).
    pub proposal_type: String,
    /// Variant payload.
    pub content: Arc<dyn ProposalContent>,
    pub status: ProposalStatus,
    pub submit_time: DateTime<Utc>,
    pub deposit_end_time: DateTime<Utc>,
    /// Unset until the proposal enters the voting period.
    pub voting_start_time: Option<DateTime<Utc>>,
    pub voting_end_time: Option<DateTime<Utc>>,
    /// Bech32 address of the submitter.
    pub proposer: String,
}

impl Proposal {
    pub fn title(&self) -> &str {
        self.content.title()
    }

    pub fn description(&self) -> &str {
        self.content.description()
    }
}

/// Status transition applied to an existing proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalUpdate {
    pub proposal_id: u64,
    pub status: ProposalStatus,
    pub voting_start_time: Option<DateTime<Utc>>,
    pub voting_end_time: Option<DateTime<Utc>>,
}

// =============================================================================
// Deposits, votes, tallies
// =============================================================================

/// One deposit event. Natural key: `(proposal_id, depositor, height)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub proposal_id: u64,
    pub depositor: String,
    pub amount: Vec<Coin>,
    pub height: Height,
}

/// A vote cast on a proposal. Natural key: `(proposal_id, voter)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: u64,
    pub voter: String,
    pub option: VoteOption,
    pub height: Height,
}

/// Tally snapshot of a proposal. One current row per proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub proposal_id: u64,
    pub yes: String,
    pub abstain: String,
    pub no: String,
    pub no_with_veto: String,
    pub height: Height,
}
