//! Cosmos SDK messages relevant to address resolution.
//!
//! Only the fields carrying addresses (and the amounts needed to make the
//! types useful to callers) are modelled.

use serde::{Deserialize, Serialize};

use gavel_core::codec::TypeUrl;
use gavel_core::models::{Coin, VoteOption};

macro_rules! type_url {
    ($($name:ident => $url:literal),* $(,)?) => {
        $(
            impl TypeUrl for $name {
                const TYPE_URL: &'static str = $url;
            }
        )*
    };
}

// =============================================================================
// x/bank
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

/// One side of a multi-send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCoins {
    pub address: String,
    pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMultiSend {
    pub inputs: Vec<IoCoins>,
    pub outputs: Vec<IoCoins>,
}

// =============================================================================
// x/staking
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateValidator {
    pub delegator_address: String,
    pub validator_address: String,
    pub value: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgEditValidator {
    pub validator_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUndelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBeginRedelegate {
    pub delegator_address: String,
    pub validator_src_address: String,
    pub validator_dst_address: String,
    pub amount: Coin,
}

/// Added in SDK v0.46; unknown to the generic resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCancelUnbondingDelegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
    pub creation_height: i64,
}

// =============================================================================
// x/gov
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgSubmitProposal {
    /// Type-tagged content as rendered by the codec.
    pub content: serde_json::Value,
    pub initial_deposit: Vec<Coin>,
    pub proposer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeposit {
    pub proposal_id: u64,
    pub depositor: String,
    pub amount: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    pub proposal_id: u64,
    pub voter: String,
    pub option: VoteOption,
}

// =============================================================================
// x/distribution
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetWithdrawAddress {
    pub delegator_address: String,
    pub withdraw_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawDelegatorReward {
    pub delegator_address: String,
    pub validator_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawValidatorCommission {
    pub validator_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgFundCommunityPool {
    pub amount: Vec<Coin>,
    pub depositor: String,
}

// =============================================================================
// x/slashing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUnjail {
    pub validator_addr: String,
}

type_url! {
    MsgSend => "/cosmos.bank.v1beta1.MsgSend",
    MsgMultiSend => "/cosmos.bank.v1beta1.MsgMultiSend",
    MsgCreateValidator => "/cosmos.staking.v1beta1.MsgCreateValidator",
    MsgEditValidator => "/cosmos.staking.v1beta1.MsgEditValidator",
    MsgDelegate => "/cosmos.staking.v1beta1.MsgDelegate",
    MsgUndelegate => "/cosmos.staking.v1beta1.MsgUndelegate",
    MsgBeginRedelegate => "/cosmos.staking.v1beta1.MsgBeginRedelegate",
    MsgCancelUnbondingDelegation => "/cosmos.staking.v1beta1.MsgCancelUnbondingDelegation",
    MsgSubmitProposal => "/cosmos.gov.v1beta1.MsgSubmitProposal",
    MsgDeposit => "/cosmos.gov.v1beta1.MsgDeposit",
    MsgVote => "/cosmos.gov.v1beta1.MsgVote",
    MsgSetWithdrawAddress => "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress",
    MsgWithdrawDelegatorReward => "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward",
    MsgWithdrawValidatorCommission => "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission",
    MsgFundCommunityPool => "/cosmos.distribution.v1beta1.MsgFundCommunityPool",
    MsgUnjail => "/cosmos.slashing.v1beta1.MsgUnjail",
}
