//! Address resolvers for Cosmos SDK messages.

use gavel_core::addresses::AddressDispatcher;
use gavel_core::codec::ProtocolMessage;

use crate::messages::*;

/// Try each listed message type in order; the first that matches
/// returns the addresses built by its closure.
macro_rules! match_message {
    ($message:expr, { $($ty:ty => |$msg:ident| $body:expr),* $(,)? }) => {{
        $(
            if let Some($msg) = $message.downcast_ref::<$ty>() {
                return Some($body);
            }
        )*
        None
    }};
}

/// Generic resolver for the messages of the standard SDK modules.
pub fn cosmos_message_addresses(message: &dyn ProtocolMessage) -> Option<Vec<String>> {
    match_message!(message, {
        MsgSend => |msg| vec![msg.from_address.clone(), msg.to_address.clone()],
        MsgMultiSend => |msg| msg
            .inputs
            .iter()
            .chain(&msg.outputs)
            .map(|io| io.address.clone())
            .collect(),
        MsgCreateValidator => |msg| vec![msg.delegator_address.clone(), msg.validator_address.clone()],
        MsgEditValidator => |msg| vec![msg.validator_address.clone()],
        MsgDelegate => |msg| vec![msg.delegator_address.clone(), msg.validator_address.clone()],
        MsgUndelegate => |msg| vec![msg.delegator_address.clone(), msg.validator_address.clone()],
        MsgBeginRedelegate => |msg| vec![
            msg.delegator_address.clone(),
            msg.validator_src_address.clone(),
            msg.validator_dst_address.clone(),
        ],
        MsgSubmitProposal => |msg| vec![msg.proposer.clone()],
        MsgDeposit => |msg| vec![msg.depositor.clone()],
        MsgVote => |msg| vec![msg.voter.clone()],
        MsgSetWithdrawAddress => |msg| vec![msg.delegator_address.clone(), msg.withdraw_address.clone()],
        MsgWithdrawDelegatorReward => |msg| vec![msg.delegator_address.clone(), msg.validator_address.clone()],
        MsgWithdrawValidatorCommission => |msg| vec![msg.validator_address.clone()],
        MsgFundCommunityPool => |msg| vec![msg.depositor.clone()],
        MsgUnjail => |msg| vec![msg.validator_addr.clone()],
    })
}

/// Staking messages the generic resolver does not know about.
pub fn missing_staking_message_addresses(message: &dyn ProtocolMessage) -> Option<Vec<String>> {
    match_message!(message, {
        MsgCancelUnbondingDelegation => |msg| vec![msg.delegator_address.clone(), msg.validator_address.clone()],
    })
}

/// Default chain: staking additions first, generic SDK resolver last.
pub fn default_address_dispatcher() -> AddressDispatcher {
    AddressDispatcher::new(cosmos_message_addresses).with_resolver(missing_staking_message_addresses)
}
