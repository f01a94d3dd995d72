//! Singleton parameter sets.
//!
//! Each category holds exactly one current value in storage, guarded by
//! height: a write older than the stored one is silently ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Coin, DecCoin, Height};

// =============================================================================
// Governance
// =============================================================================

/// Parameters of the deposit period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositParams {
    /// Minimum deposit for a proposal to enter the voting period.
    pub min_deposit: Vec<Coin>,
    /// Maximum period for holders to deposit on a proposal.
    #[serde(with = "proto_duration")]
    pub max_deposit_period: Duration,
}

/// Parameters of the voting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingParams {
    #[serde(with = "proto_duration")]
    pub voting_period: Duration,
}

/// Tallying thresholds, as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyParams {
    pub quorum: String,
    pub threshold: String,
    pub veto_threshold: String,
}

/// Governance module parameters observed at `height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovParams {
    pub deposit_params: DepositParams,
    pub voting_params: VotingParams,
    pub tally_params: TallyParams,
    pub height: Height,
}

// =============================================================================
// Interchain staking
// =============================================================================

/// Parameters of the interchain-staking module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcsParams {
    pub deposit_interval: u64,
    pub validatorset_interval: u64,
    pub commission_rate: String,
    pub unbonding_enabled: bool,
}

/// Interchain-staking parameters observed at `height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchainStakingParams {
    pub params: IcsParams,
    pub height: Height,
}

// =============================================================================
// Gas prices
// =============================================================================

/// Minimum gas price table of an e-money chain, one entry per denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EMoneyGasPrices {
    pub gas_prices: Vec<DecCoin>,
    pub height: Height,
}

// =============================================================================
// Duration encoding
// =============================================================================

/// Protobuf JSON duration encoding: `"172800s"`, `"1.5s"`.
mod proto_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = if value.subsec_nanos() == 0 {
            format!("{}s", value.as_secs())
        } else {
            let frac = format!("{:09}", value.subsec_nanos());
            format!("{}.{}s", value.as_secs(), frac.trim_end_matches('0'))
        };
        serializer.serialize_str(&rendered)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid duration: {raw}")))
    }

    fn parse(raw: &str) -> Option<Duration> {
        let body = raw.strip_suffix('s')?;
        let (secs, frac) = match body.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (body, ""),
        };
        if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let secs: u64 = secs.parse().ok()?;
        let nanos = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<9}").parse().ok()?
        };
        Some(Duration::new(secs, nanos))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_whole_and_fractional_seconds() {
            assert_eq!(parse("172800s"), Some(Duration::from_secs(172_800)));
            assert_eq!(parse("1.5s"), Some(Duration::from_millis(1_500)));
            assert_eq!(parse("0.000000001s"), Some(Duration::from_nanos(1)));
        }

        #[test]
        fn rejects_garbage() {
            assert_eq!(parse("172800"), None);
            assert_eq!(parse("1.0000000001s"), None);
            assert_eq!(parse("-1s"), None);
        }
    }
}
