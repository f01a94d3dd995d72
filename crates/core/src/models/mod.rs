//! Domain models representing projected governance state.
//!
//! These models are storage-agnostic and represent the canonical
//! form of governance and parameter data within the domain layer.
//! Every fact carries the block height at which it was observed.

mod gov;
mod params;

pub use gov::*;
pub use params::*;

use serde::{Deserialize, Serialize};

/// Block number at which a fact was observed.
pub type Height = u64;

// =============================================================================
// Coins
// =============================================================================

/// Integer amount of a single denomination.
///
/// Amounts are kept as decimal strings: chain amounts routinely exceed
/// `u128` and are never used for arithmetic in this layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

/// Decimal amount of a single denomination (e.g. `"0.530000000000000000"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: String,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}
