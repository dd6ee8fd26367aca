use bincode::{Decode, Encode};
use lbm_core::block::BlockHeight;
use lbm_core::dec::Dec;
use lbm_core::dec_coin::DecCoins;
use lbm_util_array_type::{array_type_fixed_size_define, array_type_impl_serde_as_number};
use serde::{Deserialize, Serialize};

array_type_fixed_size_define! {
    /// Reward period of a validator
    ///
    /// Period 0 is the initial "empty" one, so the current period of an
    /// initialized validator is always at least 1.
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct Period(u64);
}
array_type_impl_serde_as_number!(Period, u64);

impl Period {
    /// The period preceding `self`, saturating at 0
    pub fn previous(self) -> Self {
        self.prev().unwrap_or(Self::ZERO)
    }
}

/// Community funds
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct FeePool {
    pub community_pool: DecCoins,
}

/// Cumulative rewards per token at the end of a period
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorHistoricalRewards {
    pub cumulative_reward_ratio: DecCoins,
    /// Number of delegations, slash events and the current period
    /// referencing this entry (never above 2)
    pub reference_count: u32,
}

/// Rewards collected in the ongoing period
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorCurrentRewards {
    pub rewards: DecCoins,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DelegatorStartingInfo {
    pub previous_period: Period,
    pub stake: Dec,
    pub height: BlockHeight,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorSlashEvent {
    pub validator_period: Period,
    pub fraction: Dec,
}
