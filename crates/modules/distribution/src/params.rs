use bincode::{Decode, Encode};
use lbm_core::dec::Dec;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{DistributionResult, InvalidParamsSnafu};

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DistributionParams {
    pub community_tax: Dec,
    pub base_proposer_reward: Dec,
    pub bonus_proposer_reward: Dec,
    pub withdraw_addr_enabled: bool,
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self {
            community_tax: Dec::percent(2),
            base_proposer_reward: Dec::percent(1),
            bonus_proposer_reward: Dec::percent(4),
            withdraw_addr_enabled: true,
        }
    }
}

fn ensure_fraction(value: &Dec, reason: &'static str) -> DistributionResult<()> {
    ensure!(
        !value.is_negative() && *value <= Dec::one(),
        InvalidParamsSnafu { reason }
    );
    Ok(())
}

impl DistributionParams {
    pub fn validate(&self) -> DistributionResult<()> {
        ensure_fraction(&self.community_tax, "community tax must be within [0, 1]")?;
        ensure_fraction(
            &self.base_proposer_reward,
            "base proposer reward must be within [0, 1]",
        )?;
        ensure_fraction(
            &self.bonus_proposer_reward,
            "bonus proposer reward must be within [0, 1]",
        )?;
        let total = &(&self.base_proposer_reward + &self.bonus_proposer_reward) + &self.community_tax;
        ensure!(
            total <= Dec::one(),
            InvalidParamsSnafu {
                reason: "sum of proposer rewards and community tax exceeds 1"
            }
        );
        Ok(())
    }
}
