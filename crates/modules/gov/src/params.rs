use bincode::{Decode, Encode};
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{GovResult, InvalidParamsSnafu};

const TWO_DAYS_SECS: u64 = 2 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DepositParams {
    /// Deposit needed for a proposal to enter the voting period
    pub min_deposit: Coins,
    pub max_deposit_period_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct VotingParams {
    pub voting_period_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TallyParams {
    /// Share of the bonded tokens that needs to vote
    pub quorum: Dec,
    /// Share of non-abstaining votes that needs to be yes
    pub threshold: Dec,
    /// Share of all votes vetoing that rejects the proposal
    pub veto_threshold: Dec,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct GovParams {
    pub deposit: DepositParams,
    pub voting: VotingParams,
    pub tally: TallyParams,
}

impl Default for GovParams {
    fn default() -> Self {
        Self {
            deposit: DepositParams {
                min_deposit: Coins::single("stake", 10_000_000).expect("Valid denom"),
                max_deposit_period_secs: TWO_DAYS_SECS,
            },
            voting: VotingParams {
                voting_period_secs: TWO_DAYS_SECS,
            },
            tally: TallyParams {
                quorum: Dec::new_with_prec(334, 3),
                threshold: Dec::new_with_prec(5, 1),
                veto_threshold: Dec::new_with_prec(334, 3),
            },
        }
    }
}

fn ensure_fraction(value: &Dec, reason: &'static str) -> GovResult<()> {
    ensure!(
        !value.is_negative() && *value <= Dec::one(),
        InvalidParamsSnafu { reason }
    );
    Ok(())
}

impl GovParams {
    pub fn validate(&self) -> GovResult<()> {
        ensure!(
            0 < self.deposit.max_deposit_period_secs,
            InvalidParamsSnafu {
                reason: "max deposit period must be positive"
            }
        );
        ensure!(
            0 < self.voting.voting_period_secs,
            InvalidParamsSnafu {
                reason: "voting period must be positive"
            }
        );
        ensure_fraction(&self.tally.quorum, "quorum must be within [0, 1]")?;
        ensure!(
            self.tally.threshold.is_positive(),
            InvalidParamsSnafu {
                reason: "threshold must be positive"
            }
        );
        ensure_fraction(&self.tally.threshold, "threshold must be within (0, 1]")?;
        ensure!(
            self.tally.veto_threshold.is_positive(),
            InvalidParamsSnafu {
                reason: "veto threshold must be positive"
            }
        );
        ensure_fraction(&self.tally.veto_threshold, "veto threshold must be within (0, 1]")?;
        Ok(())
    }
}
