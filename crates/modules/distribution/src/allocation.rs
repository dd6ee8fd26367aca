use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::VoteInfo;
use lbm_core::dec::Dec;
use lbm_core::dec_coin::DecCoins;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{FEE_COLLECTOR_ACCOUNT, ValidatorInfo};
use lbm_module::module::db::{DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use tracing::{debug, warn};

use crate::error::{DistributionError, accounting};
use crate::events::{EventCommission, EventProposerReward, EventRewards};
use crate::{DistributionModule, LOG_TARGET, module_account};

impl DistributionModule {
    /// Distribute the fees collected in the previous block
    ///
    /// The proposer gets a base reward plus a bonus proportional to the
    /// share of voting power that signed, the community pool takes its tax,
    /// and the rest is split among the voters by power. Whatever is left
    /// over (rounding, missing proposer) goes to the community pool.
    pub(crate) fn allocate_tokens_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        signed_power: u64,
        total_power: u64,
        previous_proposer: Option<ValAddress>,
        votes: &[VoteInfo],
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        let fee_collector = AccAddress::module(FEE_COLLECTOR_ACCOUNT);
        let fees_collected = self.bank.balances(dbtx, fee_collector)?;
        if !fees_collected.is_zero() {
            self.bank
                .send_coins(dbtx, fee_collector, module_account(), &fees_collected)
                .map_err(DbTxError::tx_into)?;
        }
        let fees = DecCoins::from(&fees_collected);

        let mut fee_pool = Self::get_fee_pool_tx(dbtx)?;
        if total_power == 0 {
            fee_pool.community_pool = fee_pool.community_pool.add(&fees);
            Self::set_fee_pool_tx(dbtx, &fee_pool)?;
            return Ok(vec![]);
        }

        let params = Self::get_params_tx(dbtx)?;
        let mut events = vec![];
        let mut remaining = fees.clone();

        let signed_fraction = Dec::from(signed_power).quo(&Dec::from(total_power));
        let proposer_multiplier = &params.base_proposer_reward
            + &params.bonus_proposer_reward.mul_truncate(&signed_fraction);
        let proposer_reward = fees.mul_dec_truncate(&proposer_multiplier);

        match previous_proposer {
            Some(proposer) => match self.staking.validator(dbtx, proposer)? {
                Some(val) => {
                    events.push(
                        EventProposerReward {
                            validator: proposer,
                            amount: proposer_reward.clone(),
                        }
                        .to_event(),
                    );
                    events.extend(self.allocate_to_validator_tx(dbtx, &val, &proposer_reward)?);
                    remaining = Self::sub_allocated(&remaining, &proposer_reward)?;
                }
                None => {
                    warn!(
                        target: LOG_TARGET,
                        %proposer,
                        "Previous proposer not found, its reward goes to the community pool"
                    );
                }
            },
            None => {
                debug!(target: LOG_TARGET, "No previous proposer");
            }
        }

        let community_tax = params.community_tax.clone();
        let vote_multiplier = Dec::one() - proposer_multiplier - community_tax;
        let total_power_dec = Dec::from(total_power);
        for vote in votes {
            let Some(val) = self.staking.validator(dbtx, vote.validator)? else {
                warn!(target: LOG_TARGET, validator = %vote.validator, "Voter not found");
                continue;
            };
            let power_fraction = Dec::from(vote.power).quo_truncate(&total_power_dec);
            let reward = fees
                .mul_dec_truncate(&vote_multiplier)
                .mul_dec_truncate(&power_fraction);
            events.extend(self.allocate_to_validator_tx(dbtx, &val, &reward)?);
            remaining = Self::sub_allocated(&remaining, &reward)?;
        }

        fee_pool.community_pool = fee_pool.community_pool.add(&remaining);
        Self::set_fee_pool_tx(dbtx, &fee_pool)?;

        Ok(events)
    }

    fn sub_allocated(
        remaining: &DecCoins,
        allocated: &DecCoins,
    ) -> DbTxResult<DecCoins, DistributionError> {
        match remaining.checked_sub(allocated) {
            Some(rest) => Ok(rest),
            None => accounting(format!("allocated {allocated} out of {remaining}")),
        }
    }

    /// Credit `tokens` to a validator, splitting off its commission
    pub(crate) fn allocate_to_validator_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        val: &ValidatorInfo,
        tokens: &DecCoins,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        let validator = val.operator;
        let commission = tokens.mul_dec(&val.commission_rate);
        let (shared, _) = tokens.safe_sub(&commission);

        let accumulated = Self::get_commission_tx(dbtx, validator)?.add(&commission);
        Self::set_commission_tx(dbtx, validator, &accumulated)?;

        let Some(mut current) = Self::get_current_tx(dbtx, validator)? else {
            return accounting(format!("no current rewards of {validator}"));
        };
        current.rewards = current.rewards.add(&shared);
        Self::set_current_tx(dbtx, validator, &current)?;

        let outstanding = Self::get_outstanding_tx(dbtx, validator)?.add(tokens);
        Self::set_outstanding_tx(dbtx, validator, &outstanding)?;

        Ok(vec![
            EventCommission {
                validator,
                amount: commission,
            }
            .to_event(),
            EventRewards {
                validator,
                amount: tokens.clone(),
            }
            .to_event(),
        ])
    }
}
