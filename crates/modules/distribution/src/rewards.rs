use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::{BlockContext, BlockHeight};
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_core::dec_coin::DecCoins;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{DelegationInfo, ValidatorInfo};
use lbm_module::module::db::{DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use snafu::ResultExt as _;
use tracing::{debug, warn};

use crate::error::{
    DistributionError, EmptyDelegationDistInfoSnafu, NoDelegationExistsSnafu,
    NoValidatorCommissionSnafu, NoValidatorExistsSnafu, accounting,
};
use crate::events::{EventWithdrawCommission, EventWithdrawRewards};
use crate::types::{
    DelegatorStartingInfo, Period, ValidatorCurrentRewards, ValidatorHistoricalRewards,
    ValidatorSlashEvent,
};
use crate::{DistributionModule, LOG_TARGET, module_account};

/// A historical rewards entry is referenced by at most one delegation
/// period start, one slash and the period following it
const MAX_REFERENCE_COUNT: u32 = 2;

impl DistributionModule {
    pub(crate) fn existing_validator_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
    ) -> DbTxResult<ValidatorInfo, DistributionError> {
        match self.staking.validator(dbtx, validator)? {
            Some(val) => Ok(val),
            None => NoValidatorExistsSnafu { validator }.fail().context(TxSnafu),
        }
    }

    pub(crate) fn existing_delegation_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbTxResult<DelegationInfo, DistributionError> {
        match self.staking.delegation(dbtx, delegator, validator)? {
            Some(del) => Ok(del),
            None => NoDelegationExistsSnafu {
                delegator,
                validator,
            }
            .fail()
            .context(TxSnafu),
        }
    }

    /// Set up empty reward bookkeeping for a new validator
    pub(crate) fn initialize_validator_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
    ) -> DbTxResult<(), DistributionError> {
        Self::set_historical_tx(
            dbtx,
            validator,
            Period::ZERO,
            &ValidatorHistoricalRewards {
                cumulative_reward_ratio: DecCoins::empty(),
                reference_count: 1,
            },
        )?;
        Self::set_current_tx(
            dbtx,
            validator,
            &ValidatorCurrentRewards {
                rewards: DecCoins::empty(),
                period: Period::new(1),
            },
        )?;
        Self::set_commission_tx(dbtx, validator, &DecCoins::empty())?;
        Self::set_outstanding_tx(dbtx, validator, &DecCoins::empty())?;
        Ok(())
    }

    /// End the current period of `val`, returning it
    ///
    /// Rewards of the period are folded into the cumulative reward ratio.
    /// A validator without tokens has nobody to pay, so its rewards go to
    /// the community pool instead.
    pub(crate) fn increment_validator_period_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        val: &ValidatorInfo,
    ) -> DbTxResult<Period, DistributionError> {
        let validator = val.operator;
        let Some(current) = Self::get_current_tx(dbtx, validator)? else {
            return accounting(format!("no current rewards of {validator}"));
        };

        let increment = if val.tokens == 0 {
            Self::add_to_community_pool_tx(dbtx, &current.rewards)?;

            let outstanding = Self::get_outstanding_tx(dbtx, validator)?;
            let Some(outstanding) = outstanding.checked_sub(&current.rewards) else {
                return accounting(format!(
                    "outstanding rewards of {validator} lower than current ones"
                ));
            };
            Self::set_outstanding_tx(dbtx, validator, &outstanding)?;

            DecCoins::empty()
        } else {
            current
                .rewards
                .quo_dec_truncate(&Dec::from(val.tokens))
        };

        let previous_period = current.period.previous();
        let Some(historical) = Self::get_historical_tx(dbtx, validator, previous_period)? else {
            return accounting(format!(
                "no historical rewards of {validator} for period {previous_period}"
            ));
        };
        Self::decrement_reference_count_tx(dbtx, validator, previous_period)?;

        Self::set_historical_tx(
            dbtx,
            validator,
            current.period,
            &ValidatorHistoricalRewards {
                cumulative_reward_ratio: historical.cumulative_reward_ratio.add(&increment),
                reference_count: 1,
            },
        )?;

        let Some(next_period) = current.period.next() else {
            return accounting(format!("period of {validator} overflowed"));
        };
        Self::set_current_tx(
            dbtx,
            validator,
            &ValidatorCurrentRewards {
                rewards: DecCoins::empty(),
                period: next_period,
            },
        )?;

        Ok(current.period)
    }

    pub(crate) fn increment_reference_count_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        period: Period,
    ) -> DbTxResult<(), DistributionError> {
        let Some(mut historical) = Self::get_historical_tx(dbtx, validator, period)? else {
            return accounting(format!(
                "no historical rewards of {validator} for period {period}"
            ));
        };
        if MAX_REFERENCE_COUNT < historical.reference_count {
            return accounting(format!(
                "reference count of {validator} period {period} above {MAX_REFERENCE_COUNT}"
            ));
        }
        historical.reference_count += 1;
        Self::set_historical_tx(dbtx, validator, period, &historical)?;
        Ok(())
    }

    /// Drop a reference, deleting the entry once nothing refers to it
    pub(crate) fn decrement_reference_count_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        period: Period,
    ) -> DbTxResult<(), DistributionError> {
        let Some(mut historical) = Self::get_historical_tx(dbtx, validator, period)? else {
            return accounting(format!(
                "no historical rewards of {validator} for period {period}"
            ));
        };
        if historical.reference_count == 0 {
            return accounting(format!(
                "reference count of {validator} period {period} already zero"
            ));
        }
        historical.reference_count -= 1;
        if historical.reference_count == 0 {
            Self::delete_historical_tx(dbtx, validator, period)?;
        } else {
            Self::set_historical_tx(dbtx, validator, period, &historical)?;
        }
        Ok(())
    }

    /// Record the stake a delegation starts earning with
    pub(crate) fn initialize_delegation_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        validator: ValAddress,
        delegator: AccAddress,
    ) -> DbTxResult<(), DistributionError> {
        let Some(current) = Self::get_current_tx(dbtx, validator)? else {
            return accounting(format!("no current rewards of {validator}"));
        };
        let previous_period = current.period.previous();
        Self::increment_reference_count_tx(dbtx, validator, previous_period)?;

        let val = self.existing_validator_tx(dbtx, validator)?;
        let delegation = self.existing_delegation_tx(dbtx, delegator, validator)?;
        let stake = val.tokens_from_shares_truncated(&delegation.shares);

        Self::set_starting_info_tx(
            dbtx,
            validator,
            delegator,
            &DelegatorStartingInfo {
                previous_period,
                stake,
                height: block.height,
            },
        )?;
        Ok(())
    }

    /// Rewards of `stake` between two periods
    fn calculate_rewards_between_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        starting_period: Period,
        ending_period: Period,
        stake: &Dec,
    ) -> DbTxResult<DecCoins, DistributionError> {
        if ending_period < starting_period {
            return accounting(format!(
                "ending period {ending_period} before starting period {starting_period}"
            ));
        }
        if stake.is_negative() {
            return accounting("negative stake");
        }

        let (Some(starting), Some(ending)) = (
            Self::get_historical_tx(dbtx, validator, starting_period)?,
            Self::get_historical_tx(dbtx, validator, ending_period)?,
        ) else {
            return accounting(format!(
                "missing historical rewards of {validator} between {starting_period} and {ending_period}"
            ));
        };

        let (difference, negative) = ending
            .cumulative_reward_ratio
            .safe_sub(&starting.cumulative_reward_ratio);
        if negative {
            return accounting("cumulative reward ratio decreased");
        }
        Ok(difference.mul_dec_truncate(stake))
    }

    /// Rewards accrued by `delegation` up to `ending_period`
    ///
    /// Slashes since the delegation started split the calculation into
    /// segments, each with the stake reduced by the slash fraction.
    pub(crate) fn calculate_delegation_rewards_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        val: &ValidatorInfo,
        delegation: &DelegationInfo,
        ending_period: Period,
    ) -> DbTxResult<DecCoins, DistributionError> {
        let validator = val.operator;
        let Some(starting_info) =
            Self::get_starting_info_tx(dbtx, validator, delegation.delegator)?
        else {
            return EmptyDelegationDistInfoSnafu.fail().context(TxSnafu);
        };

        // delegation created or withdrawn from in this very block
        if starting_info.height == block.height {
            return Ok(DecCoins::empty());
        }

        let mut starting_period = starting_info.previous_period;
        let mut stake = starting_info.stake;
        let mut rewards = DecCoins::empty();

        for (_, event) in
            Self::slash_events_between_tx(dbtx, validator, starting_info.height, block.height)?
        {
            let end_period = event.validator_period;
            if starting_period < end_period {
                rewards = rewards.add(&Self::calculate_rewards_between_tx(
                    dbtx,
                    validator,
                    starting_period,
                    end_period,
                    &stake,
                )?);
                stake = stake.mul_truncate(&(Dec::one() - event.fraction));
                starting_period = end_period;
            }
        }

        // rounding of slashes can leave the stake a bit above the real one
        let current_stake = val.tokens_from_shares(&delegation.shares);
        if current_stake < stake {
            let margin_of_err = Dec::smallest().mul_int(3);
            if stake <= &current_stake + &margin_of_err {
                stake = current_stake;
            } else {
                return accounting(format!(
                    "calculated final stake {stake} of {} to {validator} greater than current stake {current_stake}",
                    delegation.delegator
                ));
            }
        }

        rewards = rewards.add(&Self::calculate_rewards_between_tx(
            dbtx,
            validator,
            starting_period,
            ending_period,
            &stake,
        )?);
        Ok(rewards)
    }

    /// Pay out the rewards of a delegation and forget its starting info
    ///
    /// The caller is expected to re-initialize the delegation if it lives on.
    pub(crate) fn withdraw_delegation_rewards_inner_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        val: &ValidatorInfo,
        delegation: &DelegationInfo,
    ) -> DbTxResult<(Coins, Vec<ModuleEvent>), DistributionError> {
        let validator = val.operator;
        let delegator = delegation.delegator;
        let Some(starting_info) = Self::get_starting_info_tx(dbtx, validator, delegator)? else {
            return EmptyDelegationDistInfoSnafu.fail().context(TxSnafu);
        };

        let ending_period = self.increment_validator_period_tx(dbtx, val)?;
        let raw_rewards =
            self.calculate_delegation_rewards_tx(dbtx, block, val, delegation, ending_period)?;
        let outstanding = Self::get_outstanding_tx(dbtx, validator)?;

        // rounding can make the calculated rewards a tiny bit too large
        let rewards = raw_rewards.intersect(&outstanding);
        if rewards != raw_rewards {
            warn!(
                target: LOG_TARGET,
                %delegator,
                %validator,
                calculated = %raw_rewards,
                outstanding = %outstanding,
                "Rounding error withdrawing rewards"
            );
        }

        let (final_rewards, remainder) = rewards.truncate_decimal();
        if !final_rewards.is_zero() {
            let withdraw_addr = Self::get_withdraw_addr_tx(dbtx, delegator)?;
            self.bank
                .send_coins(dbtx, module_account(), withdraw_addr, &final_rewards)
                .map_err(DbTxError::tx_into)?;
        }

        let (outstanding, _) = outstanding.safe_sub(&rewards);
        Self::set_outstanding_tx(dbtx, validator, &outstanding)?;
        Self::add_to_community_pool_tx(dbtx, &remainder)?;

        Self::decrement_reference_count_tx(dbtx, validator, starting_info.previous_period)?;
        Self::delete_starting_info_tx(dbtx, validator, delegator)?;

        debug!(target: LOG_TARGET, %delegator, %validator, amount = %final_rewards, "Rewards withdrawn");
        let events = vec![
            EventWithdrawRewards {
                validator,
                delegator,
                amount: final_rewards.clone(),
            }
            .to_event(),
        ];
        Ok((final_rewards, events))
    }

    /// Withdraw the rewards of a delegation, which keeps earning afterwards
    pub fn withdraw_delegation_rewards_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbTxResult<(Coins, Vec<ModuleEvent>), DistributionError> {
        let val = self.existing_validator_tx(dbtx, validator)?;
        let delegation = self.existing_delegation_tx(dbtx, delegator, validator)?;

        let res = self.withdraw_delegation_rewards_inner_tx(dbtx, block, &val, &delegation)?;
        self.initialize_delegation_tx(dbtx, block, validator, delegator)?;
        Ok(res)
    }

    /// Pay out the whole-coin part of a validator's commission
    pub fn withdraw_validator_commission_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
    ) -> DbTxResult<(Coins, Vec<ModuleEvent>), DistributionError> {
        let accumulated = Self::get_commission_tx(dbtx, validator)?;
        if accumulated.is_zero() {
            return NoValidatorCommissionSnafu.fail().context(TxSnafu);
        }

        let (commission, remainder) = accumulated.truncate_decimal();
        Self::set_commission_tx(dbtx, validator, &remainder)?;

        let outstanding = Self::get_outstanding_tx(dbtx, validator)?;
        let (outstanding, _) = outstanding.safe_sub(&DecCoins::from(&commission));
        Self::set_outstanding_tx(dbtx, validator, &outstanding)?;

        if !commission.is_zero() {
            let withdraw_addr = Self::get_withdraw_addr_tx(dbtx, validator.to_acc())?;
            self.bank
                .send_coins(dbtx, module_account(), withdraw_addr, &commission)
                .map_err(DbTxError::tx_into)?;
        }

        debug!(target: LOG_TARGET, %validator, amount = %commission, "Commission withdrawn");
        let events = vec![
            EventWithdrawCommission {
                validator,
                amount: commission.clone(),
            }
            .to_event(),
        ];
        Ok((commission, events))
    }

    /// End the period of `val` at a slash, so later reward calculations
    /// can reduce delegation stakes from this point on
    pub(crate) fn update_validator_slash_fraction_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        height: BlockHeight,
        val: &ValidatorInfo,
        fraction: &Dec,
    ) -> DbTxResult<(), DistributionError> {
        if fraction.is_negative() || Dec::one() < *fraction {
            return accounting(format!("invalid slash fraction {fraction}"));
        }

        let new_period = self.increment_validator_period_tx(dbtx, val)?;
        Self::increment_reference_count_tx(dbtx, val.operator, new_period)?;
        Self::set_slash_event_tx(
            dbtx,
            val.operator,
            height,
            &ValidatorSlashEvent {
                validator_period: new_period,
                fraction: fraction.clone(),
            },
        )?;
        Ok(())
    }
}
