use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockHeight;
use lbm_core::dec_coin::DecCoins;
use lbm_db::error::TxSnafu;
use lbm_module::module::db::{
    DbResult, DbTxResult, ModuleReadableTransaction, ModuleWriteTransactionCtx,
};
use lbm_util_db::range::collect_range;
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::error::{DistributionError, InvalidGenesisSnafu};
use crate::params::DistributionParams;
use crate::types::{
    DelegatorStartingInfo, FeePool, Period, ValidatorCurrentRewards, ValidatorHistoricalRewards,
    ValidatorSlashEvent,
};
use crate::{DistributionModule, module_account, tables};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawAddressRecord {
    pub delegator: AccAddress,
    pub withdraw_address: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingRewardsRecord {
    pub validator: ValAddress,
    pub outstanding_rewards: DecCoins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedCommissionRecord {
    pub validator: ValAddress,
    pub accumulated: DecCoins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRewardsRecord {
    pub validator: ValAddress,
    pub period: Period,
    pub rewards: ValidatorHistoricalRewards,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRewardsRecord {
    pub validator: ValAddress,
    pub rewards: ValidatorCurrentRewards,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingInfoRecord {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    pub starting_info: DelegatorStartingInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashEventRecord {
    pub validator: ValAddress,
    pub height: BlockHeight,
    pub event: ValidatorSlashEvent,
}

/// Complete distribution state
///
/// Exported state can be imported back unchanged, which is how chains are
/// restarted from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionGenesis {
    pub params: DistributionParams,
    pub fee_pool: FeePool,
    pub delegator_withdraw_infos: Vec<WithdrawAddressRecord>,
    pub previous_proposer: Option<ValAddress>,
    pub outstanding_rewards: Vec<OutstandingRewardsRecord>,
    pub validator_accumulated_commissions: Vec<AccumulatedCommissionRecord>,
    pub validator_historical_rewards: Vec<HistoricalRewardsRecord>,
    pub validator_current_rewards: Vec<CurrentRewardsRecord>,
    pub delegator_starting_infos: Vec<StartingInfoRecord>,
    pub validator_slash_events: Vec<SlashEventRecord>,
}

impl DistributionGenesis {
    pub fn validate(&self) -> Result<(), DistributionError> {
        self.params.validate()?;
        if self.fee_pool.community_pool.is_any_negative() {
            return InvalidGenesisSnafu {
                reason: "negative community pool",
            }
            .fail();
        }
        Ok(())
    }

    /// Everything the module account has to hold
    fn total_holdings(&self) -> DecCoins {
        self.outstanding_rewards
            .iter()
            .fold(self.fee_pool.community_pool.clone(), |acc, r| {
                acc.add(&r.outstanding_rewards)
            })
    }
}

impl DistributionModule {
    pub(crate) fn init_genesis_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &DistributionGenesis,
    ) -> DbTxResult<(), DistributionError> {
        genesis.validate().context(TxSnafu)?;

        Self::set_params_tx(dbtx, &genesis.params)?;
        Self::set_fee_pool_tx(dbtx, &genesis.fee_pool)?;
        for r in &genesis.delegator_withdraw_infos {
            Self::set_withdraw_addr_tx(dbtx, r.delegator, r.withdraw_address)?;
        }
        if let Some(proposer) = genesis.previous_proposer {
            Self::set_previous_proposer_tx(dbtx, proposer)?;
        }
        for r in &genesis.outstanding_rewards {
            Self::set_outstanding_tx(dbtx, r.validator, &r.outstanding_rewards)?;
        }
        for r in &genesis.validator_accumulated_commissions {
            Self::set_commission_tx(dbtx, r.validator, &r.accumulated)?;
        }
        for r in &genesis.validator_historical_rewards {
            Self::set_historical_tx(dbtx, r.validator, r.period, &r.rewards)?;
        }
        for r in &genesis.validator_current_rewards {
            Self::set_current_tx(dbtx, r.validator, &r.rewards)?;
        }
        for r in &genesis.delegator_starting_infos {
            Self::set_starting_info_tx(dbtx, r.validator, r.delegator, &r.starting_info)?;
        }
        for r in &genesis.validator_slash_events {
            Self::set_slash_event_tx(dbtx, r.validator, r.height, &r.event)?;
        }

        let (expected, _) = genesis.total_holdings().truncate_decimal();
        let balance = self.bank.balances(dbtx, module_account())?;
        if balance != expected {
            return InvalidGenesisSnafu {
                reason: format!(
                    "module account holds {balance}, outstanding rewards and community pool add up to {expected}"
                ),
            }
            .fail()
            .context(TxSnafu);
        }
        Ok(())
    }

    pub(crate) fn export_genesis_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<DistributionGenesis> {
        let delegator_withdraw_infos = collect_range(
            &dbtx.open_table(&tables::withdraw_addrs::TABLE)?,
            ..,
        )?
        .into_iter()
        .map(|(delegator, withdraw_address)| WithdrawAddressRecord {
            delegator,
            withdraw_address,
        })
        .collect();

        let outstanding_rewards = collect_range(
            &dbtx.open_table(&tables::outstanding_rewards::TABLE)?,
            ..,
        )?
        .into_iter()
        .map(|(validator, outstanding_rewards)| OutstandingRewardsRecord {
            validator,
            outstanding_rewards,
        })
        .collect();

        let validator_accumulated_commissions = collect_range(
            &dbtx.open_table(&tables::accumulated_commission::TABLE)?,
            ..,
        )?
        .into_iter()
        .map(|(validator, accumulated)| AccumulatedCommissionRecord {
            validator,
            accumulated,
        })
        .collect();

        let validator_historical_rewards = collect_range(
            &dbtx.open_table(&tables::historical_rewards::TABLE)?,
            ..,
        )?
        .into_iter()
        .map(|((validator, period), rewards)| HistoricalRewardsRecord {
            validator,
            period,
            rewards,
        })
        .collect();

        let validator_current_rewards = collect_range(
            &dbtx.open_table(&tables::current_rewards::TABLE)?,
            ..,
        )?
        .into_iter()
        .map(|(validator, rewards)| CurrentRewardsRecord { validator, rewards })
        .collect();

        let delegator_starting_infos = collect_range(
            &dbtx.open_table(&tables::starting_infos::TABLE)?,
            ..,
        )?
        .into_iter()
        .map(|((validator, delegator), starting_info)| StartingInfoRecord {
            delegator,
            validator,
            starting_info,
        })
        .collect();

        let validator_slash_events = collect_range(
            &dbtx.open_table(&tables::slash_events::TABLE)?,
            ..,
        )?
        .into_iter()
        .map(|((validator, height, _), event)| SlashEventRecord {
            validator,
            height,
            event,
        })
        .collect();

        Ok(DistributionGenesis {
            params: Self::get_params_tx(dbtx)?,
            fee_pool: Self::get_fee_pool_tx(dbtx)?,
            delegator_withdraw_infos,
            previous_proposer: Self::get_previous_proposer_tx(dbtx)?,
            outstanding_rewards,
            validator_accumulated_commissions,
            validator_historical_rewards,
            validator_current_rewards,
            delegator_starting_infos,
            validator_slash_events,
        })
    }
}
