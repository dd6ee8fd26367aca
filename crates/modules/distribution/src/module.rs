use std::sync::Arc;

use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::{BlockContext, BlockHeight, BlockInfo};
use lbm_core::coin::Coins;
use lbm_core::dec_coin::DecCoins;
use lbm_core::msg::MsgRaw;
use lbm_core::ver::ConsensusVersion;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{BankKeeper, StakingKeeper};
use lbm_module::module::IModule;
use lbm_module::module::db::{
    DbResult, DbTxError, DbTxResult, ModuleDatabase, ModuleReadableTransaction,
    ModuleWriteTransactionCtx, split_tx_error,
};
use lbm_module::msg::ModuleMsg as _;
use lbm_util_db::range::collect_range;
use lbm_util_db::redb_bincode::ReadableTable as _;
use lbm_util_error::Whatever;
use snafu::ResultExt as _;
use tracing::debug;

use crate::error::{
    BadDistributionSnafu, BlockedAddressSnafu, DistributionError, NotOperatorSnafu,
    WithdrawAddrDisabledSnafu,
};
use crate::events::{EventCommunityPoolSpend, EventFundCommunityPool, EventSetWithdrawAddress};
use crate::genesis::DistributionGenesis;
use crate::invariants::InvariantViolation;
use crate::msg::DistributionMsg;
use crate::params::DistributionParams;
use crate::types::{
    DelegatorStartingInfo, FeePool, Period, ValidatorCurrentRewards, ValidatorHistoricalRewards,
    ValidatorSlashEvent,
};
use crate::{LOG_TARGET, MODULE_ACCOUNT, tables};

pub struct DistributionModule {
    #[allow(dead_code)]
    pub(crate) version: ConsensusVersion,
    pub(crate) db: ModuleDatabase,
    pub(crate) bank: Arc<dyn BankKeeper>,
    pub(crate) staking: Arc<dyn StakingKeeper>,
}

/// Address of the account holding undistributed rewards and the community
/// pool
pub fn module_account() -> AccAddress {
    AccAddress::module(MODULE_ACCOUNT)
}

impl DistributionModule {
    pub fn new(
        version: ConsensusVersion,
        db: ModuleDatabase,
        bank: Arc<dyn BankKeeper>,
        staking: Arc<dyn StakingKeeper>,
    ) -> Self {
        Self {
            version,
            db,
            bank,
            staking,
        }
    }

    pub(crate) fn init_db_tx(
        dbtx: &ModuleWriteTransactionCtx,
        version: ConsensusVersion,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::self_version::TABLE)?
            .insert(&(), &version)?;
        dbtx.open_table(&tables::params::TABLE)?;
        dbtx.open_table(&tables::fee_pool::TABLE)?;
        dbtx.open_table(&tables::previous_proposer::TABLE)?;
        dbtx.open_table(&tables::withdraw_addrs::TABLE)?;
        dbtx.open_table(&tables::outstanding_rewards::TABLE)?;
        dbtx.open_table(&tables::accumulated_commission::TABLE)?;
        dbtx.open_table(&tables::historical_rewards::TABLE)?;
        dbtx.open_table(&tables::current_rewards::TABLE)?;
        dbtx.open_table(&tables::starting_infos::TABLE)?;
        dbtx.open_table(&tables::slash_events::TABLE)?;
        Ok(())
    }

    // Queries

    pub async fn params(&self) -> DistributionParams {
        self.db
            .read_with_expect(|dbtx| Self::get_params_tx(dbtx))
            .await
    }

    pub async fn community_pool(&self) -> DecCoins {
        self.db
            .read_with_expect(|dbtx| Ok(Self::get_fee_pool_tx(dbtx)?.community_pool))
            .await
    }

    pub async fn outstanding_rewards(&self, validator: ValAddress) -> DecCoins {
        self.db
            .read_with_expect(|dbtx| Self::get_outstanding_tx(dbtx, validator))
            .await
    }

    pub async fn validator_commission(&self, validator: ValAddress) -> DecCoins {
        self.db
            .read_with_expect(|dbtx| Self::get_commission_tx(dbtx, validator))
            .await
    }

    /// Slash events of `validator` between two heights, inclusive
    pub async fn validator_slashes(
        &self,
        validator: ValAddress,
        starting_height: BlockHeight,
        ending_height: BlockHeight,
    ) -> Vec<(BlockHeight, ValidatorSlashEvent)> {
        self.db
            .read_with_expect(|dbtx| {
                Self::slash_events_between_tx(dbtx, validator, starting_height, ending_height)
            })
            .await
    }

    pub async fn withdraw_address(&self, delegator: AccAddress) -> AccAddress {
        self.db
            .read_with_expect(|dbtx| Self::get_withdraw_addr_tx(dbtx, delegator))
            .await
    }

    /// Rewards `delegator` would get by withdrawing from `validator` in the
    /// block `block`
    pub async fn delegation_rewards(
        &self,
        block: &BlockContext,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> Result<DecCoins, DistributionError> {
        self.db
            .simulate_with_expect(|dbtx| {
                split_tx_error(self.query_delegation_rewards_tx(dbtx, block, delegator, validator))
            })
            .await
    }

    /// Rewards of all the delegations of `delegator`, and their total
    pub async fn delegation_total_rewards(
        &self,
        block: &BlockContext,
        delegator: AccAddress,
    ) -> Result<(Vec<(ValAddress, DecCoins)>, DecCoins), DistributionError> {
        self.db
            .simulate_with_expect(|dbtx| {
                split_tx_error((|| -> DbTxResult<_, DistributionError> {
                    let mut total = DecCoins::empty();
                    let mut rewards = vec![];
                    for delegation in self.staking.delegator_delegations(dbtx, delegator)? {
                        let r = self.query_delegation_rewards_tx(
                            dbtx,
                            block,
                            delegator,
                            delegation.validator,
                        )?;
                        total = total.add(&r);
                        rewards.push((delegation.validator, r));
                    }
                    Ok((rewards, total))
                })())
            })
            .await
    }

    pub async fn invariants(&self) -> Vec<InvariantViolation> {
        self.db
            .simulate_with_expect(|dbtx| self.check_invariants_tx(dbtx))
            .await
    }

    fn query_delegation_rewards_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbTxResult<DecCoins, DistributionError> {
        let val = self.existing_validator_tx(dbtx, validator)?;
        let delegation = self.existing_delegation_tx(dbtx, delegator, validator)?;
        let ending_period = self.increment_validator_period_tx(dbtx, &val)?;
        self.calculate_delegation_rewards_tx(dbtx, block, &val, &delegation, ending_period)
    }

    // Operations

    pub fn set_withdraw_address_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
        withdraw_address: AccAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        if self.bank.is_blocked(withdraw_address) {
            return BlockedAddressSnafu {
                addr: withdraw_address,
            }
            .fail()
            .context(TxSnafu);
        }
        if !Self::get_params_tx(dbtx)?.withdraw_addr_enabled {
            return WithdrawAddrDisabledSnafu.fail().context(TxSnafu);
        }

        Self::set_withdraw_addr_tx(dbtx, delegator, withdraw_address)?;
        debug!(target: LOG_TARGET, %delegator, %withdraw_address, "Withdraw address set");
        Ok(vec![
            EventSetWithdrawAddress {
                delegator,
                withdraw_address,
            }
            .to_event(),
        ])
    }

    pub fn fund_community_pool_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        depositor: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        self.bank
            .send_coins(dbtx, depositor, module_account(), amount)
            .map_err(DbTxError::tx_into)?;

        let mut fee_pool = Self::get_fee_pool_tx(dbtx)?;
        fee_pool.community_pool = fee_pool.community_pool.add(&DecCoins::from(amount));
        Self::set_fee_pool_tx(dbtx, &fee_pool)?;

        Ok(vec![
            EventFundCommunityPool {
                depositor,
                amount: amount.clone(),
            }
            .to_event(),
        ])
    }

    /// Pay `amount` out of the community pool
    pub fn distribute_from_fee_pool_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        amount: &Coins,
        recipient: AccAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        let mut fee_pool = Self::get_fee_pool_tx(dbtx)?;
        let (new_pool, negative) = fee_pool.community_pool.safe_sub(&DecCoins::from(amount));
        if negative {
            return BadDistributionSnafu.fail().context(TxSnafu);
        }
        fee_pool.community_pool = new_pool;

        self.bank
            .send_coins(dbtx, module_account(), recipient, amount)
            .map_err(DbTxError::tx_into)?;
        Self::set_fee_pool_tx(dbtx, &fee_pool)?;

        debug!(target: LOG_TARGET, %recipient, %amount, "Paid out of community pool");
        Ok(vec![
            EventCommunityPoolSpend {
                recipient,
                amount: amount.clone(),
            }
            .to_event(),
        ])
    }

    pub(crate) fn process_msg_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: DistributionMsg,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        match msg {
            DistributionMsg::SetWithdrawAddress { withdraw_address } => {
                self.set_withdraw_address_tx(dbtx, signer, withdraw_address)
            }
            DistributionMsg::WithdrawDelegatorReward { validator } => self
                .withdraw_delegation_rewards_tx(dbtx, block, signer, validator)
                .map(|(_, events)| events),
            DistributionMsg::WithdrawValidatorCommission { validator } => {
                if signer != validator.to_acc() {
                    return NotOperatorSnafu { signer, validator }
                        .fail()
                        .context(TxSnafu);
                }
                self.withdraw_validator_commission_tx(dbtx, validator)
                    .map(|(_, events)| events)
            }
            DistributionMsg::FundCommunityPool { amount } => {
                self.fund_community_pool_tx(dbtx, signer, &amount)
            }
        }
    }

    // State accessors

    pub fn get_params_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<DistributionParams> {
        Ok(dbtx
            .open_table(&tables::params::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    pub fn set_params_tx(
        dbtx: &ModuleWriteTransactionCtx,
        params: &DistributionParams,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::params::TABLE)?
            .insert(&(), params)?;
        Ok(())
    }

    pub fn get_fee_pool_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<FeePool> {
        Ok(dbtx
            .open_table(&tables::fee_pool::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    pub fn set_fee_pool_tx(dbtx: &ModuleWriteTransactionCtx, fee_pool: &FeePool) -> DbResult<()> {
        dbtx.open_table(&tables::fee_pool::TABLE)?
            .insert(&(), fee_pool)?;
        Ok(())
    }

    pub(crate) fn add_to_community_pool_tx(
        dbtx: &ModuleWriteTransactionCtx,
        amount: &DecCoins,
    ) -> DbResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut fee_pool = Self::get_fee_pool_tx(dbtx)?;
        fee_pool.community_pool = fee_pool.community_pool.add(amount);
        Self::set_fee_pool_tx(dbtx, &fee_pool)
    }

    pub fn get_previous_proposer_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Option<ValAddress>> {
        Ok(dbtx
            .open_table(&tables::previous_proposer::TABLE)?
            .get(&())?
            .map(|v| v.value()))
    }

    pub fn set_previous_proposer_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposer: ValAddress,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::previous_proposer::TABLE)?
            .insert(&(), &proposer)?;
        Ok(())
    }

    /// Where rewards of `delegator` go, by default the delegator itself
    pub fn get_withdraw_addr_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        delegator: AccAddress,
    ) -> DbResult<AccAddress> {
        Ok(dbtx
            .open_table(&tables::withdraw_addrs::TABLE)?
            .get(&delegator)?
            .map(|v| v.value())
            .unwrap_or(delegator))
    }

    pub fn set_withdraw_addr_tx(
        dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
        withdraw_address: AccAddress,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::withdraw_addrs::TABLE)?
            .insert(&delegator, &withdraw_address)?;
        Ok(())
    }

    pub fn get_outstanding_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        validator: ValAddress,
    ) -> DbResult<DecCoins> {
        Ok(dbtx
            .open_table(&tables::outstanding_rewards::TABLE)?
            .get(&validator)?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    pub fn set_outstanding_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        rewards: &DecCoins,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::outstanding_rewards::TABLE)?
            .insert(&validator, rewards)?;
        Ok(())
    }

    pub fn get_commission_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        validator: ValAddress,
    ) -> DbResult<DecCoins> {
        Ok(dbtx
            .open_table(&tables::accumulated_commission::TABLE)?
            .get(&validator)?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    pub fn set_commission_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        commission: &DecCoins,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::accumulated_commission::TABLE)?
            .insert(&validator, commission)?;
        Ok(())
    }

    pub fn get_historical_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        validator: ValAddress,
        period: Period,
    ) -> DbResult<Option<ValidatorHistoricalRewards>> {
        Ok(dbtx
            .open_table(&tables::historical_rewards::TABLE)?
            .get(&(validator, period))?
            .map(|v| v.value()))
    }

    pub fn set_historical_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        period: Period,
        rewards: &ValidatorHistoricalRewards,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::historical_rewards::TABLE)?
            .insert(&(validator, period), rewards)?;
        Ok(())
    }

    pub(crate) fn delete_historical_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        period: Period,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::historical_rewards::TABLE)?
            .remove(&(validator, period))?;
        Ok(())
    }

    pub fn get_current_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        validator: ValAddress,
    ) -> DbResult<Option<ValidatorCurrentRewards>> {
        Ok(dbtx
            .open_table(&tables::current_rewards::TABLE)?
            .get(&validator)?
            .map(|v| v.value()))
    }

    pub fn set_current_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        rewards: &ValidatorCurrentRewards,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::current_rewards::TABLE)?
            .insert(&validator, rewards)?;
        Ok(())
    }

    pub fn get_starting_info_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        validator: ValAddress,
        delegator: AccAddress,
    ) -> DbResult<Option<DelegatorStartingInfo>> {
        Ok(dbtx
            .open_table(&tables::starting_infos::TABLE)?
            .get(&(validator, delegator))?
            .map(|v| v.value()))
    }

    pub fn set_starting_info_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        delegator: AccAddress,
        info: &DelegatorStartingInfo,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::starting_infos::TABLE)?
            .insert(&(validator, delegator), info)?;
        Ok(())
    }

    pub(crate) fn delete_starting_info_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        delegator: AccAddress,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::starting_infos::TABLE)?
            .remove(&(validator, delegator))?;
        Ok(())
    }

    pub fn set_slash_event_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
        height: BlockHeight,
        event: &ValidatorSlashEvent,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::slash_events::TABLE)?
            .insert(&(validator, height, event.validator_period), event)?;
        Ok(())
    }

    pub fn slash_events_between_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        validator: ValAddress,
        starting_height: BlockHeight,
        ending_height: BlockHeight,
    ) -> DbResult<Vec<(BlockHeight, ValidatorSlashEvent)>> {
        let tbl = dbtx.open_table(&tables::slash_events::TABLE)?;
        Ok(collect_range(
            &tbl,
            (validator, starting_height, Period::MIN)..=(validator, ending_height, Period::MAX),
        )?
        .into_iter()
        .map(|((_, height, _), event)| (height, event))
        .collect())
    }

    /// Remove all the reward bookkeeping of `validator`
    pub(crate) fn delete_validator_state_tx(
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::outstanding_rewards::TABLE)?
            .remove(&validator)?;
        dbtx.open_table(&tables::accumulated_commission::TABLE)?
            .remove(&validator)?;
        dbtx.open_table(&tables::current_rewards::TABLE)?
            .remove(&validator)?;
        dbtx.open_table(&tables::historical_rewards::TABLE)?
            .retain(|(v, _), _| *v != validator)?;
        dbtx.open_table(&tables::slash_events::TABLE)?
            .retain(|(v, _, _), _| *v != validator)?;
        Ok(())
    }
}

impl IModule for DistributionModule {
    fn process_msg(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: &MsgRaw,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let msg = DistributionMsg::decode_from_raw(msg)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;
        self.process_msg_tx(dbtx, block, signer, msg)
            .map_err(DbTxError::whatever)
    }

    fn begin_block(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        info: &BlockInfo,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let mut events = vec![];
        // the first block has no previous commit to reward
        if 1 < block.height.to_number() {
            let previous_proposer = Self::get_previous_proposer_tx(dbtx)?;
            events = self
                .allocate_tokens_tx(
                    dbtx,
                    info.signed_power(),
                    info.total_power(),
                    previous_proposer,
                    &info.votes,
                )
                .map_err(DbTxError::whatever)?;
        }
        if let Some(proposer) = info.proposer {
            Self::set_previous_proposer_tx(dbtx, proposer)?;
        }
        Ok(events)
    }

    fn init_genesis(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &serde_json::Value,
    ) -> DbTxResult<(), Whatever> {
        let genesis: DistributionGenesis = serde_json::from_value(genesis.clone())
            .whatever_context("Invalid distribution genesis")
            .context(TxSnafu)?;
        self.init_genesis_tx(dbtx, &genesis)
            .map_err(DbTxError::whatever)
    }

    fn export_genesis(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<serde_json::Value> {
        let genesis = Self::export_genesis_tx(dbtx)?;
        Ok(serde_json::to_value(genesis).expect("Can't fail"))
    }
}
