use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockContext;
use lbm_core::dec::Dec;
use lbm_core::dec_coin::DecCoins;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::keepers::StakingHooks;
use lbm_module::module::db::{DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use lbm_util_error::Whatever;
use tracing::debug;

use crate::error::DistributionError;
use crate::events::EventWithdrawCommission;
use crate::{DistributionModule, KIND, LOG_TARGET, module_account};

impl DistributionModule {
    /// Settle everything a removed validator still holds
    ///
    /// Whole coins of the commission go to the operator, everything else
    /// (commission change, unclaimed delegator rewards) to the community
    /// pool.
    fn after_validator_removed_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        let mut events = vec![];
        let mut outstanding = Self::get_outstanding_tx(dbtx, validator)?;
        let commission = Self::get_commission_tx(dbtx, validator)?;

        let mut to_community_pool = DecCoins::empty();
        if !commission.is_zero() {
            (outstanding, _) = outstanding.safe_sub(&commission);

            let (coins, remainder) = commission.truncate_decimal();
            to_community_pool = to_community_pool.add(&remainder);

            if !coins.is_zero() {
                let withdraw_addr = Self::get_withdraw_addr_tx(dbtx, validator.to_acc())?;
                self.bank
                    .send_coins(dbtx, module_account(), withdraw_addr, &coins)
                    .map_err(DbTxError::tx_into)?;
                events.push(
                    EventWithdrawCommission {
                        validator,
                        amount: coins,
                    }
                    .to_event(),
                );
            }
        }
        to_community_pool = to_community_pool.add(&outstanding);
        Self::add_to_community_pool_tx(dbtx, &to_community_pool)?;

        Self::delete_validator_state_tx(dbtx, validator)?;
        debug!(target: LOG_TARGET, %validator, "Validator rewards state removed");
        Ok(events)
    }
}

impl StakingHooks for DistributionModule {
    fn after_validator_created(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        Self::initialize_validator_tx(&dbtx, validator).map_err(DbTxError::whatever)?;
        Ok(vec![])
    }

    fn after_validator_removed(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        self.after_validator_removed_tx(&dbtx, validator)
            .map_err(DbTxError::whatever)
    }

    fn before_delegation_created(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _delegator: AccAddress,
        validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        (|| -> DbTxResult<_, DistributionError> {
            let val = self.existing_validator_tx(&dbtx, validator)?;
            self.increment_validator_period_tx(&dbtx, &val)?;
            Ok(vec![])
        })()
        .map_err(DbTxError::whatever)
    }

    fn before_delegation_shares_modified(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        (|| -> DbTxResult<_, DistributionError> {
            let val = self.existing_validator_tx(&dbtx, validator)?;
            let delegation = self.existing_delegation_tx(&dbtx, delegator, validator)?;
            let (_, events) =
                self.withdraw_delegation_rewards_inner_tx(&dbtx, block, &val, &delegation)?;
            Ok(events)
        })()
        .map_err(DbTxError::whatever)
    }

    fn after_delegation_modified(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        self.initialize_delegation_tx(&dbtx, block, validator, delegator)
            .map_err(DbTxError::whatever)?;
        Ok(vec![])
    }

    fn before_validator_slashed(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        validator: ValAddress,
        fraction: &Dec,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        (|| -> DbTxResult<_, DistributionError> {
            let val = self.existing_validator_tx(&dbtx, validator)?;
            self.update_validator_slash_fraction_tx(&dbtx, block.height, &val, fraction)?;
            Ok(vec![])
        })()
        .map_err(DbTxError::whatever)
    }
}
