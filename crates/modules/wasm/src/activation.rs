use lbm_core::address::AccAddress;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::module::db::{DbTxResult, ModuleWriteTransactionCtx};
use snafu::ResultExt as _;
use tracing::info;

use crate::error::{AlreadyInactiveSnafu, ContractNotInactiveSnafu, WasmError};
use crate::events::{EventActivateContract, EventDeactivateContract};
use crate::module::WasmModule;
use crate::LOG_TARGET;

impl WasmModule {
    pub fn deactivate_contract_tx(
        dbtx: &ModuleWriteTransactionCtx,
        contract: AccAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, WasmError> {
        Self::existing_contract_tx(dbtx, contract)?;
        if Self::is_inactive_tx(dbtx, contract)? {
            return AlreadyInactiveSnafu { contract }.fail().context(TxSnafu);
        }
        Self::set_inactive_tx(dbtx, contract)?;

        info!(target: LOG_TARGET, %contract, "Contract deactivated");
        Ok(vec![EventDeactivateContract { contract }.to_event()])
    }

    pub fn activate_contract_tx(
        dbtx: &ModuleWriteTransactionCtx,
        contract: AccAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, WasmError> {
        if !Self::is_inactive_tx(dbtx, contract)? {
            return ContractNotInactiveSnafu { contract }.fail().context(TxSnafu);
        }
        Self::remove_inactive_tx(dbtx, contract)?;

        info!(target: LOG_TARGET, %contract, "Contract activated");
        Ok(vec![EventActivateContract { contract }.to_event()])
    }
}
