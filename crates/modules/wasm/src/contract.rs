use lbm_core::address::AccAddress;
use lbm_core::block::BlockContext;
use lbm_core::coin::Coins;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::module::db::{DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use snafu::{ResultExt as _, ensure};
use tracing::debug;

use crate::engine::ContractEnv;
use crate::error::{
    CodeTooLargeSnafu, EmptyCodeSnafu, EngineSnafu, InactiveContractSnafu, InvalidLabelSnafu,
    UnauthorizedSnafu, WasmError, WasmResult,
};
use crate::events::{EventExecute, EventInstantiate, EventMigrate, EventStoreCode, EventUpdateAdmin};
use crate::module::{MAX_LABEL_LEN, MAX_WASM_SIZE, WasmModule};
use crate::types::{CodeId, CodeInfo, ContractInfo, contract_address};
use crate::LOG_TARGET;

pub(crate) fn validate_label(label: &str) -> WasmResult<()> {
    ensure!(
        !label.trim().is_empty(),
        InvalidLabelSnafu {
            reason: "label is blank"
        }
    );
    ensure!(
        label.len() <= MAX_LABEL_LEN,
        InvalidLabelSnafu {
            reason: "label too long"
        }
    );
    Ok(())
}

impl WasmModule {
    pub(crate) fn ensure_active_tx(
        dbtx: &ModuleWriteTransactionCtx,
        contract: AccAddress,
    ) -> DbTxResult<(), WasmError> {
        if Self::is_inactive_tx(dbtx, contract)? {
            return InactiveContractSnafu { contract }.fail().context(TxSnafu);
        }
        Ok(())
    }

    pub fn store_code_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        creator: AccAddress,
        code: &[u8],
    ) -> DbTxResult<(CodeId, Vec<ModuleEvent>), WasmError> {
        if code.is_empty() {
            return EmptyCodeSnafu.fail().context(TxSnafu);
        }
        if MAX_WASM_SIZE < code.len() {
            return CodeTooLargeSnafu { max: MAX_WASM_SIZE }
                .fail()
                .context(TxSnafu);
        }
        let checksum = self
            .engine
            .store_code(code)
            .context(EngineSnafu)
            .context(TxSnafu)?;

        let code_id = Self::get_next_code_id_tx(dbtx)?;
        Self::set_code_tx(dbtx, code_id, &CodeInfo { checksum, creator })?;
        Self::set_next_code_id_tx(dbtx, code_id.saturating_add(1))?;

        debug!(target: LOG_TARGET, %code_id, %checksum, %creator, "Code stored");
        Ok((code_id, vec![EventStoreCode { code_id, checksum }.to_event()]))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn instantiate_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        sender: AccAddress,
        code_id: CodeId,
        admin: Option<AccAddress>,
        label: String,
        msg: &[u8],
        funds: &Coins,
    ) -> DbTxResult<(AccAddress, Vec<ModuleEvent>), WasmError> {
        validate_label(&label).context(TxSnafu)?;
        let code = Self::existing_code_tx(dbtx, code_id)?;

        let instance_id = Self::get_next_instance_id_tx(dbtx)?;
        let contract = contract_address(code_id, instance_id);
        Self::set_next_instance_id_tx(dbtx, instance_id.saturating_add(1))?;

        if !funds.is_zero() {
            self.bank
                .send_coins(dbtx, sender, contract, funds)
                .map_err(DbTxError::tx_into)?;
        }
        self.engine
            .instantiate(
                code.checksum,
                ContractEnv {
                    contract,
                    sender,
                    funds,
                },
                msg,
            )
            .context(EngineSnafu)
            .context(TxSnafu)?;

        Self::set_contract_tx(
            dbtx,
            contract,
            &ContractInfo {
                code_id,
                creator: sender,
                admin,
                label,
                created: block.height,
            },
        )?;

        debug!(target: LOG_TARGET, %contract, %code_id, %sender, "Contract instantiated");
        Ok((
            contract,
            vec![EventInstantiate { contract, code_id }.to_event()],
        ))
    }

    pub fn execute_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        sender: AccAddress,
        contract: AccAddress,
        msg: &[u8],
        funds: &Coins,
    ) -> DbTxResult<Vec<ModuleEvent>, WasmError> {
        let info = Self::existing_contract_tx(dbtx, contract)?;
        Self::ensure_active_tx(dbtx, contract)?;
        let code = Self::existing_code_tx(dbtx, info.code_id)?;

        if !funds.is_zero() {
            self.bank
                .send_coins(dbtx, sender, contract, funds)
                .map_err(DbTxError::tx_into)?;
        }
        self.engine
            .execute(
                code.checksum,
                ContractEnv {
                    contract,
                    sender,
                    funds,
                },
                msg,
            )
            .context(EngineSnafu)
            .context(TxSnafu)?;

        Ok(vec![EventExecute { contract }.to_event()])
    }

    pub fn migrate_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        sender: AccAddress,
        contract: AccAddress,
        new_code_id: CodeId,
        msg: &[u8],
    ) -> DbTxResult<Vec<ModuleEvent>, WasmError> {
        let mut info = Self::existing_contract_tx(dbtx, contract)?;
        Self::ensure_active_tx(dbtx, contract)?;
        if info.admin != Some(sender) {
            return UnauthorizedSnafu { sender, contract }
                .fail()
                .context(TxSnafu);
        }
        let code = Self::existing_code_tx(dbtx, new_code_id)?;

        self.engine
            .migrate(
                code.checksum,
                ContractEnv {
                    contract,
                    sender,
                    funds: &Coins::empty(),
                },
                msg,
            )
            .context(EngineSnafu)
            .context(TxSnafu)?;

        info.code_id = new_code_id;
        Self::set_contract_tx(dbtx, contract, &info)?;

        debug!(target: LOG_TARGET, %contract, code_id = %new_code_id, "Contract migrated");
        Ok(vec![
            EventMigrate {
                contract,
                code_id: new_code_id,
            }
            .to_event(),
        ])
    }

    /// Change or clear (`new_admin == None`) the admin of `contract`
    ///
    /// `sender` must be the current admin, unless it's `None`, which is
    /// how governance proposals do it.
    pub fn set_admin_tx(
        dbtx: &ModuleWriteTransactionCtx,
        sender: Option<AccAddress>,
        contract: AccAddress,
        new_admin: Option<AccAddress>,
    ) -> DbTxResult<Vec<ModuleEvent>, WasmError> {
        let mut info = Self::existing_contract_tx(dbtx, contract)?;
        Self::ensure_active_tx(dbtx, contract)?;
        if let Some(sender) = sender {
            if info.admin != Some(sender) {
                return UnauthorizedSnafu { sender, contract }
                    .fail()
                    .context(TxSnafu);
            }
        }

        info.admin = new_admin;
        Self::set_contract_tx(dbtx, contract, &info)?;

        debug!(target: LOG_TARGET, %contract, ?new_admin, "Contract admin updated");
        Ok(vec![
            EventUpdateAdmin {
                contract,
                new_admin,
            }
            .to_event(),
        ])
    }
}
