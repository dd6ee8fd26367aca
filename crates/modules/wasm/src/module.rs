use std::sync::Arc;

use lbm_core::address::AccAddress;
use lbm_core::block::BlockContext;
use lbm_core::msg::MsgRaw;
use lbm_core::ver::ConsensusVersion;
use lbm_db::error::TxSnafu;
use lbm_module::event::ModuleEvent;
use lbm_module::keepers::BankKeeper;
use lbm_module::module::IModule;
use lbm_module::module::db::{
    DbResult, DbTxError, DbTxResult, ModuleDatabase, ModuleReadableTransaction,
    ModuleWriteTransactionCtx,
};
use lbm_module::msg::ModuleMsg as _;
use lbm_util_db::range::{collect_range, collect_range_keys};
use lbm_util_db::redb_bincode::ReadableTable as _;
use lbm_util_error::Whatever;
use snafu::ResultExt as _;

use crate::engine::DynWasmEngine;
use crate::error::{CodeNotFoundSnafu, ContractNotFoundSnafu, WasmError};
use crate::genesis::WasmGenesis;
use crate::msg::WasmMsg;
use crate::tables;
use crate::types::{CodeId, CodeInfo, ContractInfo, InstanceId};

pub const MAX_WASM_SIZE: usize = 800 * 1024;
pub const MAX_LABEL_LEN: usize = 128;

const FIRST_CODE_ID: CodeId = CodeId::new(1);
const FIRST_INSTANCE_ID: InstanceId = InstanceId::new(1);

pub struct WasmModule {
    #[allow(dead_code)]
    pub(crate) version: ConsensusVersion,
    pub(crate) db: ModuleDatabase,
    pub(crate) bank: Arc<dyn BankKeeper>,
    pub(crate) engine: DynWasmEngine,
}

impl WasmModule {
    pub fn new(
        version: ConsensusVersion,
        db: ModuleDatabase,
        bank: Arc<dyn BankKeeper>,
        engine: DynWasmEngine,
    ) -> Self {
        Self {
            version,
            db,
            bank,
            engine,
        }
    }

    pub(crate) fn init_db_tx(
        dbtx: &ModuleWriteTransactionCtx,
        version: ConsensusVersion,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::self_version::TABLE)?
            .insert(&(), &version)?;
        dbtx.open_table(&tables::next_code_id::TABLE)?;
        dbtx.open_table(&tables::next_instance_id::TABLE)?;
        dbtx.open_table(&tables::codes::TABLE)?;
        dbtx.open_table(&tables::contracts::TABLE)?;
        dbtx.open_table(&tables::inactive_contracts::TABLE)?;
        Ok(())
    }

    pub async fn code_info(&self, code_id: CodeId) -> Option<CodeInfo> {
        self.db
            .read_with_expect(|dbtx| Self::get_code_tx(dbtx, code_id))
            .await
    }

    pub async fn contract_info(&self, contract: AccAddress) -> Option<ContractInfo> {
        self.db
            .read_with_expect(|dbtx| Self::get_contract_tx(dbtx, contract))
            .await
    }

    pub async fn contracts_by_code(&self, code_id: CodeId) -> Vec<AccAddress> {
        self.db
            .read_with_expect(|dbtx| {
                Ok(Self::contracts_tx(dbtx)?
                    .into_iter()
                    .filter(|(_, info)| info.code_id == code_id)
                    .map(|(addr, _)| addr)
                    .collect())
            })
            .await
    }

    pub async fn is_inactive(&self, contract: AccAddress) -> bool {
        self.db
            .read_with_expect(|dbtx| Self::is_inactive_tx(dbtx, contract))
            .await
    }

    pub async fn inactive_contracts(&self) -> Vec<AccAddress> {
        self.db
            .read_with_expect(|dbtx| Self::inactive_contracts_tx(dbtx))
            .await
    }

    pub fn get_next_code_id_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<CodeId> {
        Ok(dbtx
            .open_table(&tables::next_code_id::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or(FIRST_CODE_ID))
    }

    pub fn set_next_code_id_tx(dbtx: &ModuleWriteTransactionCtx, code_id: CodeId) -> DbResult<()> {
        dbtx.open_table(&tables::next_code_id::TABLE)?
            .insert(&(), &code_id)?;
        Ok(())
    }

    pub fn get_next_instance_id_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<InstanceId> {
        Ok(dbtx
            .open_table(&tables::next_instance_id::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or(FIRST_INSTANCE_ID))
    }

    pub fn set_next_instance_id_tx(
        dbtx: &ModuleWriteTransactionCtx,
        instance_id: InstanceId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::next_instance_id::TABLE)?
            .insert(&(), &instance_id)?;
        Ok(())
    }

    pub fn get_code_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        code_id: CodeId,
    ) -> DbResult<Option<CodeInfo>> {
        Ok(dbtx
            .open_table(&tables::codes::TABLE)?
            .get(&code_id)?
            .map(|v| v.value()))
    }

    pub(crate) fn existing_code_tx(
        dbtx: &ModuleWriteTransactionCtx,
        code_id: CodeId,
    ) -> DbTxResult<CodeInfo, WasmError> {
        match Self::get_code_tx(dbtx, code_id)? {
            Some(info) => Ok(info),
            None => CodeNotFoundSnafu { code_id }.fail().context(TxSnafu),
        }
    }

    pub fn set_code_tx(
        dbtx: &ModuleWriteTransactionCtx,
        code_id: CodeId,
        info: &CodeInfo,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::codes::TABLE)?
            .insert(&code_id, info)?;
        Ok(())
    }

    pub fn codes_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<(CodeId, CodeInfo)>> {
        Ok(collect_range(&dbtx.open_table(&tables::codes::TABLE)?, ..)?)
    }

    pub fn get_contract_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        contract: AccAddress,
    ) -> DbResult<Option<ContractInfo>> {
        Ok(dbtx
            .open_table(&tables::contracts::TABLE)?
            .get(&contract)?
            .map(|v| v.value()))
    }

    pub(crate) fn existing_contract_tx(
        dbtx: &ModuleWriteTransactionCtx,
        contract: AccAddress,
    ) -> DbTxResult<ContractInfo, WasmError> {
        match Self::get_contract_tx(dbtx, contract)? {
            Some(info) => Ok(info),
            None => ContractNotFoundSnafu { contract }.fail().context(TxSnafu),
        }
    }

    pub fn set_contract_tx(
        dbtx: &ModuleWriteTransactionCtx,
        contract: AccAddress,
        info: &ContractInfo,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::contracts::TABLE)?
            .insert(&contract, info)?;
        Ok(())
    }

    pub fn contracts_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<(AccAddress, ContractInfo)>> {
        Ok(collect_range(&dbtx.open_table(&tables::contracts::TABLE)?, ..)?)
    }

    pub fn is_inactive_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        contract: AccAddress,
    ) -> DbResult<bool> {
        Ok(dbtx
            .open_table(&tables::inactive_contracts::TABLE)?
            .get(&contract)?
            .is_some())
    }

    pub(crate) fn set_inactive_tx(
        dbtx: &ModuleWriteTransactionCtx,
        contract: AccAddress,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::inactive_contracts::TABLE)?
            .insert(&contract, &())?;
        Ok(())
    }

    pub(crate) fn remove_inactive_tx(
        dbtx: &ModuleWriteTransactionCtx,
        contract: AccAddress,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::inactive_contracts::TABLE)?
            .remove(&contract)?;
        Ok(())
    }

    pub fn inactive_contracts_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<AccAddress>> {
        Ok(collect_range_keys(
            &dbtx.open_table(&tables::inactive_contracts::TABLE)?,
            ..,
        )?)
    }

    pub(crate) fn process_msg_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: WasmMsg,
    ) -> DbTxResult<Vec<ModuleEvent>, WasmError> {
        match msg {
            WasmMsg::StoreCode { code } => self
                .store_code_tx(dbtx, signer, &code)
                .map(|(_, events)| events),
            WasmMsg::InstantiateContract {
                code_id,
                admin,
                label,
                msg,
                funds,
            } => self
                .instantiate_tx(dbtx, block, signer, code_id, admin, label, &msg, &funds)
                .map(|(_, events)| events),
            WasmMsg::ExecuteContract {
                contract,
                msg,
                funds,
            } => self.execute_tx(dbtx, signer, contract, &msg, &funds),
            WasmMsg::MigrateContract {
                contract,
                code_id,
                msg,
            } => self.migrate_tx(dbtx, signer, contract, code_id, &msg),
            WasmMsg::UpdateAdmin {
                contract,
                new_admin,
            } => Self::set_admin_tx(dbtx, Some(signer), contract, Some(new_admin)),
            WasmMsg::ClearAdmin { contract } => {
                Self::set_admin_tx(dbtx, Some(signer), contract, None)
            }
        }
    }
}

impl IModule for WasmModule {
    fn process_msg(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: &MsgRaw,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let msg = WasmMsg::decode_from_raw(msg)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;
        self.process_msg_tx(dbtx, block, signer, msg)
            .map_err(DbTxError::whatever)
    }

    fn init_genesis(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &serde_json::Value,
    ) -> DbTxResult<(), Whatever> {
        let genesis: WasmGenesis = serde_json::from_value(genesis.clone())
            .whatever_context("Invalid wasm genesis")
            .context(TxSnafu)?;
        Self::init_genesis_tx(dbtx, &genesis).map_err(DbTxError::whatever)
    }

    fn export_genesis(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<serde_json::Value> {
        let genesis = Self::export_genesis_tx(dbtx)?;
        Ok(serde_json::to_value(genesis).expect("Can't fail"))
    }
}
