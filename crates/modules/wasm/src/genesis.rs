use std::collections::BTreeSet;

use lbm_core::address::AccAddress;
use lbm_db::error::TxSnafu;
use lbm_module::module::db::{
    DbResult, DbTxResult, ModuleReadableTransaction, ModuleWriteTransactionCtx,
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::contract::validate_label;
use crate::error::{InvalidGenesisSnafu, WasmError};
use crate::module::WasmModule;
use crate::types::{CodeId, CodeInfo, ContractInfo, InstanceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub code_id: CodeId,
    pub info: CodeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub address: AccAddress,
    pub info: ContractInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasmGenesis {
    pub codes: Vec<CodeRecord>,
    pub contracts: Vec<ContractRecord>,
    pub inactive_contracts: Vec<AccAddress>,
    /// Next ids to assign, derived from the records when missing
    pub next_code_id: Option<CodeId>,
    pub next_instance_id: Option<InstanceId>,
}

fn invalid<T>(reason: String) -> Result<T, WasmError> {
    InvalidGenesisSnafu { reason }.fail()
}

impl WasmGenesis {
    pub fn validate(&self) -> Result<(), WasmError> {
        let mut code_ids = BTreeSet::new();
        for code in &self.codes {
            if !code_ids.insert(code.code_id) {
                return invalid(format!("duplicate code {}", code.code_id));
            }
            if self.next_code_id.is_some_and(|next| next <= code.code_id) {
                return invalid(format!("code {} not below next code id", code.code_id));
            }
        }

        let mut contracts = BTreeSet::new();
        for contract in &self.contracts {
            if !contracts.insert(contract.address) {
                return invalid(format!("duplicate contract {}", contract.address));
            }
            if !code_ids.contains(&contract.info.code_id) {
                return invalid(format!(
                    "contract {} of unknown code {}",
                    contract.address, contract.info.code_id
                ));
            }
            validate_label(&contract.info.label)?;
        }

        for inactive in &self.inactive_contracts {
            if !contracts.contains(inactive) {
                return invalid(format!("inactive contract {inactive} does not exist"));
            }
        }
        Ok(())
    }
}

impl WasmModule {
    pub(crate) fn init_genesis_tx(
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &WasmGenesis,
    ) -> DbTxResult<(), WasmError> {
        genesis.validate().context(TxSnafu)?;

        for code in &genesis.codes {
            Self::set_code_tx(dbtx, code.code_id, &code.info)?;
        }
        for contract in &genesis.contracts {
            Self::set_contract_tx(dbtx, contract.address, &contract.info)?;
        }
        for inactive in &genesis.inactive_contracts {
            Self::set_inactive_tx(dbtx, *inactive)?;
        }

        let next_code_id = genesis.next_code_id.unwrap_or_else(|| {
            genesis
                .codes
                .iter()
                .map(|c| c.code_id.saturating_add(1))
                .max()
                .unwrap_or(CodeId::new(1))
        });
        Self::set_next_code_id_tx(dbtx, next_code_id)?;
        let next_instance_id = genesis.next_instance_id.unwrap_or_else(|| {
            InstanceId::new(genesis.contracts.len() as u64).saturating_add(1)
        });
        Self::set_next_instance_id_tx(dbtx, next_instance_id)?;
        Ok(())
    }

    pub(crate) fn export_genesis_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<WasmGenesis> {
        Ok(WasmGenesis {
            codes: Self::codes_tx(dbtx)?
                .into_iter()
                .map(|(code_id, info)| CodeRecord { code_id, info })
                .collect(),
            contracts: Self::contracts_tx(dbtx)?
                .into_iter()
                .map(|(address, info)| ContractRecord { address, info })
                .collect(),
            inactive_contracts: Self::inactive_contracts_tx(dbtx)?,
            next_code_id: Some(Self::get_next_code_id_tx(dbtx)?),
            next_instance_id: Some(Self::get_next_instance_id_tx(dbtx)?),
        })
    }
}
