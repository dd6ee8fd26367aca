use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::module::ModuleKind;
use lbm_db::error::TxSnafu;
use lbm_module::event::ModuleEvent;
use lbm_module::module::db::{DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use lbm_module::proposal::{ProposalContent, ProposalHandler, ProposalKind};
use lbm_util_error::{Whatever, WhateverResult};
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::KIND;
use crate::error::{InvalidProposalSnafu, WasmResult};
use crate::module::WasmModule;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DeactivateContractProposal {
    pub contract: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ActivateContractProposal {
    pub contract: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UpdateAdminProposal {
    pub contract: AccAddress,
    pub new_admin: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ClearAdminProposal {
    pub contract: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum WasmProposal {
    DeactivateContract(DeactivateContractProposal),
    ActivateContract(ActivateContractProposal),
    UpdateAdmin(UpdateAdminProposal),
    ClearAdmin(ClearAdminProposal),
}

impl ProposalKind for WasmProposal {
    const ROUTE: ModuleKind = KIND;
}

impl WasmProposal {
    pub fn from_content_validated(content: &ProposalContent) -> WasmResult<Self> {
        content.validate_basic().context(InvalidProposalSnafu)?;
        Self::from_content(content).context(InvalidProposalSnafu)
    }
}

impl ProposalHandler for WasmModule {
    fn validate_content(&self, content: &ProposalContent) -> WhateverResult<()> {
        WasmProposal::from_content_validated(content).map_err(Whatever::from_error)?;
        Ok(())
    }

    fn execute_proposal(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        content: &ProposalContent,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        let proposal = WasmProposal::from_content_validated(content)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;

        match proposal {
            WasmProposal::DeactivateContract(p) => Self::deactivate_contract_tx(&dbtx, p.contract),
            WasmProposal::ActivateContract(p) => Self::activate_contract_tx(&dbtx, p.contract),
            WasmProposal::UpdateAdmin(p) => {
                Self::set_admin_tx(&dbtx, None, p.contract, Some(p.new_admin))
            }
            WasmProposal::ClearAdmin(p) => Self::set_admin_tx(&dbtx, None, p.contract, None),
        }
        .map_err(DbTxError::whatever)
    }
}
