use std::collections::BTreeSet;

use bincode::{Decode, Encode};
use lbm_core::module::ModuleKind;
use lbm_db::error::TxSnafu;
use lbm_module::event::ModuleEvent;
use lbm_module::module::db::{DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use lbm_module::proposal::{ProposalContent, ProposalHandler, ProposalKind};
use lbm_util_error::{Whatever, WhateverResult};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, ensure};

use crate::KIND;
use crate::error::{
    ConsortiumResult, DuplicateAuthSnafu, EmptyAuthsSnafu, EnablingNotSupportedSnafu,
    InvalidProposalSnafu,
};
use crate::module::{ConsortiumModule, ValidatorAuth};
use crate::params::ConsortiumParams;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UpdateConsortiumParamsProposal {
    pub params: ConsortiumParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UpdateValidatorAuthsProposal {
    pub auths: Vec<ValidatorAuth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ConsortiumProposal {
    UpdateConsortiumParams(UpdateConsortiumParamsProposal),
    UpdateValidatorAuths(UpdateValidatorAuthsProposal),
}

impl ProposalKind for ConsortiumProposal {
    const ROUTE: ModuleKind = KIND;
}

impl ConsortiumProposal {
    pub fn validate_basic(&self) -> ConsortiumResult<()> {
        match self {
            ConsortiumProposal::UpdateConsortiumParams(p) => {
                ensure!(!p.params.enabled, EnablingNotSupportedSnafu);
            }
            ConsortiumProposal::UpdateValidatorAuths(p) => {
                ensure!(!p.auths.is_empty(), EmptyAuthsSnafu);
                let mut seen = BTreeSet::new();
                for auth in &p.auths {
                    ensure!(
                        seen.insert(auth.operator_address),
                        DuplicateAuthSnafu {
                            operator: auth.operator_address
                        }
                    );
                }
            }
        }
        Ok(())
    }

    pub fn from_content_validated(content: &ProposalContent) -> ConsortiumResult<Self> {
        content.validate_basic().context(InvalidProposalSnafu)?;
        let proposal = Self::from_content(content).context(InvalidProposalSnafu)?;
        proposal.validate_basic()?;
        Ok(proposal)
    }
}

impl ProposalHandler for ConsortiumModule {
    fn validate_content(&self, content: &ProposalContent) -> WhateverResult<()> {
        ConsortiumProposal::from_content_validated(content).map_err(Whatever::from_error)?;
        Ok(())
    }

    fn execute_proposal(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        content: &ProposalContent,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        let proposal = ConsortiumProposal::from_content_validated(content)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;

        match proposal {
            ConsortiumProposal::UpdateConsortiumParams(p) => {
                ConsortiumModule::update_params_tx(&dbtx, p.params)
            }
            ConsortiumProposal::UpdateValidatorAuths(p) => {
                ConsortiumModule::update_validator_auths_tx(&dbtx, &p.auths)
            }
        }
        .map_err(DbTxError::whatever)
    }
}
