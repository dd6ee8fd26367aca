use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::coin::Coins;
use lbm_core::module::ModuleKind;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::module::db::{DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use lbm_module::proposal::{ProposalContent, ProposalHandler, ProposalKind};
use lbm_util_error::{Whatever, WhateverResult};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, ensure};

use crate::error::{
    BlockedAddressSnafu, DistributionError, DistributionResult, InvalidProposalAmountSnafu,
    InvalidProposalSnafu,
};
use crate::events::EventUpdateParams;
use crate::params::DistributionParams;
use crate::{DistributionModule, KIND};

/// Pay `amount` from the community pool to `recipient`
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct CommunityPoolSpendProposal {
    pub recipient: AccAddress,
    pub amount: Coins,
}

/// Replace the module params
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UpdateDistributionParamsProposal {
    pub params: DistributionParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum DistributionProposal {
    CommunityPoolSpend(CommunityPoolSpendProposal),
    UpdateParams(UpdateDistributionParamsProposal),
}

impl ProposalKind for DistributionProposal {
    const ROUTE: ModuleKind = KIND;
}

impl From<CommunityPoolSpendProposal> for DistributionProposal {
    fn from(proposal: CommunityPoolSpendProposal) -> Self {
        Self::CommunityPoolSpend(proposal)
    }
}

impl From<UpdateDistributionParamsProposal> for DistributionProposal {
    fn from(proposal: UpdateDistributionParamsProposal) -> Self {
        Self::UpdateParams(proposal)
    }
}

impl DistributionProposal {
    pub fn validate_basic(&self) -> DistributionResult<()> {
        match self {
            DistributionProposal::CommunityPoolSpend(p) => {
                ensure!(!p.amount.is_zero(), InvalidProposalAmountSnafu);
            }
            DistributionProposal::UpdateParams(p) => p.params.validate()?,
        }
        Ok(())
    }

    pub fn from_content_validated(content: &ProposalContent) -> DistributionResult<Self> {
        content.validate_basic().context(InvalidProposalSnafu)?;
        let proposal = Self::from_content(content).context(InvalidProposalSnafu)?;
        proposal.validate_basic()?;
        Ok(proposal)
    }
}

impl DistributionModule {
    fn execute_community_pool_spend_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        proposal: &CommunityPoolSpendProposal,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        if self.bank.is_blocked(proposal.recipient) {
            return BlockedAddressSnafu {
                addr: proposal.recipient,
            }
            .fail()
            .context(TxSnafu);
        }
        self.distribute_from_fee_pool_tx(dbtx, &proposal.amount, proposal.recipient)
    }

    fn execute_update_params_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal: &UpdateDistributionParamsProposal,
    ) -> DbTxResult<Vec<ModuleEvent>, DistributionError> {
        Self::set_params_tx(dbtx, &proposal.params)?;
        Ok(vec![
            EventUpdateParams {
                params: proposal.params.clone(),
            }
            .to_event(),
        ])
    }
}

impl ProposalHandler for DistributionModule {
    fn validate_content(&self, content: &ProposalContent) -> WhateverResult<()> {
        DistributionProposal::from_content_validated(content).map_err(Whatever::from_error)?;
        Ok(())
    }

    fn execute_proposal(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        content: &ProposalContent,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let dbtx = dbtx.rescope(KIND);
        let proposal = DistributionProposal::from_content_validated(content)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;
        match proposal {
            DistributionProposal::CommunityPoolSpend(p) => {
                self.execute_community_pool_spend_tx(&dbtx, &p)
            }
            DistributionProposal::UpdateParams(p) => Self::execute_update_params_tx(&dbtx, &p),
        }
        .map_err(DbTxError::whatever)
    }
}
