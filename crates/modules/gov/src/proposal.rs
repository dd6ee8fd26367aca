use bincode::{Decode, Encode};
use lbm_core::module::ModuleKind;
use lbm_module::proposal::{ProposalContent, ProposalKind};
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::KIND;
use crate::error::{GovResult, InvalidProposalSnafu};
use crate::params::GovParams;

/// Replace the governance params
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UpdateGovParamsProposal {
    pub params: GovParams,
}

/// Proposals executed by gov itself
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum GovProposal {
    /// Nothing to execute, for signaling
    Text,
    UpdateParams(UpdateGovParamsProposal),
}

impl ProposalKind for GovProposal {
    const ROUTE: ModuleKind = KIND;
}

impl From<UpdateGovParamsProposal> for GovProposal {
    fn from(value: UpdateGovParamsProposal) -> Self {
        Self::UpdateParams(value)
    }
}

impl GovProposal {
    pub fn validate_basic(&self) -> GovResult<()> {
        match self {
            GovProposal::Text => {}
            GovProposal::UpdateParams(p) => p.params.validate()?,
        }
        Ok(())
    }

    pub fn from_content_validated(content: &ProposalContent) -> GovResult<Self> {
        content.validate_basic().context(InvalidProposalSnafu)?;
        let proposal = Self::from_content(content).context(InvalidProposalSnafu)?;
        proposal.validate_basic()?;
        Ok(proposal)
    }
}
