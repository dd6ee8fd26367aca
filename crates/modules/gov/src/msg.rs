use bincode::{Decode, Encode};
use lbm_core::coin::Coins;
use lbm_core::module::ModuleKind;
use lbm_module::msg::ModuleMsg;
use lbm_module::proposal::ProposalContent;
use serde::{Deserialize, Serialize};

use crate::KIND;
use crate::types::{ProposalId, VoteOption, WeightedVoteOption};

/// Messages handled by the gov module; the signer is the proposer,
/// depositor or voter
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum GovMsg {
    SubmitProposal {
        content: ProposalContent,
        initial_deposit: Coins,
    },
    Deposit {
        proposal_id: ProposalId,
        amount: Coins,
    },
    Vote {
        proposal_id: ProposalId,
        option: VoteOption,
    },
    VoteWeighted {
        proposal_id: ProposalId,
        options: Vec<WeightedVoteOption>,
    },
}

impl ModuleMsg for GovMsg {
    const MODULE_KIND: ModuleKind = KIND;
}
