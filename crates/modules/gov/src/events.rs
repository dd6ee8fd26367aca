use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::coin::Coins;
use lbm_core::module::ModuleKind;
use lbm_module::event::{EventId, EventKind};
use serde::{Deserialize, Serialize};

use crate::KIND;
use crate::params::GovParams;
use crate::types::{ProposalId, ProposalStatus, WeightedVoteOption};

macro_rules! event_kind {
    ($name:ident, $id:expr, $str:expr) => {
        impl EventKind for $name {
            const MODULE_KIND: ModuleKind = KIND;
            const EVENT_ID: EventId = EventId::new($id);
            const NAME: &'static str = $str;
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventSubmitProposal {
    pub proposal_id: ProposalId,
    pub route: ModuleKind,
}
event_kind!(EventSubmitProposal, 0, "submit_proposal");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventProposalDeposit {
    pub proposal_id: ProposalId,
    pub depositor: AccAddress,
    pub amount: Coins,
}
event_kind!(EventProposalDeposit, 1, "proposal_deposit");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventVotingPeriodStart {
    pub proposal_id: ProposalId,
}
event_kind!(EventVotingPeriodStart, 2, "voting_period_start");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventProposalVote {
    pub proposal_id: ProposalId,
    pub voter: AccAddress,
    pub options: Vec<WeightedVoteOption>,
}
event_kind!(EventProposalVote, 3, "proposal_vote");

/// Deposit period ended without reaching the minimum deposit
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventProposalDropped {
    pub proposal_id: ProposalId,
}
event_kind!(EventProposalDropped, 4, "proposal_dropped");

/// Voting period ended
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventProposalFinished {
    pub proposal_id: ProposalId,
    pub status: ProposalStatus,
}
event_kind!(EventProposalFinished, 5, "proposal_finished");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventUpdateParams {
    pub params: GovParams,
}
event_kind!(EventUpdateParams, 6, "update_params");
