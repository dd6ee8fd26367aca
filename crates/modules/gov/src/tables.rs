use lbm_core::address::AccAddress;
use lbm_core::coin::Coins;
use lbm_core::timestamp::Timestamp;
use lbm_core::ver::ConsensusVersion;
use lbm_util_db::def_table;

use crate::params::GovParams;
use crate::types::{Proposal, ProposalId, WeightedVoteOption};

def_table! {
    /// Own current consensus version
    self_version: () => ConsensusVersion
}

def_table! {
    params: () => GovParams
}

def_table! {
    next_proposal_id: () => ProposalId
}

def_table! {
    proposals: ProposalId => Proposal
}

def_table! {
    /// Proposals in the deposit period, by deposit end time
    inactive_queue: (Timestamp, ProposalId) => ()
}

def_table! {
    /// Proposals in the voting period, by voting end time
    active_queue: (Timestamp, ProposalId) => ()
}

def_table! {
    deposits: (ProposalId, AccAddress) => Coins
}

def_table! {
    votes: (ProposalId, AccAddress) => Vec<WeightedVoteOption>
}

def_table! {
    /// Passed proposals waiting for their handler to run
    execution_queue: ProposalId => ()
}
