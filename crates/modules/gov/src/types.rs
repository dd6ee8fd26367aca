use std::fmt;

use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_core::timestamp::Timestamp;
use lbm_module::proposal::ProposalContent;
use lbm_util_array_type::{array_type_fixed_size_define, array_type_impl_serde_as_number};
use serde::{Deserialize, Serialize};

array_type_fixed_size_define! {
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct ProposalId(u64);
}
array_type_impl_serde_as_number!(ProposalId, u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    DepositPeriod,
    VotingPeriod,
    Passed,
    Rejected,
    /// Passed, but its execution failed
    Failed,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProposalStatus::DepositPeriod => "deposit_period",
            ProposalStatus::VotingPeriod => "voting_period",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct WeightedVoteOption {
    pub option: VoteOption,
    pub weight: Dec,
}

impl WeightedVoteOption {
    /// The whole vote for a single option
    pub fn full(option: VoteOption) -> Self {
        Self {
            option,
            weight: Dec::one(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter: AccAddress,
    pub options: Vec<WeightedVoteOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Deposit {
    pub proposal_id: ProposalId,
    pub depositor: AccAddress,
    pub amount: Coins,
}

/// Voting power per option, in bond tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TallyResult {
    #[serde(with = "lbm_core::coin::amount_str")]
    pub yes: u128,
    #[serde(with = "lbm_core::coin::amount_str")]
    pub abstain: u128,
    #[serde(with = "lbm_core::coin::amount_str")]
    pub no: u128,
    #[serde(with = "lbm_core::coin::amount_str")]
    pub no_with_veto: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub content: ProposalContent,
    pub status: ProposalStatus,
    /// Set once the voting period ended
    pub final_tally_result: TallyResult,
    pub submit_time: Timestamp,
    pub deposit_end_time: Timestamp,
    pub total_deposit: Coins,
    pub voting_start_time: Option<Timestamp>,
    pub voting_end_time: Option<Timestamp>,
}
