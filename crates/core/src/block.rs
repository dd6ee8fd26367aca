use bincode::{Decode, Encode};
use lbm_util_array_type::{array_type_fixed_size_define, array_type_impl_serde_as_number};
use serde::{Deserialize, Serialize};

use crate::address::ValAddress;
use crate::timestamp::Timestamp;

array_type_fixed_size_define! {
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct BlockHeight(u64);
}
array_type_impl_serde_as_number!(BlockHeight, u64);

/// Block being executed, as seen by the modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: BlockHeight,
    pub time: Timestamp,
}

impl BlockContext {
    pub fn new(height: impl Into<BlockHeight>, time: Timestamp) -> Self {
        Self {
            height: height.into(),
            time,
        }
    }
}

/// A validator's participation in the previous block's commit
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct VoteInfo {
    pub validator: ValAddress,
    pub power: u64,
    pub signed_last_block: bool,
}

/// Consensus information delivered at the beginning of a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Proposer of the block being started
    pub proposer: Option<ValAddress>,
    /// Votes of the commit of the previous block
    pub votes: Vec<VoteInfo>,
}

impl BlockInfo {
    pub fn total_power(&self) -> u64 {
        self.votes.iter().map(|v| v.power).sum()
    }

    pub fn signed_power(&self) -> u64 {
        self.votes
            .iter()
            .filter(|v| v.signed_last_block)
            .map(|v| v.power)
            .sum()
    }
}
