use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockHeight;
use lbm_core::dec_coin::DecCoins;
use lbm_core::ver::ConsensusVersion;
use lbm_util_db::def_table;

use crate::params::DistributionParams;
use crate::types::{
    DelegatorStartingInfo, FeePool, Period, ValidatorCurrentRewards, ValidatorHistoricalRewards,
    ValidatorSlashEvent,
};

def_table! {
    /// Own current consensus version
    self_version: () => ConsensusVersion
}

def_table! {
    params: () => DistributionParams
}

def_table! {
    fee_pool: () => FeePool
}

def_table! {
    /// Proposer of the previous block, rewarded at the start of the next one
    previous_proposer: () => ValAddress
}

def_table! {
    /// Where delegators want their rewards sent, if not to themselves
    withdraw_addrs: AccAddress => AccAddress
}

def_table! {
    /// Rewards allocated to a validator and its delegators, not withdrawn yet
    outstanding_rewards: ValAddress => DecCoins
}

def_table! {
    accumulated_commission: ValAddress => DecCoins
}

def_table! {
    historical_rewards: (ValAddress, Period) => ValidatorHistoricalRewards
}

def_table! {
    current_rewards: ValAddress => ValidatorCurrentRewards
}

def_table! {
    starting_infos: (ValAddress, AccAddress) => DelegatorStartingInfo
}

def_table! {
    slash_events: (ValAddress, BlockHeight, Period) => ValidatorSlashEvent
}
