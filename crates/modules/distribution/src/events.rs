use bincode::{Decode, Encode};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::coin::Coins;
use lbm_core::dec_coin::DecCoins;
use lbm_core::module::ModuleKind;
use lbm_module::event::{EventId, EventKind};
use serde::{Deserialize, Serialize};

use crate::KIND;
use crate::params::DistributionParams;

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
pub struct EventProposerReward {
    pub validator: ValAddress,
    pub amount: DecCoins,
}
event_kind!(EventProposerReward, 0, "proposer_reward");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventCommission {
    pub validator: ValAddress,
    pub amount: DecCoins,
}
event_kind!(EventCommission, 1, "commission");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventRewards {
    pub validator: ValAddress,
    pub amount: DecCoins,
}
event_kind!(EventRewards, 2, "rewards");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventWithdrawRewards {
    pub validator: ValAddress,
    pub delegator: AccAddress,
    pub amount: Coins,
}
event_kind!(EventWithdrawRewards, 3, "withdraw_rewards");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventWithdrawCommission {
    pub validator: ValAddress,
    pub amount: Coins,
}
event_kind!(EventWithdrawCommission, 4, "withdraw_commission");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventSetWithdrawAddress {
    pub delegator: AccAddress,
    pub withdraw_address: AccAddress,
}
event_kind!(EventSetWithdrawAddress, 5, "set_withdraw_address");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventFundCommunityPool {
    pub depositor: AccAddress,
    pub amount: Coins,
}
event_kind!(EventFundCommunityPool, 6, "fund_community_pool");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventCommunityPoolSpend {
    pub recipient: AccAddress,
    pub amount: Coins,
}
event_kind!(EventCommunityPoolSpend, 7, "community_pool_spend");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventUpdateParams {
    pub params: DistributionParams,
}
event_kind!(EventUpdateParams, 8, "update_params");
