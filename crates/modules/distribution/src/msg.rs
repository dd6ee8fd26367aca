use bincode::{Decode, Encode};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::coin::Coins;
use lbm_core::module::ModuleKind;
use lbm_module::msg::ModuleMsg;
use serde::{Deserialize, Serialize};

use crate::KIND;

/// Messages handled by the distribution module
///
/// The delegator (or validator operator) is always the signer.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum DistributionMsg {
    SetWithdrawAddress { withdraw_address: AccAddress },
    WithdrawDelegatorReward { validator: ValAddress },
    WithdrawValidatorCommission { validator: ValAddress },
    FundCommunityPool { amount: Coins },
}

impl ModuleMsg for DistributionMsg {
    const MODULE_KIND: ModuleKind = KIND;
}
