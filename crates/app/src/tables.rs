use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockContext;
use lbm_core::coin::Coins;
use lbm_module::keepers::{DelegationInfo, ValidatorInfo};
use lbm_util_db::def_table;

def_table! {
    /// The last committed block, or the genesis time and the height before
    /// the initial one
    last_block: () => BlockContext
}

def_table! {
    /// Bank: non-zero balances only
    balances: AccAddress => Coins
}

def_table! {
    /// Bank: total of all the balances
    supply: () => Coins
}

def_table! {
    /// Staking
    validators: ValAddress => ValidatorInfo
}

def_table! {
    /// Staking
    delegations: (AccAddress, ValAddress) => DelegationInfo
}
