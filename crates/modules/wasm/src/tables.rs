use lbm_core::address::AccAddress;
use lbm_core::ver::ConsensusVersion;
use lbm_util_db::def_table;

use crate::types::{CodeId, CodeInfo, ContractInfo, InstanceId};

def_table! {
    /// Own current consensus version
    self_version: () => ConsensusVersion
}

def_table! {
    /// Id the next stored code gets
    next_code_id: () => CodeId
}

def_table! {
    /// Id the next instantiated contract gets
    next_instance_id: () => InstanceId
}

def_table! {
    codes: CodeId => CodeInfo
}

def_table! {
    contracts: AccAddress => ContractInfo
}

def_table! {
    /// Deactivated contracts
    inactive_contracts: AccAddress => ()
}
