use lbm_core::address::ValAddress;
use lbm_util_db::def_table;

use crate::params::ConsortiumParams;
use crate::module::ValidatorAuth;

def_table! {
    /// Own current consensus version
    self_version: () => lbm_core::ver::ConsensusVersion
}

def_table! {
    params: () => ConsortiumParams
}

def_table! {
    /// Validator creation authorizations by operator
    validator_auths: ValAddress => ValidatorAuth
}
