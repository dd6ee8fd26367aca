use serde::{Deserialize, Serialize};

use crate::module::ValidatorAuth;
use crate::params::ConsortiumParams;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsortiumGenesis {
    pub params: ConsortiumParams,
    pub validator_auths: Vec<ValidatorAuth>,
}
