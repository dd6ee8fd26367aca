use lbm_core::block::BlockHeight;
use lbm_core::timestamp::Timestamp;
use lbm_module_consortium::genesis::ConsortiumGenesis;
use lbm_module_distribution::genesis::DistributionGenesis;
use lbm_module_gov::genesis::GovGenesis;
use lbm_module_wasm::genesis::WasmGenesis;
use serde::{Deserialize, Serialize};

use crate::bank::BankGenesis;
use crate::staking::StakingGenesis;

fn default_initial_height() -> BlockHeight {
    BlockHeight::new(1)
}

/// State of the whole chain, as read from and written to genesis files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppGenesis {
    pub genesis_time: Timestamp,
    /// Height of the first block to apply
    #[serde(default = "default_initial_height")]
    pub initial_height: BlockHeight,
    #[serde(default)]
    pub bank: BankGenesis,
    #[serde(default)]
    pub staking: StakingGenesis,
    #[serde(default)]
    pub distribution: DistributionGenesis,
    #[serde(default)]
    pub consortium: ConsortiumGenesis,
    #[serde(default)]
    pub gov: GovGenesis,
    #[serde(default)]
    pub wasm: WasmGenesis,
}

impl AppGenesis {
    pub fn new(genesis_time: Timestamp) -> Self {
        Self {
            genesis_time,
            initial_height: default_initial_height(),
            bank: Default::default(),
            staking: Default::default(),
            distribution: Default::default(),
            consortium: Default::default(),
            gov: Default::default(),
            wasm: Default::default(),
        }
    }
}
