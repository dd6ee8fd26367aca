//! Human writable transactions and blocks
//!
//! Module messages are bincode encoded on the wire. These types mirror
//! them in JSON friendly form, for block files and tests.

use lbm_core::address::AccAddress;
use lbm_core::block::{BlockContext, BlockHeight, BlockInfo};
use lbm_core::coin::Coins;
use lbm_core::msg::{MsgRaw, Tx};
use lbm_core::timestamp::Timestamp;
use lbm_module::msg::ModuleMsg as _;
use lbm_module::proposal::{ProposalContent, ProposalKind as _};
use lbm_module_consortium::proposal::ConsortiumProposal;
use lbm_module_distribution::msg::DistributionMsg;
use lbm_module_distribution::proposal::{
    CommunityPoolSpendProposal, DistributionProposal, UpdateDistributionParamsProposal,
};
use lbm_module_gov::msg::GovMsg;
use lbm_module_gov::proposal::{GovProposal, UpdateGovParamsProposal};
use lbm_module_wasm::msg::WasmMsg;
use lbm_module_wasm::proposal::WasmProposal;
use serde::{Deserialize, Serialize};

use crate::bank::BankMsg;
use crate::staking::StakingMsg;

/// What a governance proposal does once passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppProposal {
    Text,
    GovParams(UpdateGovParamsProposal),
    Consortium(ConsortiumProposal),
    CommunityPoolSpend(CommunityPoolSpendProposal),
    DistributionParams(UpdateDistributionParamsProposal),
    Wasm(WasmProposal),
}

impl AppProposal {
    pub fn to_content(&self, title: &str, description: &str) -> ProposalContent {
        match self {
            AppProposal::Text => GovProposal::Text.into_content(title, description),
            AppProposal::GovParams(p) => {
                GovProposal::from(p.clone()).into_content(title, description)
            }
            AppProposal::Consortium(p) => p.into_content(title, description),
            AppProposal::CommunityPoolSpend(p) => {
                DistributionProposal::from(p.clone()).into_content(title, description)
            }
            AppProposal::DistributionParams(p) => {
                DistributionProposal::from(p.clone()).into_content(title, description)
            }
            AppProposal::Wasm(p) => p.into_content(title, description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMsg {
    Bank(BankMsg),
    Staking(StakingMsg),
    Distribution(DistributionMsg),
    SubmitProposal {
        title: String,
        description: String,
        proposal: AppProposal,
        #[serde(default)]
        initial_deposit: Coins,
    },
    /// Any other gov message
    Gov(GovMsg),
    Wasm(WasmMsg),
}

impl AppMsg {
    pub fn to_raw(&self) -> MsgRaw {
        match self {
            AppMsg::Bank(msg) => msg.encode_to_raw(),
            AppMsg::Staking(msg) => msg.encode_to_raw(),
            AppMsg::Distribution(msg) => msg.encode_to_raw(),
            AppMsg::SubmitProposal {
                title,
                description,
                proposal,
                initial_deposit,
            } => GovMsg::SubmitProposal {
                content: proposal.to_content(title, description),
                initial_deposit: initial_deposit.clone(),
            }
            .encode_to_raw(),
            AppMsg::Gov(msg) => msg.encode_to_raw(),
            AppMsg::Wasm(msg) => msg.encode_to_raw(),
        }
    }
}

impl From<BankMsg> for AppMsg {
    fn from(msg: BankMsg) -> Self {
        Self::Bank(msg)
    }
}

impl From<StakingMsg> for AppMsg {
    fn from(msg: StakingMsg) -> Self {
        Self::Staking(msg)
    }
}

impl From<DistributionMsg> for AppMsg {
    fn from(msg: DistributionMsg) -> Self {
        Self::Distribution(msg)
    }
}

impl From<GovMsg> for AppMsg {
    fn from(msg: GovMsg) -> Self {
        Self::Gov(msg)
    }
}

impl From<WasmMsg> for AppMsg {
    fn from(msg: WasmMsg) -> Self {
        Self::Wasm(msg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTx {
    pub signer: AccAddress,
    #[serde(default)]
    pub fee: Coins,
    pub msgs: Vec<AppMsg>,
}

impl AppTx {
    pub fn new(signer: AccAddress, msgs: impl IntoIterator<Item = AppMsg>) -> Self {
        Self {
            signer,
            fee: Coins::empty(),
            msgs: msgs.into_iter().collect(),
        }
    }

    pub fn with_fee(mut self, fee: Coins) -> Self {
        self.fee = fee;
        self
    }

    pub fn to_tx(&self) -> Tx {
        Tx {
            signer: self.signer,
            fee: self.fee.clone(),
            msgs: self.msgs.iter().map(AppMsg::to_raw).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBlock {
    pub height: BlockHeight,
    pub time: Timestamp,
    #[serde(default)]
    pub info: BlockInfo,
    #[serde(default)]
    pub txs: Vec<AppTx>,
}

impl AppBlock {
    pub fn context(&self) -> BlockContext {
        BlockContext::new(self.height, self.time)
    }
}
