// SPDX-License-Identifier: MIT

//! Wasm contracts module
//!
//! Keeps the registry of uploaded code and instantiated contracts and
//! gates them: governance can deactivate a contract, after which it can't
//! be executed, migrated or have its admin changed until it gets activated
//! again. Running contract code is left to a [`WasmEngine`].

pub mod engine;
pub mod error;
pub mod events;
pub mod genesis;
pub mod init;
pub mod module;
pub mod msg;
pub mod proposal;
pub mod types;

pub use self::engine::*;
pub use self::init::*;
pub use self::module::*;

mod activation;
mod contract;
mod tables;


use lbm_core::module::ModuleKind;
use lbm_core::ver::{ConsensusVersion, ConsensusVersionMajor, ConsensusVersionMinor};

pub const KIND: ModuleKind = lbm_module::kinds::WASM;
const CURRENT_VERSION_MAJOR: ConsensusVersionMajor = ConsensusVersionMajor::new(0);
const CURRENT_VERSION_MINOR: ConsensusVersionMinor = ConsensusVersionMinor::new(0);
pub const CURRENT_VERSION: ConsensusVersion =
    ConsensusVersion::new_const(CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR);

const LOG_TARGET: &str = "lbm::wasm";
