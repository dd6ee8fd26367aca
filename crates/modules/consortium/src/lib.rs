// SPDX-License-Identifier: MIT

//! Consortium module
//!
//! Restricts validator creation to operators authorized through
//! governance. Once disabled (which is the only parameter change
//! governance can make) anyone may create a validator and all the
//! authorizations are dropped.

pub mod error;
pub mod events;
pub mod genesis;
pub mod init;
pub mod module;
pub mod params;
pub mod proposal;

pub use self::init::*;
pub use self::module::*;

mod tables;


use lbm_core::module::ModuleKind;
use lbm_core::ver::{ConsensusVersion, ConsensusVersionMajor, ConsensusVersionMinor};

pub const KIND: ModuleKind = lbm_module::kinds::CONSORTIUM;
const CURRENT_VERSION_MAJOR: ConsensusVersionMajor = ConsensusVersionMajor::new(0);
const CURRENT_VERSION_MINOR: ConsensusVersionMinor = ConsensusVersionMinor::new(0);
pub const CURRENT_VERSION: ConsensusVersion =
    ConsensusVersion::new_const(CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR);

const LOG_TARGET: &str = "lbm::consortium";
