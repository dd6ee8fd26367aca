// SPDX-License-Identifier: MIT

//! Governance module
//!
//! Proposals collect deposits until they reach the minimum deposit, are
//! then voted on by stakers for the voting period, and get tallied at the
//! end block following its end. Passing proposals are executed by the
//! module their content is routed to.

pub mod error;
pub mod events;
pub mod genesis;
pub mod init;
pub mod module;
pub mod msg;
pub mod params;
pub mod proposal;
pub mod types;

mod deposit;
mod end_block;
mod tables;
mod tally;
mod vote;

#[cfg(test)]
mod tests;

pub use self::init::*;
pub use self::module::*;

use lbm_core::module::ModuleKind;
use lbm_core::ver::{ConsensusVersion, ConsensusVersionMajor, ConsensusVersionMinor};

pub const KIND: ModuleKind = lbm_module::kinds::GOV;
const CURRENT_VERSION_MAJOR: ConsensusVersionMajor = ConsensusVersionMajor::new(0);
const CURRENT_VERSION_MINOR: ConsensusVersionMinor = ConsensusVersionMinor::new(0);
pub const CURRENT_VERSION: ConsensusVersion =
    ConsensusVersion::new_const(CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR);

/// Name of the module account holding deposits
pub const MODULE_ACCOUNT: &str = "gov";

const LOG_TARGET: &str = "lbm::gov";
