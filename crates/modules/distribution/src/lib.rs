// SPDX-License-Identifier: MIT

//! Distribution module
//!
//! Collects fees, splits them between the block proposer, the validators
//! that signed the previous block and the community pool, and lets
//! delegators withdraw their share lazily.
//!
//! Delegator rewards use "F1" fee distribution: every validator keeps a
//! running sum of rewards per token (the cumulative reward ratio) indexed
//! by period. A delegation remembers the period it started at, and its
//! rewards are the difference of the ratios times its stake. Periods end
//! whenever the stake of a validator's delegations changes, and slashes
//! end a period too, so that the stake can be reduced retroactively.

pub mod error;
pub mod events;
pub mod genesis;
pub mod init;
pub mod invariants;
pub mod module;
pub mod msg;
pub mod params;
pub mod proposal;
pub mod types;

mod allocation;
mod hooks;
mod rewards;
mod tables;

#[cfg(test)]
mod tests;

pub use self::init::*;
pub use self::module::*;

use lbm_core::module::ModuleKind;
use lbm_core::ver::{ConsensusVersion, ConsensusVersionMajor, ConsensusVersionMinor};

pub const KIND: ModuleKind = lbm_module::kinds::DISTRIBUTION;
const CURRENT_VERSION_MAJOR: ConsensusVersionMajor = ConsensusVersionMajor::new(0);
const CURRENT_VERSION_MINOR: ConsensusVersionMinor = ConsensusVersionMinor::new(0);
pub const CURRENT_VERSION: ConsensusVersion =
    ConsensusVersion::new_const(CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR);

/// Name of the module account holding all undistributed rewards
pub const MODULE_ACCOUNT: &str = "distribution";

const LOG_TARGET: &str = "lbm::distribution";
