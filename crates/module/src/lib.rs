// SPDX-License-Identifier: MIT

//! Interface between the LBM application and its modules
//!
//! A module owns a namespace of the store, processes the messages addressed
//! to it, reacts to block boundaries and reports what happened as events.
//! Functionality provided by modules outside this repository (bank,
//! staking, the contract VM) is reached through the traits in [`keepers`].

pub mod event;
pub mod keepers;
pub mod kinds;
pub mod module;
pub mod msg;
pub mod proposal;
