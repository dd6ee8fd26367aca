// SPDX-License-Identifier: MIT

//! Core types shared by all the LBM modules
//!
//! Addresses, coin amounts and fixed point decimals, block context and the
//! raw message envelope. Focused on encoding and arithmetic; no storage
//! access happens here.

pub mod address;
pub mod bincode;
pub mod block;
pub mod coin;
pub mod dec;
pub mod dec_coin;
pub mod module;
pub mod msg;
pub mod timestamp;
pub mod ver;
