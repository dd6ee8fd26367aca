// SPDX-License-Identifier: MIT

//! A chain in a temporary database, for driving [`App`] block by block

use std::sync::Arc;

use lbm_app::genesis::AppGenesis;
use lbm_app::msg::{AppBlock, AppTx};
use lbm_app::{App, BlockOutcome};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::{BlockContext, BlockInfo, VoteInfo};
use lbm_core::coin::Coins;
use lbm_core::timestamp::Timestamp;
use lbm_db::Database;
use lbm_util_error::WhateverResult;
use lbm_util_error::fmt::FmtCompact as _;
use snafu::{OptionExt as _, ResultExt as _, whatever};

pub const DENOM: &str = lbm_app::DEFAULT_BOND_DENOM;

/// Seconds between two blocks
pub const BLOCK_TIME_SECS: u64 = 5;

pub fn stake(amount: u128) -> Coins {
    Coins::single(DENOM, amount).expect("Valid denom")
}

pub fn acc(n: u8) -> AccAddress {
    AccAddress::from_bytes([n; 20])
}

pub fn val(n: u8) -> ValAddress {
    ValAddress::from_bytes([n; 20])
}

pub struct TestChain {
    pub app: App,
    /// Validators signing every block, with their power
    pub signers: Vec<(ValAddress, u64)>,
}

impl TestChain {
    pub async fn new() -> WhateverResult<Self> {
        let db = Arc::new(
            Database::new_in_memory()
                .await
                .whatever_context("Failed to create database")?,
        );
        let app = App::builder()
            .db(db)
            .build()
            .await
            .whatever_context("Failed to set up the app")?;
        Ok(Self {
            app,
            signers: vec![],
        })
    }

    pub async fn start(genesis: &AppGenesis) -> WhateverResult<Self> {
        let chain = Self::new().await?;
        chain
            .app
            .init_chain(genesis)
            .await
            .whatever_context("Failed to init chain")?;
        Ok(chain)
    }

    pub async fn last_block(&self) -> WhateverResult<BlockContext> {
        self.app
            .last_block()
            .await
            .whatever_context("Chain not initialized")
    }

    /// The block following the last one
    pub async fn next_block(&self, txs: Vec<AppTx>) -> WhateverResult<AppBlock> {
        let last = self.last_block().await?;
        let proposer = self.signers.first().map(|(validator, _)| *validator);
        Ok(AppBlock {
            height: last.height.saturating_add(1),
            time: last.time.add_secs(BLOCK_TIME_SECS),
            info: BlockInfo {
                proposer,
                votes: self
                    .signers
                    .iter()
                    .map(|(validator, power)| VoteInfo {
                        validator: *validator,
                        power: *power,
                        signed_last_block: true,
                    })
                    .collect(),
            },
            txs,
        })
    }

    pub async fn apply(&self, txs: Vec<AppTx>) -> WhateverResult<BlockOutcome> {
        let block = self.next_block(txs).await?;
        self.app
            .apply_block(&block)
            .await
            .whatever_context("Failed to apply block")
    }

    /// Apply `txs` in one block, requiring every one of them to succeed
    pub async fn apply_ok(&self, txs: Vec<AppTx>) -> WhateverResult<BlockOutcome> {
        let outcome = self.apply(txs).await?;
        for (index, res) in outcome.txs.iter().enumerate() {
            if let Err(err) = res {
                whatever!("Transaction {index} failed: {}", err.fmt_compact());
            }
        }
        Ok(outcome)
    }

    /// Apply empty blocks until the block time reaches `time`
    pub async fn advance_to(&self, time: Timestamp) -> WhateverResult<()> {
        while self.last_block().await?.time < time {
            self.apply(vec![]).await?;
        }
        Ok(())
    }
}
