use lbm_core::block::{BlockContext, BlockHeight, BlockInfo};
use lbm_core::module::ModuleKind;
use lbm_core::msg::Tx;
use lbm_db::ctx::WriteTransactionCtx;
use lbm_db::error::{DbResult, TxSnafu};
use lbm_module::event::ModuleEvent;
use lbm_module::module::db::{DbTxResult, ModuleWriteTransactionCtx};
use lbm_module_consortium::genesis::ConsortiumGenesis;
use lbm_module_distribution::genesis::DistributionGenesis;
use lbm_module_gov::genesis::GovGenesis;
use lbm_module_wasm::genesis::WasmGenesis;
use lbm_util_db::redb_bincode::{ReadTransaction, ReadableTable as _};
use lbm_util_error::Whatever;
use lbm_util_error::fmt::FmtCompact as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{debug, info};

use crate::bank::{self, BankGenesis, BankLedger};
use crate::error::{
    AlreadyInitializedSnafu, AppError, AppResult, DeliverTxError, EmptyTxSnafu,
    NotInitializedSnafu, UnexpectedHeightSnafu, UnknownModuleSnafu,
};
use crate::genesis::AppGenesis;
use crate::msg::AppBlock;
use crate::staking::{self, StakingGenesis};
use crate::{App, LOG_TARGET, fee_collector, tables};

/// Everything that happened while applying a block
#[derive(Debug)]
pub struct BlockOutcome {
    pub begin_events: Vec<ModuleEvent>,
    /// One entry per transaction, in order
    pub txs: Vec<Result<Vec<ModuleEvent>, DeliverTxError>>,
    pub end_events: Vec<ModuleEvent>,
}

impl App {
    fn get_last_block_tx(dbtx: &WriteTransactionCtx) -> DbResult<Option<BlockContext>> {
        Ok(dbtx
            .open_table(&tables::last_block::TABLE)?
            .get(&())?
            .map(|v| v.value()))
    }

    fn set_last_block_tx(dbtx: &WriteTransactionCtx, block: &BlockContext) -> DbResult<()> {
        dbtx.open_table(&tables::last_block::TABLE)?
            .insert(&(), block)?;
        Ok(())
    }

    /// The last committed block, `None` before [`App::init_chain`]
    ///
    /// Right after genesis this is the genesis time, at the height before
    /// the initial one.
    pub async fn last_block(&self) -> Option<BlockContext> {
        self.db
            .read_with_expect(|dbtx: &ReadTransaction| {
                Ok(dbtx
                    .open_table(&tables::last_block::TABLE)?
                    .get(&())?
                    .map(|v| v.value()))
            })
            .await
    }

    fn expected_height_tx(dbtx: &WriteTransactionCtx) -> DbTxResult<BlockHeight, AppError> {
        let last = Self::get_last_block_tx(dbtx)?
            .context(NotInitializedSnafu)
            .context(TxSnafu)?;
        Ok(last.height.saturating_add(1))
    }

    fn module_genesis_tx(
        &self,
        dbtx: &WriteTransactionCtx,
        module: &'static str,
        kind: ModuleKind,
        genesis: &impl Serialize,
    ) -> DbTxResult<(), AppError> {
        let module_impl = self.modules.get(&kind).expect("All modules registered");
        module_impl
            .init_genesis(
                &ModuleWriteTransactionCtx::new(kind, dbtx),
                &serde_json::to_value(genesis).expect("Can't fail"),
            )
            .map_err(|e| e.map(|source| AppError::Genesis { module, source }))
    }

    /// Import the genesis state of all the modules
    ///
    /// Order matters: balances come first, as modules check their accounts
    /// against them, and distribution must be set up before the staking
    /// hooks call it.
    pub async fn init_chain(&self, genesis: &AppGenesis) -> AppResult<()> {
        self.db
            .write_with_expect_falliable(|dbtx| {
                if let Some(last) = Self::get_last_block_tx(dbtx)? {
                    return AlreadyInitializedSnafu {
                        height: last.height,
                    }
                    .fail()
                    .context(TxSnafu);
                }
                let block = BlockContext::new(genesis.initial_height, genesis.genesis_time);

                self.module_genesis_tx(dbtx, "bank", bank::KIND, &genesis.bank)?;
                self.module_genesis_tx(
                    dbtx,
                    "distribution",
                    lbm_module_distribution::KIND,
                    &genesis.distribution,
                )?;
                self.staking
                    .init_genesis_tx(
                        &ModuleWriteTransactionCtx::new(staking::KIND, dbtx),
                        &block,
                        &genesis.staking,
                    )
                    .map_err(|e| {
                        e.map(|source| AppError::Genesis {
                            module: "staking",
                            source: Whatever::from_error(source),
                        })
                    })?;
                self.module_genesis_tx(
                    dbtx,
                    "consortium",
                    lbm_module_consortium::KIND,
                    &genesis.consortium,
                )?;
                self.module_genesis_tx(dbtx, "gov", lbm_module_gov::KIND, &genesis.gov)?;
                self.module_genesis_tx(dbtx, "wasm", lbm_module_wasm::KIND, &genesis.wasm)?;

                let last = BlockContext::new(
                    genesis
                        .initial_height
                        .prev()
                        .unwrap_or(BlockHeight::ZERO),
                    genesis.genesis_time,
                );
                Self::set_last_block_tx(dbtx, &last)?;
                Ok(())
            })
            .await?;

        info!(
            target: LOG_TARGET,
            initial_height = %genesis.initial_height,
            "Chain initialized"
        );
        Ok(())
    }

    pub async fn begin_block(
        &self,
        block: &BlockContext,
        info: &BlockInfo,
    ) -> AppResult<Vec<ModuleEvent>> {
        self.db
            .write_with_expect_falliable(|dbtx| {
                let expected = Self::expected_height_tx(dbtx)?;
                if block.height != expected {
                    return UnexpectedHeightSnafu {
                        height: block.height,
                        expected,
                    }
                    .fail()
                    .context(TxSnafu);
                }

                let mut events = vec![];
                for (kind, module) in &self.modules {
                    events.extend(
                        module
                            .begin_block(&ModuleWriteTransactionCtx::new(*kind, dbtx), block, info)
                            .map_err(|e| {
                                e.map(|source| AppError::BeginBlock {
                                    module: *kind,
                                    source,
                                })
                            })?,
                    );
                }
                Ok(events)
            })
            .await
    }

    /// Execute a transaction
    ///
    /// The fee is paid to the fee collector first, in its own database
    /// transaction. The messages then run all together: if any fails,
    /// none of them has any effect, but the fee stays paid.
    pub async fn deliver_tx(
        &self,
        block: &BlockContext,
        tx: &Tx,
    ) -> Result<Vec<ModuleEvent>, DeliverTxError> {
        if tx.msgs.is_empty() {
            return EmptyTxSnafu.fail();
        }
        if !tx.fee.is_zero() {
            self.db
                .write_with_expect_falliable(|dbtx| {
                    BankLedger::send_tx(
                        &ModuleWriteTransactionCtx::new(bank::KIND, dbtx),
                        tx.signer,
                        fee_collector(),
                        &tx.fee,
                    )
                    .map_err(|e| e.map(|source| DeliverTxError::Fee { source }))
                })
                .await?;
        }

        let res = self
            .db
            .write_with_expect_falliable(|dbtx| {
                let mut events = vec![];
                for (index, msg) in tx.msgs.iter().enumerate() {
                    let module = self
                        .modules
                        .get(&msg.module)
                        .context(UnknownModuleSnafu {
                            index,
                            module: msg.module,
                        })
                        .context(TxSnafu)?;
                    events.extend(
                        module
                            .process_msg(
                                &ModuleWriteTransactionCtx::new(msg.module, dbtx),
                                block,
                                tx.signer,
                                msg,
                            )
                            .map_err(|e| {
                                e.map(|source| DeliverTxError::Msg {
                                    index,
                                    module: msg.module,
                                    source,
                                })
                            })?,
                    );
                }
                Ok(events)
            })
            .await;

        match &res {
            Ok(events) => {
                debug!(target: LOG_TARGET, signer = %tx.signer, events = events.len(), "Transaction executed");
            }
            Err(err) => {
                debug!(target: LOG_TARGET, signer = %tx.signer, err = %err.fmt_compact(), "Transaction failed");
            }
        }
        res
    }

    /// Run every module's end block, then the handlers of passed proposals
    pub async fn end_block(&self, block: &BlockContext) -> AppResult<Vec<ModuleEvent>> {
        let mut events = self
            .db
            .write_with_expect_falliable(|dbtx| -> DbTxResult<_, AppError> {
                let mut events = vec![];
                for (kind, module) in &self.modules {
                    events.extend(
                        module
                            .end_block(&ModuleWriteTransactionCtx::new(*kind, dbtx), block)
                            .map_err(|e| {
                                e.map(|source| AppError::EndBlock {
                                    module: *kind,
                                    source,
                                })
                            })?,
                    );
                }
                Ok(events)
            })
            .await?;
        events.extend(self.gov.execute_passed_proposals().await);
        Ok(events)
    }

    /// Record `block` as the last one applied
    pub async fn commit(&self, block: &BlockContext) {
        self.db
            .write_with_expect(|dbtx| Self::set_last_block_tx(dbtx, block))
            .await;
        debug!(target: LOG_TARGET, height = %block.height, "Block committed");
    }

    /// Run all the phases of `block`
    pub async fn apply_block(&self, block: &AppBlock) -> AppResult<BlockOutcome> {
        let ctx = block.context();
        let begin_events = self.begin_block(&ctx, &block.info).await?;
        let mut txs = Vec::with_capacity(block.txs.len());
        for tx in &block.txs {
            txs.push(self.deliver_tx(&ctx, &tx.to_tx()).await);
        }
        let end_events = self.end_block(&ctx).await?;
        self.commit(&ctx).await;

        info!(
            target: LOG_TARGET,
            height = %ctx.height,
            txs = txs.len(),
            failed = txs.iter().filter(|r| r.is_err()).count(),
            "Block applied"
        );
        Ok(BlockOutcome {
            begin_events,
            txs,
            end_events,
        })
    }

    /// Export the current state, so that a new chain can start from it
    ///
    /// The exported chain continues at the height after the last committed
    /// block.
    pub async fn export_genesis(&self) -> AppResult<AppGenesis> {
        self.db
            .simulate_with_expect(|dbtx| {
                let Some(last) = Self::get_last_block_tx(dbtx)? else {
                    return Ok(None);
                };
                let section = |kind: ModuleKind| -> DbResult<serde_json::Value> {
                    let module = self.modules.get(&kind).expect("All modules registered");
                    module.export_genesis(&ModuleWriteTransactionCtx::new(kind, dbtx))
                };
                Ok(Some(AppGenesis {
                    genesis_time: last.time,
                    initial_height: last.height.saturating_add(1),
                    bank: parse_section::<BankGenesis>(section(bank::KIND)?),
                    staking: parse_section::<StakingGenesis>(section(staking::KIND)?),
                    distribution: parse_section::<DistributionGenesis>(section(
                        lbm_module_distribution::KIND,
                    )?),
                    consortium: parse_section::<ConsortiumGenesis>(section(
                        lbm_module_consortium::KIND,
                    )?),
                    gov: parse_section::<GovGenesis>(section(lbm_module_gov::KIND)?),
                    wasm: parse_section::<WasmGenesis>(section(lbm_module_wasm::KIND)?),
                }))
            })
            .await
            .ok_or(AppError::NotInitialized)
    }
}

fn parse_section<T: DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).expect("Modules export their own genesis format")
}
