// SPDX-License-Identifier: MIT

//! The LBM application
//!
//! Wires the modules together over one database: bank and staking ledgers
//! serve as the keepers of the modules, distribution listens to the staking
//! hooks, consortium gates validator creation, and gov routes passed
//! proposals to the modules that handle them.
//!
//! Blocks are applied in phases ([`App::begin_block`],
//! [`App::deliver_tx`] for each transaction, [`App::end_block`],
//! [`App::commit`]), each in its own database transaction.

pub mod bank;
mod block;
pub mod error;
pub mod genesis;
pub mod msg;
pub mod staking;
mod tables;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use bank::BankLedger;
pub use block::BlockOutcome;
use error::{AppResult, ModuleInitSnafu};
use lbm_core::address::AccAddress;
use lbm_core::module::ModuleKind;
use lbm_db::Database;
use lbm_module::keepers::FEE_COLLECTOR_ACCOUNT;
use lbm_module::module::db::{ModuleDatabase, ModuleWriteTransactionCtx};
use lbm_module::module::{DynModule, ModuleInitArgs};
use lbm_module::proposal::ProposalRouter;
use lbm_module_consortium::{ConsortiumModule, ConsortiumModuleInit};
use lbm_module_distribution::{DistributionModule, DistributionModuleInit};
use lbm_module_gov::{GovModule, GovModuleInit};
use lbm_module_wasm::{DynWasmEngine, RegistryOnlyEngine, WasmModule, WasmModuleInit};
use snafu::ResultExt as _;
use staking::StakingLedger;
use tracing::debug;

const LOG_TARGET: &str = "lbm::app";

pub const DEFAULT_BOND_DENOM: &str = "stake";

pub fn fee_collector() -> AccAddress {
    AccAddress::module(FEE_COLLECTOR_ACCOUNT)
}

pub struct App {
    db: Arc<Database>,
    bank: Arc<BankLedger>,
    staking: Arc<StakingLedger>,
    consortium: Arc<ConsortiumModule>,
    distribution: Arc<DistributionModule>,
    gov: Arc<GovModule>,
    wasm: Arc<WasmModule>,
    /// Everything that processes messages and block boundaries, by kind
    modules: BTreeMap<ModuleKind, DynModule>,
}

#[bon::bon]
impl App {
    /// Set up all the modules over `db`
    ///
    /// Without an `engine` contracts are only registered, never run.
    #[builder]
    pub async fn new(
        db: Arc<Database>,
        #[builder(into, default = DEFAULT_BOND_DENOM.to_owned())] bond_denom: String,
        engine: Option<DynWasmEngine>,
    ) -> AppResult<Self> {
        let bank = Arc::new(BankLedger::new(
            ModuleDatabase::new(bank::KIND, db.clone()),
            [
                fee_collector(),
                staking::bonded_pool(),
                lbm_module_gov::module_account(),
            ],
        ));
        let staking = Arc::new(StakingLedger::new(
            ModuleDatabase::new(staking::KIND, db.clone()),
            bond_denom,
        ));
        db.write_with_expect(|dbtx| {
            BankLedger::init_db_tx(&ModuleWriteTransactionCtx::new(bank::KIND, dbtx))?;
            StakingLedger::init_db_tx(&ModuleWriteTransactionCtx::new(staking::KIND, dbtx))?;
            dbtx.open_table(&tables::last_block::TABLE)?;
            Ok(())
        })
        .await;

        let consortium = ConsortiumModuleInit::new(staking.clone())
            .init_module(ModuleInitArgs::new(
                lbm_module_consortium::KIND,
                db.clone(),
                lbm_module_consortium::CURRENT_VERSION,
            ))
            .await
            .context(ModuleInitSnafu)?;
        let distribution = DistributionModuleInit::new(bank.clone(), staking.clone())
            .init_module(ModuleInitArgs::new(
                lbm_module_distribution::KIND,
                db.clone(),
                lbm_module_distribution::CURRENT_VERSION,
            ))
            .await
            .context(ModuleInitSnafu)?;
        let wasm = WasmModuleInit::new(
            bank.clone(),
            engine.unwrap_or_else(|| Arc::new(RegistryOnlyEngine)),
        )
        .init_module(ModuleInitArgs::new(
            lbm_module_wasm::KIND,
            db.clone(),
            lbm_module_wasm::CURRENT_VERSION,
        ))
        .await
        .context(ModuleInitSnafu)?;

        let router = ProposalRouter::new()
            .with_route(lbm_module_consortium::KIND, consortium.clone())
            .with_route(lbm_module_distribution::KIND, distribution.clone())
            .with_route(lbm_module_wasm::KIND, wasm.clone());
        let gov = GovModuleInit::new(bank.clone(), staking.clone(), router)
            .init_module(ModuleInitArgs::new(
                lbm_module_gov::KIND,
                db.clone(),
                lbm_module_gov::CURRENT_VERSION,
            ))
            .await
            .context(ModuleInitSnafu)?;

        staking.set_hooks(distribution.clone());
        staking.set_gate(consortium.clone());

        let modules = BTreeMap::from([
            (bank::KIND, bank.clone() as DynModule),
            (staking::KIND, staking.clone() as DynModule),
            (lbm_module_consortium::KIND, consortium.clone() as DynModule),
            (
                lbm_module_distribution::KIND,
                distribution.clone() as DynModule,
            ),
            (lbm_module_gov::KIND, gov.clone() as DynModule),
            (lbm_module_wasm::KIND, wasm.clone() as DynModule),
        ]);
        debug!(target: LOG_TARGET, modules = modules.len(), "App initialized");

        Ok(Self {
            db,
            bank,
            staking,
            consortium,
            distribution,
            gov,
            wasm,
            modules,
        })
    }
}

impl App {
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn bank(&self) -> &Arc<BankLedger> {
        &self.bank
    }

    pub fn staking(&self) -> &Arc<StakingLedger> {
        &self.staking
    }

    pub fn consortium(&self) -> &Arc<ConsortiumModule> {
        &self.consortium
    }

    pub fn distribution(&self) -> &Arc<DistributionModule> {
        &self.distribution
    }

    pub fn gov(&self) -> &Arc<GovModule> {
        &self.gov
    }

    pub fn wasm(&self) -> &Arc<WasmModule> {
        &self.wasm
    }
}
