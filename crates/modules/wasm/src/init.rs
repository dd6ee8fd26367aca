use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lbm_core::module::ModuleKind;
use lbm_module::keepers::BankKeeper;
use lbm_module::module::{
    DynModule, IModuleInit, ModuleInitArgs, ModuleInitResult, ModuleSupportedConsensusVersions,
};

use crate::engine::DynWasmEngine;
use crate::module::WasmModule;
use crate::{CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, KIND};

pub struct WasmModuleInit {
    bank: Arc<dyn BankKeeper>,
    engine: DynWasmEngine,
}

impl WasmModuleInit {
    pub fn new(bank: Arc<dyn BankKeeper>, engine: DynWasmEngine) -> Self {
        Self { bank, engine }
    }

    /// Like [`IModuleInit::init`], but returning the concrete module, which
    /// is also the handler of wasm proposals
    pub async fn init_module(
        &self,
        args: ModuleInitArgs,
    ) -> ModuleInitResult<Arc<WasmModule>> {
        self.ensure_supported(args.module_consensus_version)?;

        args.db
            .write_with_expect(|dbtx| {
                WasmModule::init_db_tx(dbtx, args.module_consensus_version)
            })
            .await;

        Ok(Arc::new(WasmModule::new(
            args.module_consensus_version,
            args.db,
            self.bank.clone(),
            self.engine.clone(),
        )))
    }
}

#[async_trait]
impl IModuleInit for WasmModuleInit {
    fn kind(&self) -> ModuleKind {
        KIND
    }

    fn display_name(&self) -> &'static str {
        "Wasm"
    }

    fn supported_versions(&self) -> ModuleSupportedConsensusVersions {
        let mut versions = BTreeMap::new();
        versions.insert(CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR);
        versions
    }

    async fn init(&self, args: ModuleInitArgs) -> ModuleInitResult<DynModule> {
        Ok(self.init_module(args).await?)
    }
}
