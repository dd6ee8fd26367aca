use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lbm_core::module::ModuleKind;
use lbm_module::keepers::StakingKeeper;
use lbm_module::module::{
    DynModule, IModuleInit, ModuleInitArgs, ModuleInitResult, ModuleSupportedConsensusVersions,
};

use crate::module::ConsortiumModule;
use crate::{CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, KIND};

pub struct ConsortiumModuleInit {
    staking: Arc<dyn StakingKeeper>,
}

impl ConsortiumModuleInit {
    pub fn new(staking: Arc<dyn StakingKeeper>) -> Self {
        Self { staking }
    }

    /// Like [`IModuleInit::init`], but returning the concrete module
    pub async fn init_module(&self, args: ModuleInitArgs) -> ModuleInitResult<Arc<ConsortiumModule>> {
        self.ensure_supported(args.module_consensus_version)?;

        args.db
            .write_with_expect(|dbtx| ConsortiumModule::init_db_tx(dbtx, args.module_consensus_version))
            .await;

        Ok(Arc::new(ConsortiumModule::new(
            args.module_consensus_version,
            args.db,
            self.staking.clone(),
        )))
    }
}

#[async_trait]
impl IModuleInit for ConsortiumModuleInit {
    fn kind(&self) -> ModuleKind {
        KIND
    }

    fn display_name(&self) -> &'static str {
        "Consortium"
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
