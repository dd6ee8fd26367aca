use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lbm_core::module::ModuleKind;
use lbm_module::keepers::{BankKeeper, StakingKeeper};
use lbm_module::module::{
    DynModule, IModuleInit, ModuleInitArgs, ModuleInitResult, ModuleSupportedConsensusVersions,
};

use crate::module::DistributionModule;
use crate::{CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, KIND};

pub struct DistributionModuleInit {
    bank: Arc<dyn BankKeeper>,
    staking: Arc<dyn StakingKeeper>,
}

impl DistributionModuleInit {
    pub fn new(bank: Arc<dyn BankKeeper>, staking: Arc<dyn StakingKeeper>) -> Self {
        Self { bank, staking }
    }

    /// Like [`IModuleInit::init`], but returning the concrete module, which
    /// is also needed as staking hooks and proposal handler
    pub async fn init_module(
        &self,
        args: ModuleInitArgs,
    ) -> ModuleInitResult<Arc<DistributionModule>> {
        self.ensure_supported(args.module_consensus_version)?;

        args.db
            .write_with_expect(|dbtx| {
                DistributionModule::init_db_tx(dbtx, args.module_consensus_version)
            })
            .await;

        Ok(Arc::new(DistributionModule::new(
            args.module_consensus_version,
            args.db,
            self.bank.clone(),
            self.staking.clone(),
        )))
    }
}

#[async_trait]
impl IModuleInit for DistributionModuleInit {
    fn kind(&self) -> ModuleKind {
        KIND
    }

    fn display_name(&self) -> &'static str {
        "Distribution"
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
