use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lbm_core::module::ModuleKind;
use lbm_module::keepers::{BankKeeper, StakingKeeper};
use lbm_module::module::{
    DynModule, IModuleInit, ModuleInitArgs, ModuleInitResult, ModuleSupportedConsensusVersions,
};
use lbm_module::proposal::ProposalRouter;

use crate::module::GovModule;
use crate::{CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, KIND};

pub struct GovModuleInit {
    bank: Arc<dyn BankKeeper>,
    staking: Arc<dyn StakingKeeper>,
    router: ProposalRouter,
}

impl GovModuleInit {
    /// `router` executes passed proposals of other modules
    pub fn new(
        bank: Arc<dyn BankKeeper>,
        staking: Arc<dyn StakingKeeper>,
        router: ProposalRouter,
    ) -> Self {
        Self {
            bank,
            staking,
            router,
        }
    }

    /// Like [`IModuleInit::init`], but returning the concrete module
    pub async fn init_module(
        &self,
        args: ModuleInitArgs,
    ) -> ModuleInitResult<Arc<GovModule>> {
        self.ensure_supported(args.module_consensus_version)?;

        args.db
            .write_with_expect(|dbtx| {
                GovModule::init_db_tx(dbtx, args.module_consensus_version)
            })
            .await;

        Ok(Arc::new(GovModule::new(
            args.module_consensus_version,
            args.db,
            self.bank.clone(),
            self.staking.clone(),
            self.router.clone(),
        )))
    }
}

#[async_trait]
impl IModuleInit for GovModuleInit {
    fn kind(&self) -> ModuleKind {
        KIND
    }

    fn display_name(&self) -> &'static str {
        "Governance"
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
