pub mod db;

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use db::{DbResult, DbTxResult, ModuleDatabase, ModuleWriteTransactionCtx};
use lbm_core::address::AccAddress;
use lbm_core::block::{BlockContext, BlockInfo};
use lbm_core::module::ModuleKind;
use lbm_core::msg::MsgRaw;
use lbm_core::ver::{ConsensusVersion, ConsensusVersionMajor, ConsensusVersionMinor};
use lbm_db::Database;
use lbm_util_error::Whatever;
use snafu::Snafu;

use crate::event::ModuleEvent;

#[non_exhaustive]
pub struct ModuleInitArgs {
    pub db: ModuleDatabase,
    pub module_consensus_version: ConsensusVersion,
}

impl ModuleInitArgs {
    pub fn new(
        module_kind: ModuleKind,
        db: Arc<Database>,
        module_consensus_version: ConsensusVersion,
    ) -> Self {
        Self {
            db: ModuleDatabase::new(module_kind, db),
            module_consensus_version,
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ModuleInitError {
    #[snafu(display("Unsupported version {requested}, supported {supported}"))]
    UnsupportedVersion {
        requested: ConsensusVersion,
        supported: ConsensusVersion,
    },
}

pub type ModuleInitResult<T> = Result<T, ModuleInitError>;

pub type ModuleSupportedConsensusVersions = BTreeMap<ConsensusVersionMajor, ConsensusVersionMinor>;

/// Module "constructor"
#[async_trait]
pub trait IModuleInit: Any {
    fn kind(&self) -> ModuleKind;

    fn display_name(&self) -> &'static str;

    /// All major consensus version supported by the module, with latest
    /// supported minor version for each
    fn supported_versions(&self) -> ModuleSupportedConsensusVersions;

    /// Check that `requested` can be run by this code
    fn ensure_supported(&self, requested: ConsensusVersion) -> ModuleInitResult<()> {
        let versions = self.supported_versions();
        let Some(minor) = versions.get(&requested.major()) else {
            let (major, minor) = versions
                .last_key_value()
                .map(|(k, v)| (*k, *v))
                .unwrap_or_default();
            return UnsupportedVersionSnafu {
                requested,
                supported: ConsensusVersion::new_const(major, minor),
            }
            .fail();
        };
        let supported = ConsensusVersion::new_const(requested.major(), *minor);
        if !supported.supports(requested) {
            return UnsupportedVersionSnafu {
                requested,
                supported,
            }
            .fail();
        }
        Ok(())
    }

    /// Create an instance of module for given arguments
    async fn init(&self, args: ModuleInitArgs) -> ModuleInitResult<DynModule>;
}

pub type DynModuleInit = Arc<dyn IModuleInit + Send + Sync>;
pub type DynModule = Arc<dyn IModule + Send + Sync>;

/// A running module
///
/// All the methods taking `dbtx` run inside the transaction of the block
/// being processed. A returned error aborts everything done in the
/// surrounding unit (transaction or block hook).
pub trait IModule: Any {
    /// Process a message signed by `signer`
    fn process_msg(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: &MsgRaw,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever>;

    fn begin_block(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _info: &BlockInfo,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }

    fn end_block(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }

    /// Import the module's genesis state (JSON)
    fn init_genesis(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &serde_json::Value,
    ) -> DbTxResult<(), Whatever>;

    /// Export the module's state as genesis (JSON)
    fn export_genesis(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<serde_json::Value>;
}
