use std::sync::Arc;

use bincode::{Decode, Encode};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockContext;
use lbm_core::msg::MsgRaw;
use lbm_core::ver::ConsensusVersion;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{StakingKeeper, ValidatorCreationGate};
use lbm_module::module::IModule;
use lbm_module::module::db::{
    DbResult, DbTxError, DbTxResult, ModuleDatabase, ModuleReadableTransaction,
    ModuleWriteTransactionCtx,
};
use lbm_util_db::redb_bincode::ReadableTable as _;
use lbm_util_error::Whatever;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{debug, info};

use crate::error::{
    ConsortiumError, DisabledSnafu, DuplicateAuthSnafu, NotAllowedSnafu, ValidatorNotFoundSnafu,
};
use crate::events::{EventUpdateConsortiumParams, EventUpdateValidatorAuth};
use crate::genesis::ConsortiumGenesis;
use crate::params::ConsortiumParams;
use crate::{LOG_TARGET, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorAuth {
    pub operator_address: ValAddress,
    pub creation_allowed: bool,
}

pub struct ConsortiumModule {
    #[allow(dead_code)]
    pub(crate) version: ConsensusVersion,
    pub(crate) db: ModuleDatabase,
    pub(crate) staking: Arc<dyn StakingKeeper>,
}

impl ConsortiumModule {
    pub fn new(
        version: ConsensusVersion,
        db: ModuleDatabase,
        staking: Arc<dyn StakingKeeper>,
    ) -> Self {
        Self {
            version,
            db,
            staking,
        }
    }

    pub async fn params(&self) -> ConsortiumParams {
        self.db
            .read_with_expect(|dbtx| Self::get_params_tx(dbtx))
            .await
    }

    pub async fn validator_auth(&self, operator: ValAddress) -> Result<ValidatorAuth, ConsortiumError> {
        self.db
            .read_with_expect_falliable(|dbtx| Self::get_validator_auth_tx(dbtx, operator))
            .await
    }

    pub async fn validator_auths(&self) -> Vec<ValidatorAuth> {
        self.db
            .read_with_expect(|dbtx| Self::validator_auths_tx(dbtx))
            .await
    }

    pub(crate) fn init_db_tx(
        dbtx: &ModuleWriteTransactionCtx,
        version: ConsensusVersion,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::self_version::TABLE)?
            .insert(&(), &version)?;
        dbtx.open_table(&tables::params::TABLE)?;
        dbtx.open_table(&tables::validator_auths::TABLE)?;
        Ok(())
    }

    pub fn get_params_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<ConsortiumParams> {
        Ok(dbtx
            .open_table(&tables::params::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    pub fn set_params_tx(dbtx: &ModuleWriteTransactionCtx, params: ConsortiumParams) -> DbResult<()> {
        dbtx.open_table(&tables::params::TABLE)?
            .insert(&(), &params)?;
        Ok(())
    }

    pub fn get_validator_auth_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        operator: ValAddress,
    ) -> DbTxResult<ValidatorAuth, ConsortiumError> {
        dbtx.open_table(&tables::validator_auths::TABLE)?
            .get(&operator)?
            .map(|v| v.value())
            .context(ValidatorNotFoundSnafu { operator })
            .context(TxSnafu)
    }

    pub fn set_validator_auth_tx(dbtx: &ModuleWriteTransactionCtx, auth: ValidatorAuth) -> DbResult<()> {
        dbtx.open_table(&tables::validator_auths::TABLE)?
            .insert(&auth.operator_address, &auth)?;
        Ok(())
    }

    pub fn validator_auths_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<ValidatorAuth>> {
        dbtx.open_table(&tables::validator_auths::TABLE)?
            .range(..)?
            .map(|kv| {
                let (_, auth) = kv?;
                Ok(auth.value())
            })
            .collect()
    }

    /// Remove all the validator auths
    pub fn cleanup_tx(dbtx: &ModuleWriteTransactionCtx) -> DbResult<()> {
        dbtx.open_table(&tables::validator_auths::TABLE)?
            .retain(|_, _| false)?;
        debug!(target: LOG_TARGET, "Removed all validator auths");
        Ok(())
    }

    pub fn ensure_creation_allowed_tx(
        dbtx: &ModuleWriteTransactionCtx,
        operator: ValAddress,
    ) -> DbTxResult<(), ConsortiumError> {
        if !Self::get_params_tx(dbtx)?.enabled {
            return Ok(());
        }
        let allowed = match Self::get_validator_auth_tx(dbtx, operator) {
            Ok(auth) => auth.creation_allowed,
            Err(DbTxError::TxError {
                source: ConsortiumError::ValidatorNotFound { .. },
                ..
            }) => false,
            Err(err) => return Err(err),
        };
        if !allowed {
            return NotAllowedSnafu { operator }.fail().context(TxSnafu);
        }
        Ok(())
    }

    /// Apply the params of a passed proposal
    ///
    /// Disabling drops all the validator auths.
    pub fn update_params_tx(
        dbtx: &ModuleWriteTransactionCtx,
        params: ConsortiumParams,
    ) -> DbTxResult<Vec<ModuleEvent>, ConsortiumError> {
        if !params.enabled {
            Self::cleanup_tx(dbtx)?;
        }
        Self::set_params_tx(dbtx, params)?;
        info!(target: LOG_TARGET, enabled = params.enabled, "Consortium params updated");
        Ok(vec![EventUpdateConsortiumParams { params }.to_event()])
    }

    pub fn update_validator_auths_tx(
        dbtx: &ModuleWriteTransactionCtx,
        auths: &[ValidatorAuth],
    ) -> DbTxResult<Vec<ModuleEvent>, ConsortiumError> {
        if !Self::get_params_tx(dbtx)?.enabled {
            return DisabledSnafu.fail().context(TxSnafu);
        }
        let mut events = vec![];
        for auth in auths {
            Self::set_validator_auth_tx(dbtx, *auth)?;
            debug!(
                target: LOG_TARGET,
                operator = %auth.operator_address,
                creation_allowed = auth.creation_allowed,
                "Validator auth updated"
            );
            events.push(EventUpdateValidatorAuth { auth: *auth }.to_event());
        }
        Ok(events)
    }

    pub(crate) fn init_genesis_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &ConsortiumGenesis,
    ) -> DbTxResult<(), ConsortiumError> {
        let mut seen = std::collections::BTreeSet::new();
        for auth in &genesis.validator_auths {
            if !seen.insert(auth.operator_address) {
                return DuplicateAuthSnafu {
                    operator: auth.operator_address,
                }
                .fail()
                .context(TxSnafu);
            }
        }

        Self::set_params_tx(dbtx, genesis.params)?;
        for auth in &genesis.validator_auths {
            Self::set_validator_auth_tx(dbtx, *auth)?;
        }

        if genesis.params.enabled {
            for validator in self.staking.validators(dbtx)? {
                let operator = validator.operator;
                if seen.contains(&operator) {
                    continue;
                }
                debug!(target: LOG_TARGET, %operator, "Authorizing genesis validator");
                Self::set_validator_auth_tx(
                    dbtx,
                    ValidatorAuth {
                        operator_address: operator,
                        creation_allowed: true,
                    },
                )?;
            }
        }
        Ok(())
    }

    pub(crate) fn export_genesis_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<ConsortiumGenesis> {
        Ok(ConsortiumGenesis {
            params: Self::get_params_tx(dbtx)?,
            validator_auths: Self::validator_auths_tx(dbtx)?,
        })
    }
}

impl ValidatorCreationGate for ConsortiumModule {
    fn ensure_creation_allowed(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        operator: ValAddress,
    ) -> DbTxResult<(), Whatever> {
        let dbtx = dbtx.rescope(crate::KIND);
        Self::ensure_creation_allowed_tx(&dbtx, operator).map_err(DbTxError::whatever)
    }
}

impl IModule for ConsortiumModule {
    fn process_msg(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _signer: AccAddress,
        _msg: &MsgRaw,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        None.whatever_context("Consortium module does not accept messages")
            .context(TxSnafu)?
    }

    fn init_genesis(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &serde_json::Value,
    ) -> DbTxResult<(), Whatever> {
        let genesis: ConsortiumGenesis = serde_json::from_value(genesis.clone())
            .whatever_context("Invalid consortium genesis")
            .context(TxSnafu)?;
        self.init_genesis_tx(dbtx, &genesis)
            .map_err(DbTxError::whatever)
    }

    fn export_genesis(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<serde_json::Value> {
        let genesis = Self::export_genesis_tx(dbtx)?;
        Ok(serde_json::to_value(genesis).expect("Can't fail"))
    }
}
