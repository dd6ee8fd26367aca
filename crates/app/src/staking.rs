//! Validators and delegations
//!
//! A minimal stand-in for the staking module: every validator is bonded,
//! undelegated tokens are returned immediately. It still does everything
//! the modules depend on: validator creation goes through the
//! [`ValidatorCreationGate`] and every change of stake notifies the
//! [`StakingHooks`] in the same transaction.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use bincode::{Decode, Encode};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::{BlockContext, BlockHeight};
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_core::module::ModuleKind;
use lbm_core::msg::MsgRaw;
use lbm_core::timestamp::Timestamp;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventId, EventKind, EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{
    BONDED_POOL_ACCOUNT, DelegationInfo, StakingHooks, StakingKeeper, ValidatorCreationGate,
    ValidatorInfo,
};
use lbm_module::kinds;
use lbm_module::module::IModule;
use lbm_module::module::db::{
    DbResult, DbTxError, DbTxResult, ModuleDatabase, ModuleReadableTransaction,
    ModuleWriteTransactionCtx,
};
use lbm_module::msg::ModuleMsg;
use lbm_util_db::range::collect_range;
use lbm_util_db::redb_bincode::ReadableTable as _;
use lbm_util_error::Whatever;
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;
use tracing::{debug, info};

use crate::bank::{self, BankLedger};
use crate::error::{
    CreationRejectedSnafu, DelegationNotFoundSnafu, InsufficientSharesSnafu,
    InvalidCommissionRateSnafu, InvalidSlashFractionSnafu, InvalidStakingGenesisSnafu,
    StakingError, StakingResult, ValidatorExistsSnafu, ValidatorNotFoundSnafu, ZeroAmountSnafu,
};
use crate::{LOG_TARGET, tables};

pub const KIND: ModuleKind = kinds::STAKING;

pub fn bonded_pool() -> AccAddress {
    AccAddress::module(BONDED_POOL_ACCOUNT)
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum StakingMsg {
    /// Create a validator operated by the signer, self-delegating `amount`
    CreateValidator {
        commission_rate: Dec,
        #[serde(with = "lbm_core::coin::amount_str")]
        amount: u128,
    },
    Delegate {
        validator: ValAddress,
        #[serde(with = "lbm_core::coin::amount_str")]
        amount: u128,
    },
    /// Withdraw `amount` tokens worth of shares
    Undelegate {
        validator: ValAddress,
        #[serde(with = "lbm_core::coin::amount_str")]
        amount: u128,
    },
}

impl ModuleMsg for StakingMsg {
    const MODULE_KIND: ModuleKind = KIND;
}

macro_rules! event_kind {
    ($name:ident, $id:expr, $str:expr) => {
        impl EventKind for $name {
            const MODULE_KIND: ModuleKind = KIND;
            const EVENT_ID: EventId = EventId::new($id);
            const NAME: &'static str = $str;
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventCreateValidator {
    pub validator: ValAddress,
}
event_kind!(EventCreateValidator, 0, "create_validator");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventDelegate {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    pub amount: u128,
}
event_kind!(EventDelegate, 1, "delegate");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventUndelegate {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    pub amount: u128,
}
event_kind!(EventUndelegate, 2, "undelegate");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventSlash {
    pub validator: ValAddress,
    pub fraction: Dec,
    pub burned: u128,
}
event_kind!(EventSlash, 3, "slash");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventRemoveValidator {
    pub validator: ValAddress,
}
event_kind!(EventRemoveValidator, 4, "remove_validator");

/// Staking state at genesis
///
/// Hand written genesis files have `exported == false`, and the staking
/// hooks run for every validator and delegation, as if they were created
/// by messages. Exported state already contains what the hooks produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingGenesis {
    pub exported: bool,
    pub validators: Vec<ValidatorInfo>,
    pub delegations: Vec<DelegationInfo>,
}

impl StakingGenesis {
    pub fn validate(&self) -> Result<(), StakingError> {
        let invalid = |reason: String| InvalidStakingGenesisSnafu { reason }.fail();

        let mut shares: BTreeMap<ValAddress, Dec> = BTreeMap::new();
        for validator in &self.validators {
            if shares.insert(validator.operator, Dec::zero()).is_some() {
                return invalid(format!("duplicate validator {}", validator.operator));
            }
            if validator.commission_rate.is_negative() || Dec::one() < validator.commission_rate {
                return invalid(format!("bad commission rate of {}", validator.operator));
            }
        }

        let mut seen = BTreeSet::new();
        for delegation in &self.delegations {
            if !seen.insert((delegation.delegator, delegation.validator)) {
                return invalid(format!(
                    "duplicate delegation of {} to {}",
                    delegation.delegator, delegation.validator
                ));
            }
            if !delegation.shares.is_positive() {
                return invalid(format!(
                    "empty delegation of {} to {}",
                    delegation.delegator, delegation.validator
                ));
            }
            let Some(total) = shares.get_mut(&delegation.validator) else {
                return invalid(format!(
                    "delegation to unknown validator {}",
                    delegation.validator
                ));
            };
            *total += &delegation.shares;
        }

        for validator in &self.validators {
            if shares.get(&validator.operator) != Some(&validator.delegator_shares) {
                return invalid(format!(
                    "shares of {} don't add up to its delegations",
                    validator.operator
                ));
            }
        }
        Ok(())
    }

    pub fn total_tokens(&self) -> u128 {
        self.validators.iter().map(|v| v.tokens).sum()
    }
}

pub struct StakingLedger {
    db: ModuleDatabase,
    bond_denom: String,
    /// Set once, after the modules implementing it are created
    hooks: OnceLock<Arc<dyn StakingHooks>>,
    gate: OnceLock<Arc<dyn ValidatorCreationGate>>,
}

impl StakingLedger {
    pub fn new(db: ModuleDatabase, bond_denom: impl Into<String>) -> Self {
        Self {
            db,
            bond_denom: bond_denom.into(),
            hooks: OnceLock::new(),
            gate: OnceLock::new(),
        }
    }

    pub fn set_hooks(&self, hooks: Arc<dyn StakingHooks>) {
        if self.hooks.set(hooks).is_err() {
            panic!("Staking hooks already set");
        }
    }

    pub fn set_gate(&self, gate: Arc<dyn ValidatorCreationGate>) {
        if self.gate.set(gate).is_err() {
            panic!("Validator creation gate already set");
        }
    }

    pub(crate) fn init_db_tx(dbtx: &ModuleWriteTransactionCtx) -> DbResult<()> {
        dbtx.open_table(&tables::validators::TABLE)?;
        dbtx.open_table(&tables::delegations::TABLE)?;
        Ok(())
    }

    fn bond_coins(&self, amount: u128) -> Coins {
        Coins::single(self.bond_denom.clone(), amount).expect("Valid denom")
    }

    pub async fn get_validator(&self, operator: ValAddress) -> Option<ValidatorInfo> {
        self.db
            .read_with_expect(|dbtx| Self::get_validator_tx(dbtx, operator))
            .await
    }

    pub async fn get_delegation(
        &self,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> Option<DelegationInfo> {
        self.db
            .read_with_expect(|dbtx| Self::get_delegation_tx(dbtx, delegator, validator))
            .await
    }

    pub fn get_validator_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        operator: ValAddress,
    ) -> DbResult<Option<ValidatorInfo>> {
        Ok(dbtx
            .open_table(&tables::validators::TABLE)?
            .get(&operator)?
            .map(|v| v.value()))
    }

    fn existing_validator_tx(
        dbtx: &ModuleWriteTransactionCtx,
        operator: ValAddress,
    ) -> DbTxResult<ValidatorInfo, StakingError> {
        match Self::get_validator_tx(dbtx, operator)? {
            Some(validator) => Ok(validator),
            None => ValidatorNotFoundSnafu { operator }.fail().context(TxSnafu),
        }
    }

    fn set_validator_tx(dbtx: &ModuleWriteTransactionCtx, validator: &ValidatorInfo) -> DbResult<()> {
        dbtx.open_table(&tables::validators::TABLE)?
            .insert(&validator.operator, validator)?;
        Ok(())
    }

    pub fn validators_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<ValidatorInfo>> {
        Ok(collect_range(&dbtx.open_table(&tables::validators::TABLE)?, ..)?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    pub fn get_delegation_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbResult<Option<DelegationInfo>> {
        Ok(dbtx
            .open_table(&tables::delegations::TABLE)?
            .get(&(delegator, validator))?
            .map(|v| v.value()))
    }

    fn set_delegation_tx(
        dbtx: &ModuleWriteTransactionCtx,
        delegation: &DelegationInfo,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::delegations::TABLE)?
            .insert(&(delegation.delegator, delegation.validator), delegation)?;
        Ok(())
    }

    pub fn delegations_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<DelegationInfo>> {
        Ok(collect_range(&dbtx.open_table(&tables::delegations::TABLE)?, ..)?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    fn hook(
        &self,
        f: impl FnOnce(&dyn StakingHooks) -> DbTxResult<Vec<ModuleEvent>, Whatever>,
    ) -> DbTxResult<Vec<ModuleEvent>, StakingError> {
        match self.hooks.get() {
            Some(hooks) => {
                f(hooks.as_ref()).map_err(|e| e.map(|source| StakingError::Hook { source }))
            }
            None => Ok(vec![]),
        }
    }

    /// Move `amount` bond tokens between an account and the bonded pool
    fn transfer_bonded_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        to: AccAddress,
        amount: u128,
    ) -> DbTxResult<(), StakingError> {
        BankLedger::send_tx(&dbtx.rescope(bank::KIND), from, to, &self.bond_coins(amount))
            .map_err(DbTxError::tx_into)
    }

    pub fn create_validator_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        operator: ValAddress,
        commission_rate: Dec,
        amount: u128,
    ) -> DbTxResult<Vec<ModuleEvent>, StakingError> {
        if commission_rate.is_negative() || Dec::one() < commission_rate {
            return InvalidCommissionRateSnafu.fail().context(TxSnafu);
        }
        if amount == 0 {
            return ZeroAmountSnafu.fail().context(TxSnafu);
        }
        if Self::get_validator_tx(dbtx, operator)?.is_some() {
            return ValidatorExistsSnafu { operator }.fail().context(TxSnafu);
        }
        if let Some(gate) = self.gate.get() {
            gate.ensure_creation_allowed(dbtx, operator)
                .map_err(|e| e.map(|source| StakingError::CreationRejected { source }))?;
        }

        Self::set_validator_tx(
            dbtx,
            &ValidatorInfo {
                operator,
                tokens: 0,
                delegator_shares: Dec::zero(),
                commission_rate,
                bonded: true,
            },
        )?;
        let mut events = vec![EventCreateValidator { validator: operator }.to_event()];
        events.extend(self.hook(|h| h.after_validator_created(dbtx, block, operator))?);
        events.extend(self.delegate_tx(dbtx, block, operator.to_acc(), operator, amount)?);

        info!(target: LOG_TARGET, %operator, %amount, "Validator created");
        Ok(events)
    }

    pub fn delegate_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        delegator: AccAddress,
        validator: ValAddress,
        amount: u128,
    ) -> DbTxResult<Vec<ModuleEvent>, StakingError> {
        if amount == 0 {
            return ZeroAmountSnafu.fail().context(TxSnafu);
        }
        Self::existing_validator_tx(dbtx, validator)?;

        let existing = Self::get_delegation_tx(dbtx, delegator, validator)?;
        let mut events = if existing.is_some() {
            self.hook(|h| h.before_delegation_shares_modified(dbtx, block, delegator, validator))?
        } else {
            self.hook(|h| h.before_delegation_created(dbtx, block, delegator, validator))?
        };

        self.transfer_bonded_tx(dbtx, delegator, bonded_pool(), amount)?;

        // re-read, hooks may have touched it
        let mut val = Self::existing_validator_tx(dbtx, validator)?;
        let shares = val.shares_from_tokens(amount);
        val.tokens += amount;
        val.delegator_shares += &shares;
        Self::set_validator_tx(dbtx, &val)?;

        let mut delegation = existing.unwrap_or(DelegationInfo {
            delegator,
            validator,
            shares: Dec::zero(),
        });
        delegation.shares += &shares;
        Self::set_delegation_tx(dbtx, &delegation)?;

        events.extend(self.hook(|h| h.after_delegation_modified(dbtx, block, delegator, validator))?);
        events.push(
            EventDelegate {
                delegator,
                validator,
                amount,
            }
            .to_event(),
        );
        debug!(target: LOG_TARGET, %delegator, %validator, %amount, %shares, "Delegated");
        Ok(events)
    }

    /// Undelegate `amount` tokens worth of shares, paid out immediately
    ///
    /// A validator left without shares is removed. Delegations to a validator
    /// slashed down to zero tokens are removed whole for any `amount`.
    pub fn undelegate_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        delegator: AccAddress,
        validator: ValAddress,
        amount: u128,
    ) -> DbTxResult<Vec<ModuleEvent>, StakingError> {
        if amount == 0 {
            return ZeroAmountSnafu.fail().context(TxSnafu);
        }
        let val = Self::existing_validator_tx(dbtx, validator)?;
        let Some(mut delegation) = Self::get_delegation_tx(dbtx, delegator, validator)? else {
            return DelegationNotFoundSnafu {
                delegator,
                validator,
            }
            .fail()
            .context(TxSnafu);
        };

        let shares = if val.tokens == 0 {
            // fully slashed, the shares are worth nothing and all go at once
            delegation.shares.clone()
        } else {
            let worth = val
                .tokens_from_shares_truncated(&delegation.shares)
                .truncate_u128()
                .unwrap_or_default();
            if worth < amount {
                return InsufficientSharesSnafu.fail().context(TxSnafu);
            }
            if amount == worth {
                delegation.shares.clone()
            } else {
                val.shares_from_tokens(amount).min(delegation.shares.clone())
            }
        };

        let mut events =
            self.hook(|h| h.before_delegation_shares_modified(dbtx, block, delegator, validator))?;

        let mut val = Self::existing_validator_tx(dbtx, validator)?;
        let paid_out = val
            .tokens_from_shares_truncated(&shares)
            .truncate_u128()
            .unwrap_or_default()
            .min(val.tokens);
        val.tokens -= paid_out;
        val.delegator_shares -= &shares;
        delegation.shares -= &shares;

        if delegation.shares.is_zero() {
            dbtx.open_table(&tables::delegations::TABLE)?
                .remove(&(delegator, validator))?;
        } else {
            Self::set_delegation_tx(dbtx, &delegation)?;
        }
        Self::set_validator_tx(dbtx, &val)?;
        if !delegation.shares.is_zero() {
            events.extend(
                self.hook(|h| h.after_delegation_modified(dbtx, block, delegator, validator))?,
            );
        }

        self.transfer_bonded_tx(dbtx, bonded_pool(), delegator, paid_out)?;
        events.push(
            EventUndelegate {
                delegator,
                validator,
                amount: paid_out,
            }
            .to_event(),
        );
        debug!(target: LOG_TARGET, %delegator, %validator, amount = %paid_out, "Undelegated");

        if val.delegator_shares.is_zero() {
            events.extend(self.remove_validator_tx(dbtx, block, val)?);
        }
        Ok(events)
    }

    fn remove_validator_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        val: ValidatorInfo,
    ) -> DbTxResult<Vec<ModuleEvent>, StakingError> {
        let validator = val.operator;
        // dust left after slashes has no owner anymore
        if val.tokens != 0 {
            BankLedger::burn_tx(&dbtx.rescope(bank::KIND), bonded_pool(), &self.bond_coins(val.tokens))
                .map_err(DbTxError::tx_into)?;
        }
        dbtx.open_table(&tables::validators::TABLE)?
            .remove(&validator)?;

        let mut events = self.hook(|h| h.after_validator_removed(dbtx, block, validator))?;
        events.push(EventRemoveValidator { validator }.to_event());
        info!(target: LOG_TARGET, %validator, "Validator removed");
        Ok(events)
    }

    /// Punish `validator` for misbehavior at `block`
    pub async fn slash(
        &self,
        block: &BlockContext,
        validator: ValAddress,
        fraction: &Dec,
    ) -> StakingResult<Vec<ModuleEvent>> {
        self.db
            .write_with_expect_falliable(|dbtx| self.slash_tx(dbtx, block, validator, fraction))
            .await
    }

    /// Burn `fraction` of the tokens bonded to `validator`
    pub fn slash_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        validator: ValAddress,
        fraction: &Dec,
    ) -> DbTxResult<Vec<ModuleEvent>, StakingError> {
        if !fraction.is_positive() || Dec::one() < *fraction {
            return InvalidSlashFractionSnafu.fail().context(TxSnafu);
        }
        Self::existing_validator_tx(dbtx, validator)?;

        let mut events =
            self.hook(|h| h.before_validator_slashed(dbtx, block, validator, fraction))?;

        let mut val = Self::existing_validator_tx(dbtx, validator)?;
        let burned = Dec::from(val.tokens)
            .mul(fraction)
            .truncate_u128()
            .unwrap_or_default()
            .min(val.tokens);
        val.tokens -= burned;
        Self::set_validator_tx(dbtx, &val)?;
        if burned != 0 {
            BankLedger::burn_tx(&dbtx.rescope(bank::KIND), bonded_pool(), &self.bond_coins(burned))
                .map_err(DbTxError::tx_into)?;
        }

        info!(target: LOG_TARGET, %validator, %fraction, %burned, "Validator slashed");
        events.push(
            EventSlash {
                validator,
                fraction: fraction.clone(),
                burned,
            }
            .to_event(),
        );
        Ok(events)
    }

    pub(crate) fn process_msg_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: StakingMsg,
    ) -> DbTxResult<Vec<ModuleEvent>, StakingError> {
        match msg {
            StakingMsg::CreateValidator {
                commission_rate,
                amount,
            } => self.create_validator_tx(dbtx, block, signer.to_val(), commission_rate, amount),
            StakingMsg::Delegate { validator, amount } => {
                self.delegate_tx(dbtx, block, signer, validator, amount)
            }
            StakingMsg::Undelegate { validator, amount } => {
                self.undelegate_tx(dbtx, block, signer, validator, amount)
            }
        }
    }

    pub(crate) fn init_genesis_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        genesis: &StakingGenesis,
    ) -> DbTxResult<(), StakingError> {
        genesis.validate().context(TxSnafu)?;

        let pooled = BankLedger::get_balance_tx(&dbtx.rescope(bank::KIND), bonded_pool())?
            .amount_of(&self.bond_denom);
        if pooled != genesis.total_tokens() {
            return InvalidStakingGenesisSnafu {
                reason: format!(
                    "bonded pool holds {pooled}, validators hold {}",
                    genesis.total_tokens()
                ),
            }
            .fail()
            .context(TxSnafu);
        }

        for validator in &genesis.validators {
            Self::set_validator_tx(dbtx, validator)?;
            if !genesis.exported {
                self.hook(|h| h.after_validator_created(dbtx, block, validator.operator))?;
            }
        }
        for delegation in &genesis.delegations {
            let (delegator, validator) = (delegation.delegator, delegation.validator);
            if !genesis.exported {
                self.hook(|h| h.before_delegation_created(dbtx, block, delegator, validator))?;
            }
            Self::set_delegation_tx(dbtx, delegation)?;
            if !genesis.exported {
                self.hook(|h| h.after_delegation_modified(dbtx, block, delegator, validator))?;
            }
        }
        Ok(())
    }

    pub(crate) fn export_genesis_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<StakingGenesis> {
        Ok(StakingGenesis {
            exported: true,
            validators: Self::validators_tx(dbtx)?,
            delegations: Self::delegations_tx(dbtx)?,
        })
    }
}

impl StakingKeeper for StakingLedger {
    fn bond_denom(&self) -> String {
        self.bond_denom.clone()
    }

    fn validator(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        operator: ValAddress,
    ) -> DbResult<Option<ValidatorInfo>> {
        Self::get_validator_tx(&dbtx.rescope(KIND), operator)
    }

    fn validators(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<Vec<ValidatorInfo>> {
        Self::validators_tx(&dbtx.rescope(KIND))
    }

    fn delegation(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbResult<Option<DelegationInfo>> {
        Self::get_delegation_tx(&dbtx.rescope(KIND), delegator, validator)
    }

    fn delegator_delegations(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
    ) -> DbResult<Vec<DelegationInfo>> {
        let dbtx = dbtx.rescope(KIND);
        let tbl = dbtx.open_table(&tables::delegations::TABLE)?;
        Ok(collect_range(
            &tbl,
            (delegator, ValAddress::ZERO)..=(delegator, ValAddress::MAX),
        )?
        .into_iter()
        .map(|(_, v)| v)
        .collect())
    }

    fn delegations(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<Vec<DelegationInfo>> {
        Self::delegations_tx(&dbtx.rescope(KIND))
    }

    fn total_bonded_tokens(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<u128> {
        Ok(Self::validators_tx(&dbtx.rescope(KIND))?
            .iter()
            .filter(|v| v.bonded)
            .map(|v| v.tokens)
            .sum())
    }
}

impl IModule for StakingLedger {
    fn process_msg(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: &MsgRaw,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let msg = StakingMsg::decode_from_raw(msg)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;
        self.process_msg_tx(&dbtx.rescope(KIND), block, signer, msg)
            .map_err(DbTxError::whatever)
    }

    /// Staking genesis needs the block context for the hooks, so the
    /// application calls [`StakingLedger::init_genesis_tx`] directly
    fn init_genesis(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &serde_json::Value,
    ) -> DbTxResult<(), Whatever> {
        let genesis: StakingGenesis = serde_json::from_value(genesis.clone())
            .whatever_context("Invalid staking genesis")
            .context(TxSnafu)?;
        self.init_genesis_tx(
            &dbtx.rescope(KIND),
            &BlockContext::new(BlockHeight::ZERO, Timestamp::ZERO),
            &genesis,
        )
        .map_err(DbTxError::whatever)
    }

    fn export_genesis(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<serde_json::Value> {
        let genesis = Self::export_genesis_tx(&dbtx.rescope(KIND))?;
        Ok(serde_json::to_value(genesis).expect("Can't fail"))
    }
}
