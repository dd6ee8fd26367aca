//! Keepers of modules living outside of this repository
//!
//! Bank and staking state is owned by the embedding application. Modules
//! only see it through these traits, and always inside the transaction of
//! the block being processed: implementations re-scope the passed
//! [`ModuleWriteTransactionCtx`] to their own tables.

use bincode::{Decode, Encode};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockContext;
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_util_error::Whatever;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::event::ModuleEvent;
use crate::module::db::{DbResult, DbTxResult, ModuleWriteTransactionCtx};

/// Account collecting transaction fees until they get distributed
pub const FEE_COLLECTOR_ACCOUNT: &str = "fee_collector";
/// Account holding delegated tokens
pub const BONDED_POOL_ACCOUNT: &str = "bonded_tokens_pool";

#[derive(Debug, Snafu)]
#[snafu(display("Insufficient funds: {available} is less than {required}"))]
pub struct InsufficientFundsError {
    pub available: Coins,
    pub required: Coins,
}

pub trait BankKeeper: Send + Sync {
    fn balances(&self, dbtx: &ModuleWriteTransactionCtx, addr: AccAddress) -> DbResult<Coins>;

    fn send_coins(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        to: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError>;

    /// Destroy `amount` held by `from`
    fn burn_coins(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError>;

    /// Is `addr` barred from receiving funds (eg. module accounts)
    fn is_blocked(&self, addr: AccAddress) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub operator: ValAddress,
    #[serde(with = "lbm_core::coin::amount_str")]
    pub tokens: u128,
    pub delegator_shares: Dec,
    pub commission_rate: Dec,
    pub bonded: bool,
}

impl ValidatorInfo {
    /// Tokens backing `shares`
    pub fn tokens_from_shares(&self, shares: &Dec) -> Dec {
        if self.delegator_shares.is_zero() {
            return Dec::zero();
        }
        shares.mul_int(self.tokens).quo(&self.delegator_shares)
    }

    /// Tokens backing `shares`, rounded down
    pub fn tokens_from_shares_truncated(&self, shares: &Dec) -> Dec {
        if self.delegator_shares.is_zero() {
            return Dec::zero();
        }
        shares.mul_int(self.tokens).quo_truncate(&self.delegator_shares)
    }

    /// Shares worth `amount` tokens at the current exchange rate
    pub fn shares_from_tokens(&self, amount: u128) -> Dec {
        if self.tokens == 0 {
            return Dec::from(amount);
        }
        self.delegator_shares.mul_int(amount).quo_int(self.tokens)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DelegationInfo {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    pub shares: Dec,
}

pub trait StakingKeeper: Send + Sync {
    /// Denomination of the staking token
    fn bond_denom(&self) -> String;

    fn validator(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        operator: ValAddress,
    ) -> DbResult<Option<ValidatorInfo>>;

    fn validators(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<Vec<ValidatorInfo>>;

    fn delegation(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbResult<Option<DelegationInfo>>;

    fn delegator_delegations(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
    ) -> DbResult<Vec<DelegationInfo>>;

    fn delegations(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<Vec<DelegationInfo>>;

    fn total_bonded_tokens(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<u128>;
}

/// Notifications about staking changes
///
/// Called by the staking implementation in the same transaction as the
/// change itself. Errors abort the whole staking operation.
pub trait StakingHooks: Send + Sync {
    fn after_validator_created(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }

    fn after_validator_removed(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }

    fn before_delegation_created(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _delegator: AccAddress,
        _validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }

    fn before_delegation_shares_modified(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _delegator: AccAddress,
        _validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }

    fn after_delegation_modified(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _delegator: AccAddress,
        _validator: ValAddress,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }

    fn before_validator_slashed(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        _validator: ValAddress,
        _fraction: &Dec,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        Ok(vec![])
    }
}

/// Decides whether an operator may create a validator
pub trait ValidatorCreationGate: Send + Sync {
    fn ensure_creation_allowed(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        operator: ValAddress,
    ) -> DbTxResult<(), Whatever>;
}
