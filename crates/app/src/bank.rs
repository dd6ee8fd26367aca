//! Account balances
//!
//! A minimal stand-in for the bank module the other modules talk to through
//! [`BankKeeper`]: balances, sends between accounts and burning. Module
//! accounts can be marked as blocked, so users can't send to them directly.

use std::collections::BTreeSet;

use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::block::BlockContext;
use lbm_core::coin::Coins;
use lbm_core::module::ModuleKind;
use lbm_core::msg::MsgRaw;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventId, EventKind, EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{BankKeeper, InsufficientFundsError};
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
use snafu::{OptionExt as _, ResultExt as _};
use tracing::debug;

use crate::error::{
    BankError, BlockedRecipientSnafu, EmptyAmountSnafu, InvalidBankGenesisSnafu,
    SupplyOverflowSnafu,
};
use crate::{LOG_TARGET, tables};

pub const KIND: ModuleKind = kinds::BANK;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum BankMsg {
    Send { to: AccAddress, amount: Coins },
}

impl ModuleMsg for BankMsg {
    const MODULE_KIND: ModuleKind = KIND;
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventTransfer {
    pub from: AccAddress,
    pub to: AccAddress,
    pub amount: Coins,
}

impl EventKind for EventTransfer {
    const MODULE_KIND: ModuleKind = KIND;
    const EVENT_ID: EventId = EventId::new(0);
    const NAME: &'static str = "transfer";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub address: AccAddress,
    pub coins: Coins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankGenesis {
    pub balances: Vec<BalanceRecord>,
}

pub struct BankLedger {
    db: ModuleDatabase,
    blocked: BTreeSet<AccAddress>,
}

impl BankLedger {
    pub fn new(db: ModuleDatabase, blocked: impl IntoIterator<Item = AccAddress>) -> Self {
        Self {
            db,
            blocked: blocked.into_iter().collect(),
        }
    }

    pub(crate) fn init_db_tx(dbtx: &ModuleWriteTransactionCtx) -> DbResult<()> {
        dbtx.open_table(&tables::balances::TABLE)?;
        dbtx.open_table(&tables::supply::TABLE)?;
        Ok(())
    }

    pub async fn balance(&self, addr: AccAddress) -> Coins {
        self.db
            .read_with_expect(|dbtx| Self::get_balance_tx(dbtx, addr))
            .await
    }

    pub async fn supply(&self) -> Coins {
        self.db.read_with_expect(|dbtx| Self::get_supply_tx(dbtx)).await
    }

    pub fn get_balance_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        addr: AccAddress,
    ) -> DbResult<Coins> {
        Ok(dbtx
            .open_table(&tables::balances::TABLE)?
            .get(&addr)?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    fn set_balance_tx(
        dbtx: &ModuleWriteTransactionCtx,
        addr: AccAddress,
        coins: &Coins,
    ) -> DbResult<()> {
        let mut tbl = dbtx.open_table(&tables::balances::TABLE)?;
        if coins.is_zero() {
            tbl.remove(&addr)?;
        } else {
            tbl.insert(&addr, coins)?;
        }
        Ok(())
    }

    pub fn balances_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<(AccAddress, Coins)>> {
        Ok(collect_range(&dbtx.open_table(&tables::balances::TABLE)?, ..)?)
    }

    pub fn get_supply_tx<'dbtx>(dbtx: &impl ModuleReadableTransaction<'dbtx>) -> DbResult<Coins> {
        Ok(dbtx
            .open_table(&tables::supply::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    fn set_supply_tx(dbtx: &ModuleWriteTransactionCtx, supply: &Coins) -> DbResult<()> {
        dbtx.open_table(&tables::supply::TABLE)?
            .insert(&(), supply)?;
        Ok(())
    }

    /// Create new coins, only done at genesis
    pub(crate) fn mint_tx(
        dbtx: &ModuleWriteTransactionCtx,
        to: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), BankError> {
        let supply = Self::get_supply_tx(dbtx)?
            .checked_add(amount)
            .context(SupplyOverflowSnafu)
            .context(TxSnafu)?;
        let balance = Self::get_balance_tx(dbtx, to)?
            .checked_add(amount)
            .context(SupplyOverflowSnafu)
            .context(TxSnafu)?;
        Self::set_supply_tx(dbtx, &supply)?;
        Self::set_balance_tx(dbtx, to, &balance)?;
        Ok(())
    }

    fn take_tx(
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        let available = Self::get_balance_tx(dbtx, from)?;
        let Some(rest) = available.checked_sub(amount) else {
            return Err(InsufficientFundsError {
                available,
                required: amount.clone(),
            })
            .context(TxSnafu);
        };
        Self::set_balance_tx(dbtx, from, &rest)?;
        Ok(())
    }

    pub(crate) fn send_tx(
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        to: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        Self::take_tx(dbtx, from, amount)?;
        let balance = Self::get_balance_tx(dbtx, to)?
            .checked_add(amount)
            .expect("Can't exceed the supply");
        Self::set_balance_tx(dbtx, to, &balance)?;
        Ok(())
    }

    pub(crate) fn burn_tx(
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        Self::take_tx(dbtx, from, amount)?;
        let supply = Self::get_supply_tx(dbtx)?
            .checked_sub(amount)
            .expect("Balances are part of the supply");
        Self::set_supply_tx(dbtx, &supply)?;
        debug!(target: LOG_TARGET, %from, %amount, "Coins burned");
        Ok(())
    }

    pub(crate) fn process_msg_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        signer: AccAddress,
        msg: BankMsg,
    ) -> DbTxResult<Vec<ModuleEvent>, BankError> {
        match msg {
            BankMsg::Send { to, amount } => {
                if amount.is_zero() {
                    return EmptyAmountSnafu.fail().context(TxSnafu);
                }
                if self.blocked.contains(&to) {
                    return BlockedRecipientSnafu { addr: to }.fail().context(TxSnafu);
                }
                Self::send_tx(dbtx, signer, to, &amount).map_err(DbTxError::tx_into)?;
                Ok(vec![
                    EventTransfer {
                        from: signer,
                        to,
                        amount,
                    }
                    .to_event(),
                ])
            }
        }
    }

    pub(crate) fn init_genesis_tx(
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &BankGenesis,
    ) -> DbTxResult<(), BankError> {
        let mut seen = BTreeSet::new();
        for record in &genesis.balances {
            if !seen.insert(record.address) {
                return InvalidBankGenesisSnafu {
                    reason: format!("duplicate balance of {}", record.address),
                }
                .fail()
                .context(TxSnafu);
            }
            Self::mint_tx(dbtx, record.address, &record.coins)?;
        }
        Ok(())
    }

    pub(crate) fn export_genesis_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<BankGenesis> {
        Ok(BankGenesis {
            balances: Self::balances_tx(dbtx)?
                .into_iter()
                .map(|(address, coins)| BalanceRecord { address, coins })
                .collect(),
        })
    }
}

impl BankKeeper for BankLedger {
    fn balances(&self, dbtx: &ModuleWriteTransactionCtx, addr: AccAddress) -> DbResult<Coins> {
        Self::get_balance_tx(&dbtx.rescope(KIND), addr)
    }

    fn send_coins(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        to: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        Self::send_tx(&dbtx.rescope(KIND), from, to, amount)
    }

    fn burn_coins(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        Self::burn_tx(&dbtx.rescope(KIND), from, amount)
    }

    fn is_blocked(&self, addr: AccAddress) -> bool {
        self.blocked.contains(&addr)
    }
}

impl IModule for BankLedger {
    fn process_msg(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        _block: &BlockContext,
        signer: AccAddress,
        msg: &MsgRaw,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let msg = BankMsg::decode_from_raw(msg)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;
        self.process_msg_tx(&dbtx.rescope(KIND), signer, msg)
            .map_err(DbTxError::whatever)
    }

    fn init_genesis(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &serde_json::Value,
    ) -> DbTxResult<(), Whatever> {
        let genesis: BankGenesis = serde_json::from_value(genesis.clone())
            .whatever_context("Invalid bank genesis")
            .context(TxSnafu)?;
        Self::init_genesis_tx(&dbtx.rescope(KIND), &genesis).map_err(DbTxError::whatever)
    }

    fn export_genesis(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<serde_json::Value> {
        let genesis = Self::export_genesis_tx(&dbtx.rescope(KIND))?;
        Ok(serde_json::to_value(genesis).expect("Can't fail"))
    }
}
