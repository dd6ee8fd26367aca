//! Consistency checks of the reward bookkeeping

use std::fmt;

use lbm_core::block::BlockContext;
use lbm_core::dec_coin::DecCoins;
use lbm_module::module::db::{DbResult, ModuleWriteTransactionCtx, split_tx_error};
use lbm_util_db::range::{collect_range, collect_range_keys};
use lbm_util_error::fmt::FmtCompact as _;
use tracing::warn;

use crate::{DistributionModule, LOG_TARGET, module_account, tables};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub name: &'static str,
    pub description: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "distribution/{}: {}", self.name, self.description)
    }
}

impl DistributionModule {
    /// Run all the checks, collecting what's broken
    ///
    /// Withdraws every reward and commission to check they can be paid, so
    /// `dbtx` must never be committed afterwards.
    pub(crate) fn check_invariants_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
    ) -> DbResult<Vec<InvariantViolation>> {
        let mut violations = vec![];
        violations.extend(Self::nonnegative_outstanding_tx(dbtx)?);
        violations.extend(self.reference_count_tx(dbtx)?);
        violations.extend(self.module_account_tx(dbtx)?);
        violations.extend(self.can_withdraw_tx(dbtx)?);
        for violation in &violations {
            warn!(target: LOG_TARGET, %violation, "Invariant broken");
        }
        Ok(violations)
    }

    fn nonnegative_outstanding_tx(
        dbtx: &ModuleWriteTransactionCtx,
    ) -> DbResult<Option<InvariantViolation>> {
        let outstanding = collect_range(&dbtx.open_table(&tables::outstanding_rewards::TABLE)?, ..)?;
        let negative: Vec<_> = outstanding
            .into_iter()
            .filter(|(_, rewards)| rewards.is_any_negative())
            .map(|(validator, rewards)| format!("{validator} has {rewards}"))
            .collect();
        Ok((!negative.is_empty()).then(|| InvariantViolation {
            name: "nonnegative-outstanding",
            description: format!("negative outstanding rewards: {}", negative.join(", ")),
        }))
    }

    /// Historical rewards are referenced once per validator (by its current
    /// period), once per delegation, and once per slash event
    fn reference_count_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
    ) -> DbResult<Option<InvariantViolation>> {
        let validators = self.staking.validators(dbtx)?.len();
        let delegations = self.staking.delegations(dbtx)?.len();
        let slashes = collect_range_keys(&dbtx.open_table(&tables::slash_events::TABLE)?, ..)?.len();
        let expected = (validators + delegations + slashes) as u64;

        let actual: u64 = collect_range(&dbtx.open_table(&tables::historical_rewards::TABLE)?, ..)?
            .into_iter()
            .map(|(_, h)| u64::from(h.reference_count))
            .sum();

        Ok((expected != actual).then(|| InvariantViolation {
            name: "reference-count",
            description: format!(
                "expected {expected} references ({validators} validators, {delegations} delegations, {slashes} slashes), found {actual}"
            ),
        }))
    }

    fn module_account_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
    ) -> DbResult<Option<InvariantViolation>> {
        let outstanding = collect_range(&dbtx.open_table(&tables::outstanding_rewards::TABLE)?, ..)?
            .into_iter()
            .fold(DecCoins::empty(), |acc, (_, r)| acc.add(&r));
        let community_pool = Self::get_fee_pool_tx(dbtx)?.community_pool;
        let (expected, _) = outstanding.add(&community_pool).truncate_decimal();

        let balance = self.bank.balances(dbtx, module_account())?;
        Ok((balance != expected).then(|| InvariantViolation {
            name: "module-account",
            description: format!(
                "module account holds {balance}, expected {expected} (outstanding {outstanding}, community pool {community_pool})"
            ),
        }))
    }

    /// Withdraw everything and check no outstanding rewards go negative
    fn can_withdraw_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
    ) -> DbResult<Option<InvariantViolation>> {
        // heights only matter for skipping same-block withdrawals
        let block = BlockContext::new(u64::MAX, Default::default());
        let mut failures = vec![];

        for val in self.staking.validators(dbtx)? {
            if Self::get_commission_tx(dbtx, val.operator)?.is_zero() {
                continue;
            }
            if let Err(err) = split_tx_error(self.withdraw_validator_commission_tx(dbtx, val.operator))? {
                failures.push(format!("commission of {}: {}", val.operator, err.fmt_compact()));
            }
        }

        for delegation in self.staking.delegations(dbtx)? {
            let res = split_tx_error(self.withdraw_delegation_rewards_tx(
                dbtx,
                &block,
                delegation.delegator,
                delegation.validator,
            ))?;
            if let Err(err) = res {
                failures.push(format!(
                    "rewards of {} from {}: {}",
                    delegation.delegator,
                    delegation.validator,
                    err.fmt_compact()
                ));
            }
        }

        for (validator, remaining) in
            collect_range(&dbtx.open_table(&tables::outstanding_rewards::TABLE)?, ..)?
        {
            if remaining.is_any_negative() {
                failures.push(format!("{validator} left with {remaining}"));
            }
        }

        Ok((!failures.is_empty()).then(|| InvariantViolation {
            name: "can-withdraw",
            description: failures.join(", "),
        }))
    }
}
