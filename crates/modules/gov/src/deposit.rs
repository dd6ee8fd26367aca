use lbm_core::address::AccAddress;
use lbm_core::block::BlockContext;
use lbm_core::coin::Coins;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::module::db::{DbResult, DbTxError, DbTxResult, ModuleWriteTransactionCtx};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{debug, info};

use crate::error::{DepositOverflowSnafu, GovError, InactiveProposalSnafu};
use crate::events::{EventProposalDeposit, EventVotingPeriodStart};
use crate::module::{GovModule, module_account};
use crate::types::{Deposit, Proposal, ProposalId, ProposalStatus};
use crate::LOG_TARGET;

impl GovModule {
    /// Add `amount` to the deposit of `depositor`
    ///
    /// Returns whether this deposit started the voting period.
    pub(crate) fn add_deposit_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        proposal_id: ProposalId,
        depositor: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(bool, Vec<ModuleEvent>), GovError> {
        let mut proposal = Self::existing_proposal_tx(dbtx, proposal_id)?;
        if !matches!(
            proposal.status,
            ProposalStatus::DepositPeriod | ProposalStatus::VotingPeriod
        ) {
            return InactiveProposalSnafu {
                proposal_id,
                status: proposal.status,
            }
            .fail()
            .context(TxSnafu);
        }

        let deposit_amount = match Self::get_deposit_tx(dbtx, proposal_id, depositor)? {
            Some(existing) => add_coins(&existing.amount, amount)?,
            None => amount.clone(),
        };
        proposal.total_deposit = add_coins(&proposal.total_deposit, amount)?;

        if !amount.is_zero() {
            self.bank
                .send_coins(dbtx, depositor, module_account(), amount)
                .map_err(DbTxError::tx_into)?;
        }
        Self::set_deposit_tx(
            dbtx,
            &Deposit {
                proposal_id,
                depositor,
                amount: deposit_amount,
            },
        )?;

        let mut events = vec![
            EventProposalDeposit {
                proposal_id,
                depositor,
                amount: amount.clone(),
            }
            .to_event(),
        ];

        let min_deposit = Self::get_params_tx(dbtx)?.deposit.min_deposit;
        let activated = proposal.status == ProposalStatus::DepositPeriod
            && proposal.total_deposit.is_all_gte(&min_deposit);
        if activated {
            self.activate_voting_period_tx(dbtx, block, &mut proposal)?;
            events.push(EventVotingPeriodStart { proposal_id }.to_event());
        } else {
            debug!(target: LOG_TARGET, %proposal_id, total = %proposal.total_deposit, "Deposit added");
        }

        Self::set_proposal_tx(dbtx, &proposal)?;
        Ok((activated, events))
    }

    fn activate_voting_period_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        proposal: &mut Proposal,
    ) -> DbResult<()> {
        let voting_period_secs = Self::get_params_tx(dbtx)?.voting.voting_period_secs;
        let voting_end_time = block.time.add_secs(voting_period_secs);

        Self::remove_inactive_queue_tx(dbtx, proposal.deposit_end_time, proposal.id)?;
        Self::insert_active_queue_tx(dbtx, voting_end_time, proposal.id)?;

        proposal.status = ProposalStatus::VotingPeriod;
        proposal.voting_start_time = Some(block.time);
        proposal.voting_end_time = Some(voting_end_time);

        info!(target: LOG_TARGET, proposal_id = %proposal.id, %voting_end_time, "Voting period started");
        Ok(())
    }

    pub(crate) fn refund_deposits_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbTxResult<(), GovError> {
        for deposit in Self::deposits_of_tx(dbtx, proposal_id)? {
            if deposit.amount.is_zero() {
                continue;
            }
            self.bank
                .send_coins(dbtx, module_account(), deposit.depositor, &deposit.amount)
                .map_err(DbTxError::tx_into)?;
        }
        Self::delete_deposits_tx(dbtx, proposal_id)?;
        Ok(())
    }

    pub(crate) fn burn_deposits_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbTxResult<(), GovError> {
        for deposit in Self::deposits_of_tx(dbtx, proposal_id)? {
            if deposit.amount.is_zero() {
                continue;
            }
            self.bank
                .burn_coins(dbtx, module_account(), &deposit.amount)
                .map_err(DbTxError::tx_into)?;
        }
        Self::delete_deposits_tx(dbtx, proposal_id)?;
        Ok(())
    }
}

fn add_coins(a: &Coins, b: &Coins) -> DbTxResult<Coins, GovError> {
    a.checked_add(b).context(DepositOverflowSnafu).context(TxSnafu)
}
