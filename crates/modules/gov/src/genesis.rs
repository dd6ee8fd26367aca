use lbm_core::coin::Coins;
use lbm_db::error::TxSnafu;
use lbm_module::module::db::{
    DbResult, DbTxResult, ModuleReadableTransaction, ModuleWriteTransactionCtx,
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::error::{GovError, InvalidGenesisSnafu};
use crate::module::{DEFAULT_STARTING_PROPOSAL_ID, GovModule, module_account};
use crate::params::GovParams;
use crate::types::{Deposit, Proposal, ProposalId, ProposalStatus, Vote};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovGenesis {
    pub starting_proposal_id: ProposalId,
    pub params: GovParams,
    pub proposals: Vec<Proposal>,
    pub deposits: Vec<Deposit>,
    pub votes: Vec<Vote>,
}

impl Default for GovGenesis {
    fn default() -> Self {
        Self {
            starting_proposal_id: DEFAULT_STARTING_PROPOSAL_ID,
            params: GovParams::default(),
            proposals: vec![],
            deposits: vec![],
            votes: vec![],
        }
    }
}

impl GovGenesis {
    pub fn validate(&self) -> Result<(), GovError> {
        self.params.validate()?;
        for proposal in &self.proposals {
            if self.starting_proposal_id <= proposal.id {
                return InvalidGenesisSnafu {
                    reason: format!(
                        "proposal {} not below starting id {}",
                        proposal.id, self.starting_proposal_id
                    ),
                }
                .fail();
            }
            if proposal.status == ProposalStatus::VotingPeriod
                && proposal.voting_end_time.is_none()
            {
                return InvalidGenesisSnafu {
                    reason: format!("proposal {} in voting period without end time", proposal.id),
                }
                .fail();
            }
        }
        Ok(())
    }

    fn total_deposits(&self) -> Coins {
        self.deposits.iter().fold(Coins::empty(), |acc, d| {
            acc.checked_add(&d.amount).unwrap_or(acc)
        })
    }
}

impl GovModule {
    pub(crate) fn init_genesis_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &GovGenesis,
    ) -> DbTxResult<(), GovError> {
        genesis.validate().context(TxSnafu)?;

        Self::set_params_tx(dbtx, &genesis.params)?;
        Self::set_next_proposal_id_tx(dbtx, genesis.starting_proposal_id)?;
        for deposit in &genesis.deposits {
            Self::set_deposit_tx(dbtx, deposit)?;
        }
        for vote in &genesis.votes {
            Self::set_vote_tx(dbtx, vote)?;
        }
        for proposal in &genesis.proposals {
            match (proposal.status, proposal.voting_end_time) {
                (ProposalStatus::DepositPeriod, _) => {
                    Self::insert_inactive_queue_tx(dbtx, proposal.deposit_end_time, proposal.id)?;
                }
                (ProposalStatus::VotingPeriod, Some(voting_end_time)) => {
                    Self::insert_active_queue_tx(dbtx, voting_end_time, proposal.id)?;
                }
                _ => {}
            }
            Self::set_proposal_tx(dbtx, proposal)?;
        }

        let expected = genesis.total_deposits();
        let balance = self.bank.balances(dbtx, module_account())?;
        if balance != expected {
            return InvalidGenesisSnafu {
                reason: format!("module account holds {balance}, deposits add up to {expected}"),
            }
            .fail()
            .context(TxSnafu);
        }
        Ok(())
    }

    pub(crate) fn export_genesis_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<GovGenesis> {
        Ok(GovGenesis {
            starting_proposal_id: Self::get_next_proposal_id_tx(dbtx)?,
            params: Self::get_params_tx(dbtx)?,
            proposals: Self::proposals_tx(dbtx)?,
            deposits: Self::all_deposits_tx(dbtx)?,
            votes: Self::all_votes_tx(dbtx)?,
        })
    }
}
