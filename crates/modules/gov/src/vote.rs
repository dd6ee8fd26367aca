use std::collections::BTreeSet;

use lbm_core::address::AccAddress;
use lbm_core::dec::Dec;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::module::db::{DbTxResult, ModuleWriteTransactionCtx};
use snafu::{ResultExt as _, ensure};
use tracing::debug;

use crate::LOG_TARGET;
use crate::error::{GovError, InactiveProposalSnafu, InvalidVoteSnafu};
use crate::events::EventProposalVote;
use crate::module::GovModule;
use crate::types::{ProposalId, ProposalStatus, Vote, WeightedVoteOption};

/// Check weighted options add up to a single whole vote
pub fn validate_vote_options(options: &[WeightedVoteOption]) -> Result<(), GovError> {
    ensure!(!options.is_empty(), InvalidVoteSnafu { reason: "no options" });

    let mut seen = BTreeSet::new();
    let mut total = Dec::zero();
    for option in options {
        ensure!(
            option.weight.is_positive() && option.weight <= Dec::one(),
            InvalidVoteSnafu {
                reason: "option weight out of range"
            }
        );
        ensure!(
            seen.insert(option.option),
            InvalidVoteSnafu {
                reason: "duplicate option"
            }
        );
        total += &option.weight;
    }
    ensure!(
        total == Dec::one(),
        InvalidVoteSnafu {
            reason: "option weights must add up to 1"
        }
    );
    Ok(())
}

impl GovModule {
    /// Record the vote of `voter`, replacing any earlier one
    pub(crate) fn add_vote_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
        voter: AccAddress,
        options: Vec<WeightedVoteOption>,
    ) -> DbTxResult<Vec<ModuleEvent>, GovError> {
        let proposal = Self::existing_proposal_tx(dbtx, proposal_id)?;
        if proposal.status != ProposalStatus::VotingPeriod {
            return InactiveProposalSnafu {
                proposal_id,
                status: proposal.status,
            }
            .fail()
            .context(TxSnafu);
        }
        validate_vote_options(&options).context(TxSnafu)?;

        Self::set_vote_tx(
            dbtx,
            &Vote {
                proposal_id,
                voter,
                options: options.clone(),
            },
        )?;
        debug!(target: LOG_TARGET, %proposal_id, %voter, "Vote cast");

        Ok(vec![
            EventProposalVote {
                proposal_id,
                voter,
                options,
            }
            .to_event(),
        ])
    }
}
