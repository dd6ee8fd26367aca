use lbm_core::block::BlockContext;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::module::db::{DbTxResult, ModuleWriteTransactionCtx};
use lbm_util_db::range::collect_range_keys;
use lbm_util_error::Whatever;
use lbm_util_error::fmt::FmtCompact as _;
use tracing::{info, warn};

use crate::error::GovError;
use crate::events::{EventProposalDropped, EventProposalFinished};
use crate::module::GovModule;
use crate::types::{ProposalId, ProposalStatus};
use crate::{LOG_TARGET, tables};

impl GovModule {
    /// Settle proposals whose deposit or voting period is over
    pub(crate) fn end_block_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
    ) -> DbTxResult<Vec<ModuleEvent>, GovError> {
        let mut events = vec![];

        let expired_deposits = collect_range_keys(
            &dbtx.open_table(&tables::inactive_queue::TABLE)?,
            ..=(block.time, ProposalId::MAX),
        )?;
        for (deposit_end_time, proposal_id) in expired_deposits {
            Self::remove_inactive_queue_tx(dbtx, deposit_end_time, proposal_id)?;
            Self::delete_proposal_tx(dbtx, proposal_id)?;
            self.burn_deposits_tx(dbtx, proposal_id)?;

            info!(target: LOG_TARGET, %proposal_id, "Proposal dropped, minimum deposit not reached");
            events.push(EventProposalDropped { proposal_id }.to_event());
        }

        let ended_votings = collect_range_keys(
            &dbtx.open_table(&tables::active_queue::TABLE)?,
            ..=(block.time, ProposalId::MAX),
        )?;
        for (voting_end_time, proposal_id) in ended_votings {
            Self::remove_active_queue_tx(dbtx, voting_end_time, proposal_id)?;
            let Some(mut proposal) = Self::get_proposal_tx(dbtx, proposal_id)? else {
                warn!(target: LOG_TARGET, %proposal_id, "Queued proposal missing");
                continue;
            };

            let outcome = self.tally_tx(dbtx, &proposal)?;
            if outcome.burn_deposits {
                self.burn_deposits_tx(dbtx, proposal_id)?;
            } else {
                self.refund_deposits_tx(dbtx, proposal_id)?;
            }
            Self::delete_votes_tx(dbtx, proposal_id)?;

            proposal.status = if outcome.passes {
                Self::insert_execution_queue_tx(dbtx, proposal_id)?;
                ProposalStatus::Passed
            } else {
                ProposalStatus::Rejected
            };
            proposal.final_tally_result = outcome.result;
            Self::set_proposal_tx(dbtx, &proposal)?;

            info!(target: LOG_TARGET, %proposal_id, status = %proposal.status, "Voting period ended");
            if proposal.status == ProposalStatus::Rejected {
                events.push(
                    EventProposalFinished {
                        proposal_id,
                        status: proposal.status,
                    }
                    .to_event(),
                );
            }
        }

        Ok(events)
    }

    /// Run the handlers of proposals passed by [`Self::end_block_tx`]
    ///
    /// Each proposal executes in its own transaction. A handler error rolls
    /// back everything the handler wrote and marks the proposal `Failed`.
    pub async fn execute_passed_proposals(&self) -> Vec<ModuleEvent> {
        let queued = self
            .db
            .read_with_expect(|dbtx| {
                Ok(collect_range_keys(
                    &dbtx.open_table(&tables::execution_queue::TABLE)?,
                    ..,
                )?)
            })
            .await;

        let mut events = vec![];
        for proposal_id in queued {
            let res = self
                .db
                .write_with_expect_falliable(|dbtx| -> DbTxResult<_, Whatever> {
                    Self::remove_execution_queue_tx(dbtx, proposal_id)?;
                    let Some(proposal) = Self::get_proposal_tx(dbtx, proposal_id)? else {
                        warn!(target: LOG_TARGET, %proposal_id, "Passed proposal missing");
                        return Ok(vec![]);
                    };
                    let mut handler_events =
                        self.execute_proposal_content_tx(dbtx, &proposal.content)?;
                    handler_events.push(
                        EventProposalFinished {
                            proposal_id,
                            status: ProposalStatus::Passed,
                        }
                        .to_event(),
                    );
                    Ok(handler_events)
                })
                .await;

            match res {
                Ok(handler_events) => events.extend(handler_events),
                Err(err) => {
                    warn!(
                        target: LOG_TARGET,
                        %proposal_id,
                        err = %err.fmt_compact(),
                        "Passed proposal failed to execute"
                    );
                    events.extend(
                        self.db
                            .write_with_expect(|dbtx| {
                                Self::remove_execution_queue_tx(dbtx, proposal_id)?;
                                let Some(mut proposal) = Self::get_proposal_tx(dbtx, proposal_id)?
                                else {
                                    return Ok(None);
                                };
                                proposal.status = ProposalStatus::Failed;
                                Self::set_proposal_tx(dbtx, &proposal)?;
                                Ok(Some(
                                    EventProposalFinished {
                                        proposal_id,
                                        status: ProposalStatus::Failed,
                                    }
                                    .to_event(),
                                ))
                            })
                            .await,
                    );
                }
            }
        }
        events
    }
}
