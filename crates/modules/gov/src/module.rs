use std::sync::Arc;

use lbm_core::address::AccAddress;
use lbm_core::block::BlockContext;
use lbm_core::coin::Coins;
use lbm_core::msg::MsgRaw;
use lbm_core::timestamp::Timestamp;
use lbm_core::ver::ConsensusVersion;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{BankKeeper, StakingKeeper};
use lbm_module::module::IModule;
use lbm_module::module::db::{
    DbResult, DbTxError, DbTxResult, ModuleDatabase, ModuleReadableTransaction,
    ModuleWriteTransactionCtx,
};
use lbm_module::msg::ModuleMsg as _;
use lbm_module::proposal::{ProposalContent, ProposalRouter};
use lbm_util_db::range::collect_range;
use lbm_util_db::redb_bincode::ReadableTable as _;
use lbm_util_error::Whatever;
use snafu::{OptionExt as _, ResultExt as _};
use tracing::debug;

use crate::error::{
    GovError, GovResult, InvalidProposalContentSnafu, NoProposalHandlerExistsSnafu,
    UnknownProposalSnafu,
};
use crate::events::{EventSubmitProposal, EventUpdateParams};
use crate::genesis::GovGenesis;
use crate::msg::GovMsg;
use crate::params::GovParams;
use crate::proposal::GovProposal;
use crate::types::{
    Deposit, Proposal, ProposalId, ProposalStatus, TallyResult, Vote, WeightedVoteOption,
};
use crate::{KIND, LOG_TARGET, MODULE_ACCOUNT, tables};

/// Id of the first proposal of a new chain
pub const DEFAULT_STARTING_PROPOSAL_ID: ProposalId = ProposalId::new(1);

pub struct GovModule {
    #[allow(dead_code)]
    pub(crate) version: ConsensusVersion,
    pub(crate) db: ModuleDatabase,
    pub(crate) bank: Arc<dyn BankKeeper>,
    pub(crate) staking: Arc<dyn StakingKeeper>,
    pub(crate) router: ProposalRouter,
}

/// Address of the account holding proposal deposits
pub fn module_account() -> AccAddress {
    AccAddress::module(MODULE_ACCOUNT)
}

/// Criteria for [`GovModule::proposals`], all optional
#[derive(Debug, Clone, Default)]
pub struct ProposalFilter {
    pub status: Option<ProposalStatus>,
    pub voter: Option<AccAddress>,
    pub depositor: Option<AccAddress>,
}

impl GovModule {
    pub fn new(
        version: ConsensusVersion,
        db: ModuleDatabase,
        bank: Arc<dyn BankKeeper>,
        staking: Arc<dyn StakingKeeper>,
        router: ProposalRouter,
    ) -> Self {
        Self {
            version,
            db,
            bank,
            staking,
            router,
        }
    }

    pub(crate) fn init_db_tx(
        dbtx: &ModuleWriteTransactionCtx,
        version: ConsensusVersion,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::self_version::TABLE)?
            .insert(&(), &version)?;
        dbtx.open_table(&tables::params::TABLE)?;
        dbtx.open_table(&tables::next_proposal_id::TABLE)?;
        dbtx.open_table(&tables::proposals::TABLE)?;
        dbtx.open_table(&tables::inactive_queue::TABLE)?;
        dbtx.open_table(&tables::active_queue::TABLE)?;
        dbtx.open_table(&tables::deposits::TABLE)?;
        dbtx.open_table(&tables::votes::TABLE)?;
        dbtx.open_table(&tables::execution_queue::TABLE)?;
        Ok(())
    }

    // Queries

    pub async fn params(&self) -> GovParams {
        self.db
            .read_with_expect(|dbtx| Self::get_params_tx(dbtx))
            .await
    }

    pub async fn proposal(&self, proposal_id: ProposalId) -> Option<Proposal> {
        self.db
            .read_with_expect(|dbtx| Self::get_proposal_tx(dbtx, proposal_id))
            .await
    }

    pub async fn proposals(&self, filter: &ProposalFilter) -> Vec<Proposal> {
        self.db
            .read_with_expect(|dbtx| {
                let mut res = vec![];
                for proposal in Self::proposals_tx(dbtx)? {
                    if filter.status.is_some_and(|s| s != proposal.status) {
                        continue;
                    }
                    if let Some(voter) = filter.voter {
                        if Self::get_vote_tx(dbtx, proposal.id, voter)?.is_none() {
                            continue;
                        }
                    }
                    if let Some(depositor) = filter.depositor {
                        if Self::get_deposit_tx(dbtx, proposal.id, depositor)?.is_none() {
                            continue;
                        }
                    }
                    res.push(proposal);
                }
                Ok(res)
            })
            .await
    }

    pub async fn vote(&self, proposal_id: ProposalId, voter: AccAddress) -> Option<Vote> {
        self.db
            .read_with_expect(|dbtx| Self::get_vote_tx(dbtx, proposal_id, voter))
            .await
    }

    pub async fn votes(&self, proposal_id: ProposalId) -> Vec<Vote> {
        self.db
            .read_with_expect(|dbtx| Self::votes_of_tx(dbtx, proposal_id))
            .await
    }

    pub async fn deposit(&self, proposal_id: ProposalId, depositor: AccAddress) -> Option<Deposit> {
        self.db
            .read_with_expect(|dbtx| Self::get_deposit_tx(dbtx, proposal_id, depositor))
            .await
    }

    pub async fn deposits(&self, proposal_id: ProposalId) -> Vec<Deposit> {
        self.db
            .read_with_expect(|dbtx| Self::deposits_of_tx(dbtx, proposal_id))
            .await
    }

    /// Current tally of a proposal
    ///
    /// Final for finished proposals, live for the ones being voted on, and
    /// empty before voting starts.
    pub async fn tally_result(&self, proposal_id: ProposalId) -> GovResult<TallyResult> {
        self.db
            .simulate_with_expect(|dbtx| {
                let Some(proposal) = Self::get_proposal_tx(dbtx, proposal_id)? else {
                    return Ok(UnknownProposalSnafu { proposal_id }.fail());
                };
                Ok(Ok(match proposal.status {
                    ProposalStatus::DepositPeriod => TallyResult::default(),
                    ProposalStatus::VotingPeriod => self.tally_tx(dbtx, &proposal)?.result,
                    ProposalStatus::Passed | ProposalStatus::Rejected | ProposalStatus::Failed => {
                        proposal.final_tally_result
                    }
                }))
            })
            .await
    }

    // Operations

    /// Check content the way its handler will see it at execution
    pub(crate) fn validate_proposal_content(&self, content: &ProposalContent) -> GovResult<()> {
        if content.route == KIND {
            GovProposal::from_content_validated(content)?;
            return Ok(());
        }
        let handler = self
            .router
            .handler(content.route)
            .context(NoProposalHandlerExistsSnafu {
                route: content.route,
            })?;
        handler
            .validate_content(content)
            .context(InvalidProposalContentSnafu)
    }

    pub(crate) fn execute_proposal_content_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        content: &ProposalContent,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        if content.route == KIND {
            let proposal = GovProposal::from_content_validated(content)
                .map_err(Whatever::from_error)
                .context(TxSnafu)?;
            return match proposal {
                GovProposal::Text => Ok(vec![]),
                GovProposal::UpdateParams(p) => {
                    Self::set_params_tx(dbtx, &p.params)?;
                    Ok(vec![EventUpdateParams { params: p.params }.to_event()])
                }
            };
        }
        let handler = self
            .router
            .handler(content.route)
            .whatever_context("Proposal handler not registered anymore")
            .context(TxSnafu)?;
        handler.execute_proposal(dbtx, content)
    }

    pub fn submit_proposal_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        proposer: AccAddress,
        content: ProposalContent,
        initial_deposit: &Coins,
    ) -> DbTxResult<(ProposalId, Vec<ModuleEvent>), GovError> {
        self.validate_proposal_content(&content).context(TxSnafu)?;

        let params = Self::get_params_tx(dbtx)?;
        let proposal_id = Self::get_next_proposal_id_tx(dbtx)?;
        let route = content.route;
        let deposit_end_time = block
            .time
            .add_secs(params.deposit.max_deposit_period_secs);

        Self::set_proposal_tx(
            dbtx,
            &Proposal {
                id: proposal_id,
                content,
                status: ProposalStatus::DepositPeriod,
                final_tally_result: TallyResult::default(),
                submit_time: block.time,
                deposit_end_time,
                total_deposit: Coins::empty(),
                voting_start_time: None,
                voting_end_time: None,
            },
        )?;
        Self::insert_inactive_queue_tx(dbtx, deposit_end_time, proposal_id)?;
        Self::set_next_proposal_id_tx(dbtx, proposal_id.saturating_add(1))?;
        debug!(target: LOG_TARGET, %proposal_id, %proposer, %route, "Proposal submitted");

        let mut events = vec![
            EventSubmitProposal {
                proposal_id,
                route,
            }
            .to_event(),
        ];
        let (_, deposit_events) =
            self.add_deposit_tx(dbtx, block, proposal_id, proposer, initial_deposit)?;
        events.extend(deposit_events);

        Ok((proposal_id, events))
    }

    pub(crate) fn process_msg_tx(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: GovMsg,
    ) -> DbTxResult<Vec<ModuleEvent>, GovError> {
        match msg {
            GovMsg::SubmitProposal {
                content,
                initial_deposit,
            } => self
                .submit_proposal_tx(dbtx, block, signer, content, &initial_deposit)
                .map(|(_, events)| events),
            GovMsg::Deposit {
                proposal_id,
                amount,
            } => self
                .add_deposit_tx(dbtx, block, proposal_id, signer, &amount)
                .map(|(_, events)| events),
            GovMsg::Vote {
                proposal_id,
                option,
            } => Self::add_vote_tx(
                dbtx,
                proposal_id,
                signer,
                vec![WeightedVoteOption::full(option)],
            ),
            GovMsg::VoteWeighted {
                proposal_id,
                options,
            } => Self::add_vote_tx(dbtx, proposal_id, signer, options),
        }
    }

    // State accessors

    pub fn get_params_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<GovParams> {
        Ok(dbtx
            .open_table(&tables::params::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or_default())
    }

    pub fn set_params_tx(dbtx: &ModuleWriteTransactionCtx, params: &GovParams) -> DbResult<()> {
        dbtx.open_table(&tables::params::TABLE)?
            .insert(&(), params)?;
        Ok(())
    }

    pub fn get_next_proposal_id_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<ProposalId> {
        Ok(dbtx
            .open_table(&tables::next_proposal_id::TABLE)?
            .get(&())?
            .map(|v| v.value())
            .unwrap_or(DEFAULT_STARTING_PROPOSAL_ID))
    }

    pub fn set_next_proposal_id_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::next_proposal_id::TABLE)?
            .insert(&(), &proposal_id)?;
        Ok(())
    }

    pub fn get_proposal_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        proposal_id: ProposalId,
    ) -> DbResult<Option<Proposal>> {
        Ok(dbtx
            .open_table(&tables::proposals::TABLE)?
            .get(&proposal_id)?
            .map(|v| v.value()))
    }

    pub(crate) fn existing_proposal_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbTxResult<Proposal, GovError> {
        match Self::get_proposal_tx(dbtx, proposal_id)? {
            Some(proposal) => Ok(proposal),
            None => UnknownProposalSnafu { proposal_id }.fail().context(TxSnafu),
        }
    }

    pub fn set_proposal_tx(dbtx: &ModuleWriteTransactionCtx, proposal: &Proposal) -> DbResult<()> {
        dbtx.open_table(&tables::proposals::TABLE)?
            .insert(&proposal.id, proposal)?;
        Ok(())
    }

    pub(crate) fn delete_proposal_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::proposals::TABLE)?
            .remove(&proposal_id)?;
        Ok(())
    }

    pub fn proposals_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<Proposal>> {
        Ok(
            collect_range(&dbtx.open_table(&tables::proposals::TABLE)?, ..)?
                .into_iter()
                .map(|(_, p)| p)
                .collect(),
        )
    }

    pub(crate) fn insert_inactive_queue_tx(
        dbtx: &ModuleWriteTransactionCtx,
        end_time: Timestamp,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::inactive_queue::TABLE)?
            .insert(&(end_time, proposal_id), &())?;
        Ok(())
    }

    pub(crate) fn remove_inactive_queue_tx(
        dbtx: &ModuleWriteTransactionCtx,
        end_time: Timestamp,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::inactive_queue::TABLE)?
            .remove(&(end_time, proposal_id))?;
        Ok(())
    }

    pub(crate) fn insert_active_queue_tx(
        dbtx: &ModuleWriteTransactionCtx,
        end_time: Timestamp,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::active_queue::TABLE)?
            .insert(&(end_time, proposal_id), &())?;
        Ok(())
    }

    pub(crate) fn insert_execution_queue_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::execution_queue::TABLE)?
            .insert(&proposal_id, &())?;
        Ok(())
    }

    pub(crate) fn remove_execution_queue_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::execution_queue::TABLE)?
            .remove(&proposal_id)?;
        Ok(())
    }

    pub(crate) fn remove_active_queue_tx(
        dbtx: &ModuleWriteTransactionCtx,
        end_time: Timestamp,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::active_queue::TABLE)?
            .remove(&(end_time, proposal_id))?;
        Ok(())
    }

    pub fn get_deposit_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        proposal_id: ProposalId,
        depositor: AccAddress,
    ) -> DbResult<Option<Deposit>> {
        Ok(dbtx
            .open_table(&tables::deposits::TABLE)?
            .get(&(proposal_id, depositor))?
            .map(|v| Deposit {
                proposal_id,
                depositor,
                amount: v.value(),
            }))
    }

    pub fn set_deposit_tx(dbtx: &ModuleWriteTransactionCtx, deposit: &Deposit) -> DbResult<()> {
        dbtx.open_table(&tables::deposits::TABLE)?
            .insert(&(deposit.proposal_id, deposit.depositor), &deposit.amount)?;
        Ok(())
    }

    pub fn deposits_of_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        proposal_id: ProposalId,
    ) -> DbResult<Vec<Deposit>> {
        Ok(collect_range(
            &dbtx.open_table(&tables::deposits::TABLE)?,
            (proposal_id, AccAddress::MIN)..=(proposal_id, AccAddress::MAX),
        )?
        .into_iter()
        .map(|((proposal_id, depositor), amount)| Deposit {
            proposal_id,
            depositor,
            amount,
        })
        .collect())
    }

    pub fn all_deposits_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
    ) -> DbResult<Vec<Deposit>> {
        Ok(
            collect_range(&dbtx.open_table(&tables::deposits::TABLE)?, ..)?
                .into_iter()
                .map(|((proposal_id, depositor), amount)| Deposit {
                    proposal_id,
                    depositor,
                    amount,
                })
                .collect(),
        )
    }

    pub(crate) fn delete_deposits_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::deposits::TABLE)?
            .retain(|(id, _), _| *id != proposal_id)?;
        Ok(())
    }

    pub fn get_vote_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        proposal_id: ProposalId,
        voter: AccAddress,
    ) -> DbResult<Option<Vote>> {
        Ok(dbtx
            .open_table(&tables::votes::TABLE)?
            .get(&(proposal_id, voter))?
            .map(|v| Vote {
                proposal_id,
                voter,
                options: v.value(),
            }))
    }

    pub fn set_vote_tx(dbtx: &ModuleWriteTransactionCtx, vote: &Vote) -> DbResult<()> {
        dbtx.open_table(&tables::votes::TABLE)?
            .insert(&(vote.proposal_id, vote.voter), &vote.options)?;
        Ok(())
    }

    pub fn votes_of_tx<'dbtx>(
        dbtx: &impl ModuleReadableTransaction<'dbtx>,
        proposal_id: ProposalId,
    ) -> DbResult<Vec<Vote>> {
        Ok(collect_range(
            &dbtx.open_table(&tables::votes::TABLE)?,
            (proposal_id, AccAddress::MIN)..=(proposal_id, AccAddress::MAX),
        )?
        .into_iter()
        .map(|((proposal_id, voter), options)| Vote {
            proposal_id,
            voter,
            options,
        })
        .collect())
    }

    pub fn all_votes_tx<'dbtx>(dbtx: &impl ModuleReadableTransaction<'dbtx>) -> DbResult<Vec<Vote>> {
        Ok(
            collect_range(&dbtx.open_table(&tables::votes::TABLE)?, ..)?
                .into_iter()
                .map(|((proposal_id, voter), options)| Vote {
                    proposal_id,
                    voter,
                    options,
                })
                .collect(),
        )
    }

    pub(crate) fn delete_votes_tx(
        dbtx: &ModuleWriteTransactionCtx,
        proposal_id: ProposalId,
    ) -> DbResult<()> {
        dbtx.open_table(&tables::votes::TABLE)?
            .retain(|(id, _), _| *id != proposal_id)?;
        Ok(())
    }
}

impl IModule for GovModule {
    fn process_msg(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
        signer: AccAddress,
        msg: &MsgRaw,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let msg = GovMsg::decode_from_raw(msg)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;
        self.process_msg_tx(dbtx, block, signer, msg)
            .map_err(DbTxError::whatever)
    }

    fn end_block(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        block: &BlockContext,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        self.end_block_tx(dbtx, block).map_err(DbTxError::whatever)
    }

    fn init_genesis(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        genesis: &serde_json::Value,
    ) -> DbTxResult<(), Whatever> {
        let genesis: GovGenesis = serde_json::from_value(genesis.clone())
            .whatever_context("Invalid gov genesis")
            .context(TxSnafu)?;
        self.init_genesis_tx(dbtx, &genesis)
            .map_err(DbTxError::whatever)
    }

    fn export_genesis(&self, dbtx: &ModuleWriteTransactionCtx) -> DbResult<serde_json::Value> {
        let genesis = Self::export_genesis_tx(dbtx)?;
        Ok(serde_json::to_value(genesis).expect("Can't fail"))
    }
}
