use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use bincode::{Decode, Encode};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockContext;
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_core::module::ModuleKind;
use lbm_core::timestamp::Timestamp;
use lbm_db::Database;
use lbm_db::error::TxSnafu;
use lbm_module::event::{EventKindExt as _, ModuleEvent};
use lbm_module::keepers::{
    BankKeeper, DelegationInfo, InsufficientFundsError, StakingKeeper, ValidatorInfo,
};
use lbm_module::module::db::{DbResult, DbTxResult, ModuleWriteTransactionCtx};
use lbm_module::module::{IModule as _, ModuleInitArgs};
use lbm_module::proposal::{
    ProposalContent, ProposalHandler, ProposalKind, ProposalRouter,
};
use lbm_util_db::def_table;
use lbm_util_db::redb_bincode::ReadableTable as _;
use lbm_util_error::{BoxedErrorResult, Whatever, WhateverResult};
use snafu::{FromString as _, ResultExt as _};

use crate::error::GovError;
use crate::events::{
    EventProposalDropped, EventProposalFinished, EventUpdateParams, EventVotingPeriodStart,
};
use crate::genesis::GovGenesis;
use crate::msg::GovMsg;
use crate::params::GovParams;
use crate::proposal::{GovProposal, UpdateGovParamsProposal};
use crate::types::{ProposalId, ProposalStatus, TallyResult, VoteOption, WeightedVoteOption};
use crate::{CURRENT_VERSION, GovModule, GovModuleInit, KIND, module_account};

const DENOM: &str = "stake";
const PERIOD_SECS: u64 = 100;
const SIGNAL_ROUTE: ModuleKind = ModuleKind::new(200);

#[derive(Default)]
struct MemBank {
    balances: Mutex<BTreeMap<AccAddress, Coins>>,
}

impl MemBank {
    fn mint(&self, addr: AccAddress, amount: u128) {
        let mut balances = self.balances.lock().expect("Locking failed");
        let balance = balances.entry(addr).or_default();
        *balance = balance.checked_add(&stake(amount)).expect("No overflow");
    }

    fn balance(&self, addr: AccAddress) -> u128 {
        self.balances
            .lock()
            .expect("Locking failed")
            .get(&addr)
            .map(|c| c.amount_of(DENOM))
            .unwrap_or_default()
    }

    fn take(&self, addr: AccAddress, amount: &Coins) -> Result<(), InsufficientFundsError> {
        let mut balances = self.balances.lock().expect("Locking failed");
        let available = balances.get(&addr).cloned().unwrap_or_default();
        let Some(rest) = available.checked_sub(amount) else {
            return Err(InsufficientFundsError {
                available,
                required: amount.clone(),
            });
        };
        balances.insert(addr, rest);
        Ok(())
    }
}

impl BankKeeper for MemBank {
    fn balances(&self, _dbtx: &ModuleWriteTransactionCtx, addr: AccAddress) -> DbResult<Coins> {
        Ok(self
            .balances
            .lock()
            .expect("Locking failed")
            .get(&addr)
            .cloned()
            .unwrap_or_default())
    }

    fn send_coins(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        to: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        self.take(from, amount).context(TxSnafu)?;
        let mut balances = self.balances.lock().expect("Locking failed");
        let balance = balances.entry(to).or_default();
        *balance = balance.checked_add(amount).expect("No overflow");
        Ok(())
    }

    fn burn_coins(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        from: AccAddress,
        amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        self.take(from, amount).context(TxSnafu)
    }

    fn is_blocked(&self, _addr: AccAddress) -> bool {
        false
    }
}

#[derive(Default)]
struct MemStaking {
    validators: Mutex<BTreeMap<ValAddress, ValidatorInfo>>,
    delegations: Mutex<BTreeMap<(AccAddress, ValAddress), DelegationInfo>>,
}

impl MemStaking {
    /// Bonded validator operated by `operator`, without delegations
    fn add_validator(&self, operator: AccAddress) {
        self.validators.lock().expect("Locking failed").insert(
            operator.to_val(),
            ValidatorInfo {
                operator: operator.to_val(),
                tokens: 0,
                delegator_shares: Dec::zero(),
                commission_rate: Dec::zero(),
                bonded: true,
            },
        );
    }

    /// One share per token
    fn delegate(&self, delegator: AccAddress, operator: AccAddress, amount: u128) {
        let validator = operator.to_val();
        let mut validators = self.validators.lock().expect("Locking failed");
        let val = validators.get_mut(&validator).expect("Validator exists");
        val.tokens += amount;
        val.delegator_shares += &Dec::from(amount);

        let mut delegations = self.delegations.lock().expect("Locking failed");
        let delegation = delegations
            .entry((delegator, validator))
            .or_insert(DelegationInfo {
                delegator,
                validator,
                shares: Dec::zero(),
            });
        delegation.shares += &Dec::from(amount);
    }
}

impl StakingKeeper for MemStaking {
    fn bond_denom(&self) -> String {
        DENOM.into()
    }

    fn validator(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        operator: ValAddress,
    ) -> DbResult<Option<ValidatorInfo>> {
        Ok(self
            .validators
            .lock()
            .expect("Locking failed")
            .get(&operator)
            .cloned())
    }

    fn validators(&self, _dbtx: &ModuleWriteTransactionCtx) -> DbResult<Vec<ValidatorInfo>> {
        Ok(self
            .validators
            .lock()
            .expect("Locking failed")
            .values()
            .cloned()
            .collect())
    }

    fn delegation(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
        validator: ValAddress,
    ) -> DbResult<Option<DelegationInfo>> {
        Ok(self
            .delegations
            .lock()
            .expect("Locking failed")
            .get(&(delegator, validator))
            .cloned())
    }

    fn delegator_delegations(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        delegator: AccAddress,
    ) -> DbResult<Vec<DelegationInfo>> {
        Ok(self
            .delegations
            .lock()
            .expect("Locking failed")
            .values()
            .filter(|d| d.delegator == delegator)
            .cloned()
            .collect())
    }

    fn delegations(&self, _dbtx: &ModuleWriteTransactionCtx) -> DbResult<Vec<DelegationInfo>> {
        Ok(self
            .delegations
            .lock()
            .expect("Locking failed")
            .values()
            .cloned()
            .collect())
    }

    fn total_bonded_tokens(&self, _dbtx: &ModuleWriteTransactionCtx) -> DbResult<u128> {
        Ok(self
            .validators
            .lock()
            .expect("Locking failed")
            .values()
            .filter(|v| v.bonded)
            .map(|v| v.tokens)
            .sum())
    }
}

def_table! {
    /// Notes of executed signals, in the signal module's namespace
    signal_notes: String => ()
}

/// Proposal of a module that records what it executed
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
struct Signal {
    note: String,
    refuse: bool,
}

impl ProposalKind for Signal {
    const ROUTE: ModuleKind = SIGNAL_ROUTE;
}

#[derive(Default)]
struct SignalHandler {
    executed: Mutex<Vec<String>>,
}

impl ProposalHandler for SignalHandler {
    fn validate_content(&self, content: &ProposalContent) -> WhateverResult<()> {
        content.validate_basic().map_err(Whatever::from_error)?;
        Signal::from_content(content).map_err(Whatever::from_error)?;
        Ok(())
    }

    fn execute_proposal(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        content: &ProposalContent,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever> {
        let signal = Signal::from_content(content)
            .map_err(Whatever::from_error)
            .context(TxSnafu)?;
        // written before refusing, so a refusal has to roll it back
        dbtx.rescope(SIGNAL_ROUTE)
            .open_table(&signal_notes::TABLE)?
            .insert(&signal.note, &())?;
        if signal.refuse {
            return Err(Whatever::without_source("Signal refused".into())).context(TxSnafu);
        }
        self.executed
            .lock()
            .expect("Locking failed")
            .push(signal.note);
        Ok(vec![])
    }
}

struct Env {
    module: Arc<GovModule>,
    bank: Arc<MemBank>,
    staking: Arc<MemStaking>,
    signals: Arc<SignalHandler>,
}

fn stake(amount: u128) -> Coins {
    Coins::single(DENOM, amount).expect("Valid denom")
}

fn acc(n: u8) -> AccAddress {
    AccAddress::from_bytes([n; 20])
}

/// Block `secs` seconds after the proposals get submitted
fn at(secs: u64) -> BlockContext {
    BlockContext::new(secs + 1, Timestamp::from_unix_secs(1_700_000_000 + secs))
}

fn signal(note: &str, refuse: bool) -> ProposalContent {
    Signal {
        note: note.into(),
        refuse,
    }
    .into_content("Signal", "Please signal")
}

fn test_params() -> GovParams {
    let mut params = GovParams::default();
    params.deposit.min_deposit = stake(100);
    params.deposit.max_deposit_period_secs = PERIOD_SECS;
    params.voting.voting_period_secs = PERIOD_SECS;
    params
}

async fn setup() -> BoxedErrorResult<Env> {
    let db = Arc::new(Database::new_in_memory().await?);
    let bank = Arc::new(MemBank::default());
    let staking = Arc::new(MemStaking::default());
    let signals = Arc::new(SignalHandler::default());
    let router = ProposalRouter::new().with_route(SIGNAL_ROUTE, signals.clone());
    let module = GovModuleInit::new(bank.clone(), staking.clone(), router)
        .init_module(ModuleInitArgs::new(KIND, db, CURRENT_VERSION))
        .await?;
    module
        .db
        .write_with_expect(|dbtx| GovModule::set_params_tx(dbtx, &test_params()))
        .await;

    // two validators, 100 and 50 tokens, each fully self-delegated
    staking.add_validator(acc(1));
    staking.add_validator(acc(2));
    staking.delegate(acc(1), acc(1), 100);
    staking.delegate(acc(2), acc(2), 50);
    for n in 1..=3 {
        bank.mint(acc(n), 1000);
    }

    Ok(Env {
        module,
        bank,
        staking,
        signals,
    })
}

impl Env {
    async fn tx<T>(
        &self,
        f: impl FnOnce(&ModuleWriteTransactionCtx) -> DbTxResult<T, GovError>,
    ) -> Result<T, GovError> {
        self.module.db.write_with_expect_falliable(f).await
    }

    async fn submit(&self, content: ProposalContent, deposit: u128) -> Result<ProposalId, GovError> {
        let (proposal_id, _) = self
            .tx(|dbtx| {
                self.module
                    .submit_proposal_tx(dbtx, &at(0), acc(1), content, &stake(deposit))
            })
            .await?;
        Ok(proposal_id)
    }

    /// Submit and fund a proposal so that it enters voting at `at(0)`
    async fn submit_voting(&self, content: ProposalContent) -> BoxedErrorResult<ProposalId> {
        Ok(self.submit(content, 100).await?)
    }

    async fn vote(
        &self,
        voter: AccAddress,
        proposal_id: ProposalId,
        option: VoteOption,
    ) -> Result<Vec<ModuleEvent>, GovError> {
        self.tx(|dbtx| {
            self.module.process_msg_tx(
                dbtx,
                &at(1),
                voter,
                GovMsg::Vote {
                    proposal_id,
                    option,
                },
            )
        })
        .await
    }

    async fn end_block(&self, secs: u64) -> Result<Vec<ModuleEvent>, GovError> {
        let mut events = self
            .tx(|dbtx| self.module.end_block_tx(dbtx, &at(secs)))
            .await?;
        events.extend(self.module.execute_passed_proposals().await);
        Ok(events)
    }

    /// Whether a signal handler's write with `note` got committed
    async fn signal_noted(&self, note: &str) -> bool {
        self.module
            .db
            .simulate_with_expect(|dbtx| {
                Ok(dbtx
                    .rescope(SIGNAL_ROUTE)
                    .open_table(&signal_notes::TABLE)?
                    .get(&note.to_string())?
                    .is_some())
            })
            .await
    }

    async fn status(&self, proposal_id: ProposalId) -> Option<ProposalStatus> {
        self.module.proposal(proposal_id).await.map(|p| p.status)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn deposits_start_voting_period() -> BoxedErrorResult<()> {
    let env = setup().await?;

    let proposal_id = env.submit(signal("a", false), 40).await?;
    assert_eq!(proposal_id, ProposalId::new(1));
    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::DepositPeriod));

    let (activated, events) = env
        .tx(|dbtx| {
            env.module
                .add_deposit_tx(dbtx, &at(10), proposal_id, acc(2), &stake(60))
        })
        .await?;
    assert!(activated);
    assert_eq!(
        EventVotingPeriodStart::find_all(&events),
        vec![EventVotingPeriodStart { proposal_id }]
    );

    let proposal = env.module.proposal(proposal_id).await.expect("Exists");
    assert_eq!(proposal.status, ProposalStatus::VotingPeriod);
    assert_eq!(proposal.total_deposit, stake(100));
    assert_eq!(proposal.voting_start_time, Some(at(10).time));
    assert_eq!(proposal.voting_end_time, Some(at(10 + PERIOD_SECS).time));
    assert_eq!(env.bank.balance(module_account()), 100);
    assert_eq!(env.module.deposits(proposal_id).await.len(), 2);

    // the deposit period is over, but the proposal is not in it anymore
    assert!(env.end_block(PERIOD_SECS).await?.is_empty());
    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::VotingPeriod));

    assert_eq!(env.module.proposal(ProposalId::new(2)).await, None);
    assert_eq!(env.submit(signal("b", false), 0).await?, ProposalId::new(2));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn overflowing_deposit_is_refused() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit(signal("a", false), 40).await?;
    env.bank.mint(acc(4), u128::MAX);

    let res = env
        .tx(|dbtx| {
            env.module
                .add_deposit_tx(dbtx, &at(10), proposal_id, acc(4), &stake(u128::MAX))
        })
        .await;
    assert_matches!(res, Err(GovError::DepositOverflow));

    let proposal = env.module.proposal(proposal_id).await.expect("Exists");
    assert_eq!(proposal.total_deposit, stake(40));
    assert_eq!(env.module.deposit(proposal_id, acc(4)).await, None);
    assert_eq!(env.bank.balance(acc(4)), u128::MAX);
    assert_eq!(env.bank.balance(module_account()), 40);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unfunded_proposal_is_dropped_and_deposit_burned() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit(signal("a", false), 40).await?;

    assert!(env.end_block(PERIOD_SECS - 1).await?.is_empty());

    let events = env.end_block(PERIOD_SECS).await?;
    assert_eq!(
        EventProposalDropped::find_all(&events),
        vec![EventProposalDropped { proposal_id }]
    );
    assert_eq!(env.module.proposal(proposal_id).await, None);
    assert!(env.module.deposits(proposal_id).await.is_empty());
    assert_eq!(env.bank.balance(module_account()), 0);
    assert_eq!(env.bank.balance(acc(1)), 960);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn passing_proposal_executes_and_refunds() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit_voting(signal("upgrade", false)).await?;

    // later votes replace earlier ones
    env.vote(acc(1), proposal_id, VoteOption::No).await?;
    env.vote(acc(1), proposal_id, VoteOption::Yes).await?;

    let events = env.end_block(PERIOD_SECS).await?;
    assert_eq!(
        EventProposalFinished::find_all(&events),
        vec![EventProposalFinished {
            proposal_id,
            status: ProposalStatus::Passed,
        }]
    );

    let proposal = env.module.proposal(proposal_id).await.expect("Exists");
    assert_eq!(proposal.status, ProposalStatus::Passed);
    assert_eq!(
        proposal.final_tally_result,
        TallyResult {
            yes: 100,
            ..Default::default()
        }
    );
    assert_eq!(
        *env.signals.executed.lock().expect("Locking failed"),
        vec!["upgrade".to_string()]
    );
    assert!(env.signal_noted("upgrade").await);
    assert_eq!(env.bank.balance(acc(1)), 1000);
    assert_eq!(env.bank.balance(module_account()), 0);
    assert!(env.module.votes(proposal_id).await.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn delegators_override_their_validator() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.staking.delegate(acc(3), acc(1), 50);
    let proposal_id = env.submit_voting(signal("a", false)).await?;

    env.vote(acc(1), proposal_id, VoteOption::Yes).await?;
    env.vote(acc(3), proposal_id, VoteOption::No).await?;

    assert_eq!(
        env.module.tally_result(proposal_id).await?,
        TallyResult {
            yes: 100,
            no: 50,
            ..Default::default()
        }
    );

    env.end_block(PERIOD_SECS).await?;
    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::Passed));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn validator_votes_for_silent_delegators() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.staking.delegate(acc(3), acc(2), 150);
    let proposal_id = env.submit_voting(signal("a", false)).await?;

    env.vote(acc(1), proposal_id, VoteOption::Yes).await?;
    env.vote(acc(2), proposal_id, VoteOption::No).await?;

    env.end_block(PERIOD_SECS).await?;
    let proposal = env.module.proposal(proposal_id).await.expect("Exists");
    assert_eq!(proposal.status, ProposalStatus::Rejected);
    assert_eq!(
        proposal.final_tally_result,
        TallyResult {
            yes: 100,
            no: 200,
            ..Default::default()
        }
    );
    // rejected without veto: deposits are refunded
    assert_eq!(env.bank.balance(acc(1)), 1000);
    assert!(env.signals.executed.lock().expect("Locking failed").is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn weighted_votes_split_power() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit_voting(signal("a", false)).await?;

    env.tx(|dbtx| {
        env.module.process_msg_tx(
            dbtx,
            &at(1),
            acc(1),
            GovMsg::VoteWeighted {
                proposal_id,
                options: vec![
                    WeightedVoteOption {
                        option: VoteOption::Yes,
                        weight: Dec::percent(70),
                    },
                    WeightedVoteOption {
                        option: VoteOption::Abstain,
                        weight: Dec::percent(30),
                    },
                ],
            },
        )
    })
    .await?;

    assert_eq!(
        env.module.tally_result(proposal_id).await?,
        TallyResult {
            yes: 70,
            abstain: 30,
            ..Default::default()
        }
    );

    let invalid = env
        .tx(|dbtx| {
            env.module.process_msg_tx(
                dbtx,
                &at(1),
                acc(2),
                GovMsg::VoteWeighted {
                    proposal_id,
                    options: vec![WeightedVoteOption {
                        option: VoteOption::Yes,
                        weight: Dec::percent(50),
                    }],
                },
            )
        })
        .await;
    assert_matches!(invalid, Err(GovError::InvalidVote { .. }));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn veto_burns_deposits() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit_voting(signal("a", false)).await?;

    env.vote(acc(1), proposal_id, VoteOption::NoWithVeto).await?;
    env.end_block(PERIOD_SECS).await?;

    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::Rejected));
    assert_eq!(env.bank.balance(acc(1)), 900);
    assert_eq!(env.bank.balance(module_account()), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_quorum_burns_deposits() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit_voting(signal("a", false)).await?;

    // 50 of 150 bonded tokens is below the 33.4% quorum
    env.vote(acc(2), proposal_id, VoteOption::Yes).await?;
    env.end_block(PERIOD_SECS).await?;

    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::Rejected));
    assert_eq!(env.bank.balance(acc(1)), 900);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_execution_is_recorded() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit_voting(signal("a", true)).await?;

    env.vote(acc(1), proposal_id, VoteOption::Yes).await?;
    let events = env.end_block(PERIOD_SECS).await?;

    assert_eq!(
        EventProposalFinished::find_all(&events),
        vec![EventProposalFinished {
            proposal_id,
            status: ProposalStatus::Failed,
        }]
    );
    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::Failed));
    assert!(env.signals.executed.lock().expect("Locking failed").is_empty());
    // the handler's write is rolled back with its error
    assert!(!env.signal_noted("a").await);
    // passed, so deposits are refunded
    assert_eq!(env.bank.balance(acc(1)), 1000);

    // nothing is left queued for execution
    assert!(env.end_block(PERIOD_SECS + 1).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_execution_leaves_other_proposals_alone() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let refused = env.submit_voting(signal("a", true)).await?;
    let accepted = env.submit_voting(signal("b", false)).await?;
    env.vote(acc(1), refused, VoteOption::Yes).await?;
    env.vote(acc(1), accepted, VoteOption::Yes).await?;

    env.end_block(PERIOD_SECS).await?;

    assert_eq!(env.status(refused).await, Some(ProposalStatus::Failed));
    assert_eq!(env.status(accepted).await, Some(ProposalStatus::Passed));
    assert!(!env.signal_noted("a").await);
    assert!(env.signal_noted("b").await);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn text_proposals_need_no_handler() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env
        .submit_voting(GovProposal::Text.into_content("Signal", "Text only"))
        .await?;

    env.vote(acc(1), proposal_id, VoteOption::Yes).await?;
    env.end_block(PERIOD_SECS).await?;

    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::Passed));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn params_change_through_proposal() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let mut params = test_params();
    params.voting.voting_period_secs = 2 * PERIOD_SECS;
    params.tally.quorum = Dec::percent(50);

    let proposal_id = env
        .submit_voting(
            GovProposal::from(UpdateGovParamsProposal {
                params: params.clone(),
            })
            .into_content("Params", "Longer voting"),
        )
        .await?;
    env.vote(acc(1), proposal_id, VoteOption::Yes).await?;
    let events = env.end_block(PERIOD_SECS).await?;

    assert_eq!(env.status(proposal_id).await, Some(ProposalStatus::Passed));
    assert_eq!(
        EventUpdateParams::find_all(&events),
        vec![EventUpdateParams {
            params: params.clone()
        }]
    );
    assert_eq!(env.module.params().await, params);

    // later proposals vote for the new period
    let next = env.submit_voting(signal("b", false)).await?;
    let proposal = env.module.proposal(next).await.expect("Exists");
    assert_eq!(proposal.voting_end_time, Some(at(2 * PERIOD_SECS).time));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_params_are_rejected_at_submission() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let mut params = test_params();
    params.voting.voting_period_secs = 0;

    let content = GovProposal::from(UpdateGovParamsProposal { params })
        .into_content("Params", "No voting");
    assert_matches!(
        env.submit(content, 100).await,
        Err(GovError::InvalidParams { .. })
    );
    assert_eq!(env.module.proposals(&Default::default()).await, vec![]);
    assert_eq!(env.module.params().await, test_params());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn submission_checks_content() -> BoxedErrorResult<()> {
    let env = setup().await?;

    let mut unrouted = signal("a", false);
    unrouted.route = ModuleKind::new(201);
    assert_matches!(
        env.submit(unrouted, 100).await,
        Err(GovError::NoProposalHandlerExists { .. })
    );

    let mut untitled = signal("a", false);
    untitled.title = String::new();
    assert_matches!(
        env.submit(untitled, 100).await,
        Err(GovError::InvalidProposalContent { .. })
    );

    let mut blank_text = GovProposal::Text.into_content("Signal", "Text only");
    blank_text.description = " ".into();
    assert_matches!(
        env.submit(blank_text, 100).await,
        Err(GovError::InvalidProposal { .. })
    );

    assert_matches!(
        env.submit(signal("a", false), 2000).await,
        Err(GovError::InsufficientFunds { .. })
    );
    assert_eq!(env.module.proposals(&Default::default()).await, vec![]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn voting_only_during_voting_period() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let proposal_id = env.submit(signal("a", false), 10).await?;

    assert_matches!(
        env.vote(acc(1), proposal_id, VoteOption::Yes).await,
        Err(GovError::InactiveProposal { .. })
    );
    assert_matches!(
        env.vote(acc(1), ProposalId::new(7), VoteOption::Yes).await,
        Err(GovError::UnknownProposal { .. })
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn proposals_filtered_by_voter_and_status() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let voted = env.submit_voting(signal("a", false)).await?;
    let pending = env.submit(signal("b", false), 10).await?;
    env.vote(acc(2), voted, VoteOption::Abstain).await?;

    let by_voter = env
        .module
        .proposals(&crate::ProposalFilter {
            voter: Some(acc(2)),
            ..Default::default()
        })
        .await;
    assert_eq!(by_voter.iter().map(|p| p.id).collect::<Vec<_>>(), vec![voted]);

    let in_deposit = env
        .module
        .proposals(&crate::ProposalFilter {
            status: Some(ProposalStatus::DepositPeriod),
            ..Default::default()
        })
        .await;
    assert_eq!(in_deposit.iter().map(|p| p.id).collect::<Vec<_>>(), vec![pending]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn genesis_export_imports_back() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let voting = env.submit_voting(signal("a", false)).await?;
    env.submit(signal("b", false), 10).await?;
    env.vote(acc(1), voting, VoteOption::Yes).await?;

    let exported = env
        .module
        .db
        .write_with_expect(|dbtx| env.module.export_genesis(dbtx))
        .await;
    let genesis: GovGenesis = serde_json::from_value(exported.clone())?;
    assert_eq!(genesis.starting_proposal_id, ProposalId::new(3));
    assert_eq!(genesis.proposals.len(), 2);
    assert_eq!(genesis.votes.len(), 1);

    let other = setup().await?;
    other.bank.mint(module_account(), 110);
    other
        .module
        .db
        .write_with_expect_falliable(|dbtx| other.module.init_genesis(dbtx, &exported))
        .await?;
    let reexported = other
        .module
        .db
        .write_with_expect(|dbtx| other.module.export_genesis(dbtx))
        .await;
    assert_eq!(reexported, exported);

    // queues are rebuilt: the voting proposal still gets tallied
    other.end_block(PERIOD_SECS).await?;
    assert_eq!(other.status(voting).await, Some(ProposalStatus::Passed));

    let mismatched = setup().await?;
    let res = mismatched
        .module
        .db
        .write_with_expect_falliable(|dbtx| mismatched.module.init_genesis_tx(dbtx, &genesis))
        .await;
    assert_matches!(res, Err(GovError::InvalidGenesis { .. }));
    Ok(())
}
