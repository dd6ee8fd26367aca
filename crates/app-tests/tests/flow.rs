use assert_matches::assert_matches;
use lbm_app::bank::BalanceRecord;
use lbm_app::error::DeliverTxError;
use lbm_app::genesis::AppGenesis;
use lbm_app::msg::{AppMsg, AppProposal, AppTx};
use lbm_app::staking::StakingMsg;
use lbm_app_tests::{DENOM, TestChain, acc, stake, val};
use lbm_core::address::AccAddress;
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_core::timestamp::Timestamp;
use lbm_module_consortium::module::ValidatorAuth;
use lbm_module_consortium::params::ConsortiumParams;
use lbm_module_consortium::proposal::{ConsortiumProposal, UpdateConsortiumParamsProposal};
use lbm_module_distribution::msg::DistributionMsg;
use lbm_module_distribution::params::DistributionParams;
use lbm_module_distribution::proposal::{
    CommunityPoolSpendProposal, UpdateDistributionParamsProposal,
};
use lbm_module_gov::msg::GovMsg;
use lbm_module_gov::proposal::UpdateGovParamsProposal;
use lbm_module_gov::types::{ProposalId, ProposalStatus, VoteOption};
use lbm_module_wasm::WASM_MAGIC;
use lbm_module_wasm::msg::WasmMsg;
use lbm_module_wasm::proposal::{DeactivateContractProposal, WasmProposal};
use lbm_module_wasm::types::CodeId;
use lbm_util_error::BoxedErrorResult;
use snafu::OptionExt as _;

const GENESIS_SECS: u64 = 1_700_000_000;
const VOTING_PERIOD_SECS: u64 = 20;

fn genesis(balances: &[(AccAddress, u128)]) -> AppGenesis {
    let mut genesis = AppGenesis::new(Timestamp::from_unix_secs(GENESIS_SECS));
    genesis.bank.balances = balances
        .iter()
        .map(|(address, amount)| BalanceRecord {
            address: *address,
            coins: stake(*amount),
        })
        .collect();
    genesis.gov.params.deposit.min_deposit = stake(100);
    genesis.gov.params.deposit.max_deposit_period_secs = 100;
    genesis.gov.params.voting.voting_period_secs = VOTING_PERIOD_SECS;
    genesis
}

fn create_validator(operator: AccAddress, amount: u128) -> AppTx {
    AppTx::new(
        operator,
        [StakingMsg::CreateValidator {
            commission_rate: Dec::percent(10),
            amount,
        }
        .into()],
    )
}

fn submit(proposer: AccAddress, proposal: AppProposal) -> AppTx {
    AppTx::new(
        proposer,
        [AppMsg::SubmitProposal {
            title: "Proposal".into(),
            description: "Do something".into(),
            proposal,
            initial_deposit: stake(100),
        }],
    )
}

fn vote_yes(voter: AccAddress, proposal_id: u64) -> AppTx {
    AppTx::new(
        voter,
        [GovMsg::Vote {
            proposal_id: ProposalId::new(proposal_id),
            option: VoteOption::Yes,
        }
        .into()],
    )
}

/// Apply blocks until the voting period of `proposal_id` is over
async fn finish_voting(chain: &TestChain, proposal_id: u64) -> BoxedErrorResult<()> {
    let proposal = chain
        .app
        .gov()
        .proposal(ProposalId::new(proposal_id))
        .await
        .whatever_context::<_, lbm_util_error::Whatever>("Proposal exists")?;
    assert_eq!(proposal.status, ProposalStatus::VotingPeriod);
    let end = proposal
        .voting_end_time
        .whatever_context::<_, lbm_util_error::Whatever>("Voting period started")?;
    chain.advance_to(end).await?;
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn fees_are_distributed_to_signers_and_community_pool() -> BoxedErrorResult<()> {
    let mut chain = TestChain::start(&genesis(&[(acc(1), 10_000)])).await?;

    chain
        .apply_ok(vec![create_validator(acc(1), 1000).with_fee(stake(100))])
        .await?;
    assert_eq!(chain.app.bank().balance(acc(1)).await, stake(8900));

    chain.signers = vec![(val(1), 1000)];
    // No previous proposer, the proposer reward goes to the community pool
    chain.apply_ok(vec![]).await?;
    assert_eq!(
        chain.app.distribution().community_pool().await.amount_of(DENOM),
        Dec::from(7u64)
    );
    assert_eq!(
        chain
            .app
            .distribution()
            .validator_commission(val(1))
            .await
            .amount_of(DENOM),
        "9.3".parse::<Dec>()?
    );

    chain
        .apply_ok(vec![AppTx::new(
            acc(1),
            [
                DistributionMsg::WithdrawDelegatorReward { validator: val(1) }.into(),
                DistributionMsg::WithdrawValidatorCommission { validator: val(1) }.into(),
            ],
        )])
        .await?;
    assert_eq!(chain.app.bank().balance(acc(1)).await, stake(8992));
    assert!(chain.app.distribution().invariants().await.is_empty());
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn community_pool_spend_passes_through_governance() -> BoxedErrorResult<()> {
    let mut chain = TestChain::start(&genesis(&[(acc(1), 10_000), (acc(2), 10_000)])).await?;

    chain
        .apply_ok(vec![
            create_validator(acc(1), 1000),
            AppTx::new(
                acc(2),
                [DistributionMsg::FundCommunityPool { amount: stake(500) }.into()],
            ),
        ])
        .await?;
    chain.signers = vec![(val(1), 1000)];

    chain
        .apply_ok(vec![
            submit(
                acc(2),
                AppProposal::CommunityPoolSpend(CommunityPoolSpendProposal {
                    recipient: acc(5),
                    amount: stake(300),
                }),
            ),
            vote_yes(acc(1), 1),
        ])
        .await?;
    assert_eq!(chain.app.bank().balance(acc(2)).await, stake(9400));

    finish_voting(&chain, 1).await?;

    let proposal = chain
        .app
        .gov()
        .proposal(ProposalId::new(1))
        .await
        .whatever_context::<_, lbm_util_error::Whatever>("Proposal kept")?;
    assert_eq!(proposal.status, ProposalStatus::Passed);
    assert_eq!(proposal.final_tally_result.yes, 1000);
    assert_eq!(chain.app.bank().balance(acc(5)).await, stake(300));
    // deposit refunded
    assert_eq!(chain.app.bank().balance(acc(2)).await, stake(9500));
    assert_eq!(
        chain.app.distribution().community_pool().await.amount_of(DENOM),
        Dec::from(200u64)
    );
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn params_change_through_governance() -> BoxedErrorResult<()> {
    let mut chain = TestChain::start(&genesis(&[(acc(1), 10_000), (acc(2), 10_000)])).await?;
    chain.apply_ok(vec![create_validator(acc(1), 1000)]).await?;
    chain.signers = vec![(val(1), 1000)];

    let mut gov_params = chain.app.gov().params().await;
    gov_params.voting.voting_period_secs = 2 * VOTING_PERIOD_SECS;
    let distribution_params = DistributionParams {
        community_tax: Dec::percent(10),
        ..Default::default()
    };
    chain
        .apply_ok(vec![
            submit(
                acc(2),
                AppProposal::GovParams(UpdateGovParamsProposal {
                    params: gov_params.clone(),
                }),
            ),
            submit(
                acc(2),
                AppProposal::DistributionParams(UpdateDistributionParamsProposal {
                    params: distribution_params.clone(),
                }),
            ),
            // more than the community pool holds
            submit(
                acc(2),
                AppProposal::CommunityPoolSpend(CommunityPoolSpendProposal {
                    recipient: acc(5),
                    amount: stake(1_000_000),
                }),
            ),
            vote_yes(acc(1), 1),
            vote_yes(acc(1), 2),
            vote_yes(acc(1), 3),
        ])
        .await?;
    let pool_before = chain.app.distribution().community_pool().await;

    finish_voting(&chain, 1).await?;

    let gov = chain.app.gov();
    for (id, status) in [
        (1, ProposalStatus::Passed),
        (2, ProposalStatus::Passed),
        (3, ProposalStatus::Failed),
    ] {
        let proposal = gov.proposal(ProposalId::new(id)).await;
        assert_eq!(proposal.map(|p| p.status), Some(status));
    }
    assert_eq!(chain.app.gov().params().await, gov_params);
    assert_eq!(chain.app.distribution().params().await, distribution_params);
    assert_eq!(chain.app.bank().balance(acc(5)).await, Coins::empty());
    assert!(
        chain.app.distribution().community_pool().await.amount_of(DENOM)
            >= pool_before.amount_of(DENOM)
    );
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn consortium_can_only_be_disabled() -> BoxedErrorResult<()> {
    let mut genesis = genesis(&[(acc(1), 10_000), (acc(2), 10_000)]);
    genesis.consortium.params.enabled = true;
    genesis.consortium.validator_auths = vec![ValidatorAuth {
        operator_address: val(1),
        creation_allowed: true,
    }];
    let mut chain = TestChain::start(&genesis).await?;

    let outcome = chain
        .apply(vec![
            create_validator(acc(1), 1000),
            create_validator(acc(2), 1000),
        ])
        .await?;
    assert!(outcome.txs[0].is_ok());
    assert_matches!(
        outcome.txs[1],
        Err(DeliverTxError::Msg { index: 0, module, .. }) if module == lbm_app::staking::KIND
    );
    chain.signers = vec![(val(1), 1000)];

    let params_proposal = |enabled| {
        AppProposal::Consortium(ConsortiumProposal::UpdateConsortiumParams(
            UpdateConsortiumParamsProposal {
                params: ConsortiumParams { enabled },
            },
        ))
    };
    let outcome = chain
        .apply(vec![submit(acc(2), params_proposal(true))])
        .await?;
    assert_matches!(
        outcome.txs[0],
        Err(DeliverTxError::Msg { module, .. }) if module == lbm_module_gov::KIND
    );

    chain
        .apply_ok(vec![
            submit(acc(2), params_proposal(false)),
            vote_yes(acc(1), 1),
        ])
        .await?;
    finish_voting(&chain, 1).await?;

    assert!(!chain.app.consortium().params().await.enabled);
    assert!(chain.app.consortium().validator_auths().await.is_empty());
    chain
        .apply_ok(vec![create_validator(acc(2), 1000)])
        .await?;
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn governance_deactivates_contracts() -> BoxedErrorResult<()> {
    let mut chain = TestChain::start(&genesis(&[(acc(1), 10_000), (acc(3), 10_000)])).await?;

    let code = [WASM_MAGIC, b"counter"].concat();
    chain
        .apply_ok(vec![
            create_validator(acc(1), 1000),
            AppTx::new(
                acc(3),
                [
                    WasmMsg::StoreCode { code }.into(),
                    WasmMsg::InstantiateContract {
                        code_id: CodeId::new(1),
                        admin: Some(acc(3)),
                        label: "counter".into(),
                        msg: b"{}".to_vec(),
                        funds: Coins::empty(),
                    }
                    .into(),
                ],
            ),
        ])
        .await?;
    chain.signers = vec![(val(1), 1000)];
    let contract = *chain
        .app
        .wasm()
        .contracts_by_code(CodeId::new(1))
        .await
        .first()
        .whatever_context::<_, lbm_util_error::Whatever>("Contract instantiated")?;

    let execute = || {
        AppTx::new(
            acc(3),
            [WasmMsg::ExecuteContract {
                contract,
                msg: b"{\"increment\":{}}".to_vec(),
                funds: Coins::empty(),
            }
            .into()],
        )
    };
    chain.apply_ok(vec![execute()]).await?;

    chain
        .apply_ok(vec![
            submit(
                acc(1),
                AppProposal::Wasm(WasmProposal::DeactivateContract(
                    DeactivateContractProposal { contract },
                )),
            ),
            vote_yes(acc(1), 1),
        ])
        .await?;
    finish_voting(&chain, 1).await?;

    assert!(chain.app.wasm().is_inactive(contract).await);
    let outcome = chain.apply(vec![execute()]).await?;
    assert_matches!(
        outcome.txs[0],
        Err(DeliverTxError::Msg { module, .. }) if module == lbm_module_wasm::KIND
    );
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn exported_state_starts_an_identical_chain() -> BoxedErrorResult<()> {
    let mut chain = TestChain::start(&genesis(&[(acc(1), 10_000), (acc(2), 10_000)])).await?;
    chain
        .apply_ok(vec![
            create_validator(acc(1), 1000).with_fee(stake(50)),
            AppTx::new(
                acc(2),
                [StakingMsg::Delegate {
                    validator: val(1),
                    amount: 300,
                }
                .into()],
            ),
        ])
        .await?;
    chain.signers = vec![(val(1), 1300)];
    chain
        .apply_ok(vec![
            AppTx::new(acc(2), [DistributionMsg::FundCommunityPool { amount: stake(10) }.into()])
                .with_fee(stake(20)),
            submit(
                acc(2),
                AppProposal::CommunityPoolSpend(CommunityPoolSpendProposal {
                    recipient: acc(2),
                    amount: stake(5),
                }),
            ),
        ])
        .await?;
    chain.apply_ok(vec![]).await?;

    let exported = chain.app.export_genesis().await?;
    assert!(exported.staking.exported);
    assert_eq!(exported.initial_height, lbm_core::block::BlockHeight::new(4));

    let json = serde_json::to_string_pretty(&exported)?;
    let imported: AppGenesis = serde_json::from_str(&json)?;
    assert_eq!(imported, exported);

    let mut restarted = TestChain::start(&imported).await?;
    assert_eq!(restarted.app.export_genesis().await?, exported);
    assert_eq!(restarted.last_block().await?, chain.last_block().await?);

    // both chains keep going the same way
    restarted.signers = chain.signers.clone();
    let tx = || {
        AppTx::new(
            acc(2),
            [DistributionMsg::WithdrawDelegatorReward { validator: val(1) }.into()],
        )
    };
    chain.apply_ok(vec![tx()]).await?;
    restarted.apply_ok(vec![tx()]).await?;
    assert_eq!(
        restarted.app.bank().balance(acc(2)).await,
        chain.app.bank().balance(acc(2)).await
    );
    assert_eq!(
        restarted.app.export_genesis().await?,
        chain.app.export_genesis().await?
    );
    Ok(())
}
