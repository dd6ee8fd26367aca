use lbm_app::App;
use lbm_core::address::ValAddress;
use lbm_core::dec_coin::DecCoins;
use lbm_module_consortium::genesis::ConsortiumGenesis;
use lbm_module_gov::ProposalFilter;
use lbm_util_error::{Whatever, WhateverResult};
use serde::Serialize;
use snafu::{FromString as _, OptionExt as _, ResultExt as _};

use crate::opts::QueryCommands;
use crate::print_json;

#[derive(Serialize)]
struct ValidatorRewards {
    validator: ValAddress,
    rewards: DecCoins,
}

#[derive(Serialize)]
struct TotalRewards {
    rewards: Vec<ValidatorRewards>,
    total: DecCoins,
}

pub(crate) async fn run(app: &App, query: QueryCommands) -> WhateverResult<()> {
    match query {
        QueryCommands::LastBlock => print_json(&app.last_block().await),
        QueryCommands::Balance { address } => print_json(&app.bank().balance(address).await),
        QueryCommands::Supply => print_json(&app.bank().supply().await),
        QueryCommands::Validator { operator } => {
            print_json(&app.staking().get_validator(operator).await)
        }
        QueryCommands::Delegation {
            delegator,
            validator,
        } => print_json(&app.staking().get_delegation(delegator, validator).await),
        QueryCommands::CommunityPool => print_json(&app.distribution().community_pool().await),
        QueryCommands::Rewards {
            delegator,
            validator,
        } => {
            let block = app
                .last_block()
                .await
                .whatever_context("Chain not initialized")?;
            match validator {
                Some(validator) => print_json(
                    &app.distribution()
                        .delegation_rewards(&block, delegator, validator)
                        .await
                        .whatever_context("Failed to query rewards")?,
                ),
                None => {
                    let (rewards, total) = app
                        .distribution()
                        .delegation_total_rewards(&block, delegator)
                        .await
                        .whatever_context("Failed to query rewards")?;
                    print_json(&TotalRewards {
                        rewards: rewards
                            .into_iter()
                            .map(|(validator, rewards)| ValidatorRewards { validator, rewards })
                            .collect(),
                        total,
                    })
                }
            }
        }
        QueryCommands::Commission { validator } => {
            print_json(&app.distribution().validator_commission(validator).await)
        }
        QueryCommands::Proposal { proposal_id } => {
            print_json(&app.gov().proposal(proposal_id).await)
        }
        QueryCommands::Proposals { voter, depositor } => print_json(
            &app.gov()
                .proposals(&ProposalFilter {
                    status: None,
                    voter,
                    depositor,
                })
                .await,
        ),
        QueryCommands::Tally { proposal_id } => print_json(
            &app.gov()
                .tally_result(proposal_id)
                .await
                .whatever_context("Failed to tally")?,
        ),
        QueryCommands::Consortium => print_json(&ConsortiumGenesis {
            params: app.consortium().params().await,
            validator_auths: app.consortium().validator_auths().await,
        }),
        QueryCommands::Code { code_id } => print_json(&app.wasm().code_info(code_id).await),
        QueryCommands::Contract { address } => {
            print_json(&app.wasm().contract_info(address).await)
        }
        QueryCommands::InactiveContracts => print_json(&app.wasm().inactive_contracts().await),
        QueryCommands::Invariants => {
            let violations = app.distribution().invariants().await;
            for violation in &violations {
                println!("{violation}");
            }
            if violations.is_empty() {
                println!("All invariants hold");
                Ok(())
            } else {
                Err(Whatever::without_source(format!(
                    "{} invariants broken",
                    violations.len()
                )))
            }
        }
    }
}
