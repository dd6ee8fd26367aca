use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::{BlockContext, BlockHeight, BlockInfo, VoteInfo};
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_core::dec_coin::{DecCoin, DecCoins};
use lbm_core::timestamp::Timestamp;
use lbm_db::Database;
use lbm_db::error::TxSnafu;
use lbm_module::event::EventKindExt as _;
use lbm_module::keepers::{
    BankKeeper, DelegationInfo, FEE_COLLECTOR_ACCOUNT, InsufficientFundsError, StakingHooks as _,
    StakingKeeper, ValidatorInfo,
};
use lbm_module::module::db::{DbResult, DbTxResult, ModuleWriteTransactionCtx};
use lbm_module::module::{IModule as _, ModuleInitArgs};
use lbm_module::proposal::{ProposalHandler as _, ProposalKind as _};
use lbm_util_error::{BoxedErrorResult, Whatever};
use snafu::ResultExt as _;

use crate::error::DistributionError;
use crate::events::{
    EventCommunityPoolSpend, EventProposerReward, EventUpdateParams, EventWithdrawRewards,
};
use crate::genesis::{DistributionGenesis, OutstandingRewardsRecord};
use crate::msg::DistributionMsg;
use crate::params::DistributionParams;
use crate::proposal::{
    CommunityPoolSpendProposal, DistributionProposal, UpdateDistributionParamsProposal,
};
use crate::{CURRENT_VERSION, DistributionModule, DistributionModuleInit, KIND, module_account};

const DENOM: &str = "stake";

#[derive(Default)]
struct MemBank {
    balances: Mutex<BTreeMap<AccAddress, Coins>>,
    blocked: BTreeSet<AccAddress>,
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
        let mut balances = self.balances.lock().expect("Locking failed");
        let available = balances.get(&from).cloned().unwrap_or_default();
        let Some(rest) = available.checked_sub(amount) else {
            return Err(InsufficientFundsError {
                available,
                required: amount.clone(),
            })
            .context(TxSnafu);
        };
        balances.insert(from, rest);
        let balance = balances.entry(to).or_default();
        *balance = balance.checked_add(amount).expect("No overflow");
        Ok(())
    }

    fn burn_coins(
        &self,
        _dbtx: &ModuleWriteTransactionCtx,
        _from: AccAddress,
        _amount: &Coins,
    ) -> DbTxResult<(), InsufficientFundsError> {
        unimplemented!()
    }

    fn is_blocked(&self, addr: AccAddress) -> bool {
        self.blocked.contains(&addr)
    }
}

#[derive(Default)]
struct MemStaking {
    validators: Mutex<BTreeMap<ValAddress, ValidatorInfo>>,
    delegations: Mutex<BTreeMap<(AccAddress, ValAddress), DelegationInfo>>,
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
            .map(|v| v.tokens)
            .sum())
    }
}

struct Env {
    module: Arc<DistributionModule>,
    bank: Arc<MemBank>,
    staking: Arc<MemStaking>,
}

fn stake(amount: u128) -> Coins {
    Coins::single(DENOM, amount).expect("Valid denom")
}

fn dec_stake(amount: &str) -> DecCoins {
    DecCoins::from(vec![DecCoin::new(
        DENOM,
        amount.parse().expect("Valid decimal"),
    )])
}

fn val(n: u8) -> ValAddress {
    ValAddress::from_bytes([n; 20])
}

fn acc(n: u8) -> AccAddress {
    AccAddress::from_bytes([n; 20])
}

fn block(height: u64) -> BlockContext {
    BlockContext::new(height, Timestamp::from_unix_secs(1_700_000_000 + height * 5))
}

async fn setup() -> BoxedErrorResult<Env> {
    let db = Arc::new(Database::new_in_memory().await?);
    let bank = Arc::new(MemBank {
        blocked: BTreeSet::from([module_account()]),
        ..Default::default()
    });
    let staking = Arc::new(MemStaking::default());
    let module = DistributionModuleInit::new(bank.clone(), staking.clone())
        .init_module(ModuleInitArgs::new(KIND, db, CURRENT_VERSION))
        .await?;
    Ok(Env {
        module,
        bank,
        staking,
    })
}

impl Env {
    async fn tx<T>(
        &self,
        f: impl FnOnce(&ModuleWriteTransactionCtx) -> DbTxResult<T, DistributionError>,
    ) -> Result<T, DistributionError> {
        self.module.db.write_with_expect_falliable(f).await
    }

    async fn create_validator(&self, operator: ValAddress, commission_rate: Dec) -> BoxedErrorResult<()> {
        self.staking.validators.lock().expect("Locking failed").insert(
            operator,
            ValidatorInfo {
                operator,
                tokens: 0,
                delegator_shares: Dec::zero(),
                commission_rate,
                bonded: true,
            },
        );
        self.module
            .db
            .write_with_expect_falliable(|dbtx| {
                self.module
                    .after_validator_created(dbtx, &block(1), operator)
            })
            .await?;
        Ok(())
    }

    /// Delegate the way staking does it: hooks around the share change
    async fn delegate(
        &self,
        height: u64,
        delegator: AccAddress,
        validator: ValAddress,
        amount: u128,
    ) -> BoxedErrorResult<()> {
        let block = block(height);
        self.module
            .db
            .write_with_expect_falliable(|dbtx| -> DbTxResult<(), Whatever> {
                if self.staking.delegation(dbtx, delegator, validator)?.is_some() {
                    self.module
                        .before_delegation_shares_modified(dbtx, &block, delegator, validator)?;
                } else {
                    self.module
                        .before_delegation_created(dbtx, &block, delegator, validator)?;
                }

                {
                    let mut validators = self.staking.validators.lock().expect("Locking failed");
                    let val = validators.get_mut(&validator).expect("Validator exists");
                    let shares = val.shares_from_tokens(amount);
                    val.tokens += amount;
                    val.delegator_shares += &shares;

                    let mut delegations = self.staking.delegations.lock().expect("Locking failed");
                    let delegation =
                        delegations
                            .entry((delegator, validator))
                            .or_insert(DelegationInfo {
                                delegator,
                                validator,
                                shares: Dec::zero(),
                            });
                    delegation.shares += &shares;
                }

                self.module
                    .after_delegation_modified(dbtx, &block, delegator, validator)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn slash(&self, height: u64, validator: ValAddress, fraction: Dec) -> BoxedErrorResult<()> {
        self.module
            .db
            .write_with_expect_falliable(|dbtx| {
                self.module
                    .before_validator_slashed(dbtx, &block(height), validator, &fraction)
            })
            .await?;
        let mut validators = self.staking.validators.lock().expect("Locking failed");
        let val = validators.get_mut(&validator).expect("Validator exists");
        let slashed = Dec::from(val.tokens)
            .mul(&fraction)
            .truncate_u128()
            .expect("Not negative");
        val.tokens -= slashed;
        Ok(())
    }

    /// Credit `amount` of rewards to `validator`, backed by minted coins
    async fn reward(&self, validator: ValAddress, amount: u128) -> BoxedErrorResult<()> {
        self.bank.mint(module_account(), amount);
        let val = self
            .staking
            .validators
            .lock()
            .expect("Locking failed")
            .get(&validator)
            .cloned()
            .expect("Validator exists");
        self.tx(|dbtx| {
            self.module
                .allocate_to_validator_tx(dbtx, &val, &DecCoins::from(&stake(amount)))
        })
        .await?;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn fees_split_between_proposer_voters_and_community() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::percent(10)).await?;
    env.create_validator(val(2), Dec::zero()).await?;
    env.delegate(1, acc(1), val(1), 50).await?;
    env.delegate(1, acc(2), val(2), 50).await?;

    let fee_collector = AccAddress::module(FEE_COLLECTOR_ACCOUNT);
    env.bank.mint(fee_collector, 100);

    let votes = vec![
        VoteInfo {
            validator: val(1),
            power: 50,
            signed_last_block: true,
        },
        VoteInfo {
            validator: val(2),
            power: 50,
            signed_last_block: true,
        },
    ];
    let events = env
        .tx(|dbtx| env.module.allocate_tokens_tx(dbtx, 100, 100, Some(val(1)), &votes))
        .await?;

    // proposer: 1% base + 4% bonus of 100
    assert_eq!(
        EventProposerReward::find_all(&events),
        vec![EventProposerReward {
            validator: val(1),
            amount: dec_stake("5"),
        }]
    );
    assert_eq!(env.bank.balance(fee_collector), 0);
    assert_eq!(env.bank.balance(module_account()), 100);

    // voters share 93% by power
    assert_eq!(env.module.outstanding_rewards(val(1)).await, dec_stake("51.5"));
    assert_eq!(env.module.outstanding_rewards(val(2)).await, dec_stake("46.5"));
    assert_eq!(env.module.validator_commission(val(1)).await, dec_stake("5.15"));
    assert!(env.module.validator_commission(val(2)).await.is_zero());
    assert_eq!(env.module.community_pool().await, dec_stake("2"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn proposer_bonus_rounds_signed_fraction() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::zero()).await?;
    env.delegate(1, acc(1), val(1), 10).await?;
    env.module
        .db
        .write_with_expect(|dbtx| {
            DistributionModule::set_params_tx(dbtx, &DistributionParams {
                community_tax: Dec::zero(),
                base_proposer_reward: Dec::zero(),
                bonus_proposer_reward: Dec::one(),
                withdraw_addr_enabled: true,
            })
        })
        .await;
    env.bank.mint(AccAddress::module(FEE_COLLECTOR_ACCOUNT), 3);

    // 2/3 of the power signed, 0.666666666666666667 after rounding
    let events = env
        .tx(|dbtx| env.module.allocate_tokens_tx(dbtx, 2, 3, Some(val(1)), &[]))
        .await?;
    assert_eq!(
        EventProposerReward::find_all(&events),
        vec![EventProposerReward {
            validator: val(1),
            amount: dec_stake("2.000000000000000001"),
        }]
    );
    assert_eq!(
        env.module.community_pool().await,
        dec_stake("0.999999999999999999")
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn no_voting_power_funds_community_pool() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.bank.mint(AccAddress::module(FEE_COLLECTOR_ACCOUNT), 30);

    let events = env
        .tx(|dbtx| env.module.allocate_tokens_tx(dbtx, 0, 0, Some(val(1)), &[]))
        .await?;

    assert!(events.is_empty());
    assert_eq!(env.module.community_pool().await, dec_stake("30"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn first_block_only_records_proposer() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::zero()).await?;
    env.delegate(1, acc(1), val(1), 10).await?;
    env.bank.mint(AccAddress::module(FEE_COLLECTOR_ACCOUNT), 10);

    let info = BlockInfo {
        proposer: Some(val(1)),
        votes: vec![],
    };
    let events = env
        .module
        .db
        .write_with_expect_falliable(|dbtx| env.module.begin_block(dbtx, &block(1), &info))
        .await?;
    assert!(events.is_empty());
    assert_eq!(env.bank.balance(AccAddress::module(FEE_COLLECTOR_ACCOUNT)), 10);

    let proposer = env
        .module
        .db
        .read_with_expect(|dbtx| DistributionModule::get_previous_proposer_tx(dbtx))
        .await;
    assert_eq!(proposer, Some(val(1)));

    // next block pays out the fees of the previous one
    let info = BlockInfo {
        proposer: Some(val(1)),
        votes: vec![VoteInfo {
            validator: val(1),
            power: 10,
            signed_last_block: true,
        }],
    };
    env.module
        .db
        .write_with_expect_falliable(|dbtx| env.module.begin_block(dbtx, &block(2), &info))
        .await?;
    assert_eq!(env.bank.balance(AccAddress::module(FEE_COLLECTOR_ACCOUNT)), 0);
    assert_eq!(env.module.outstanding_rewards(val(1)).await, dec_stake("9.8"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn delegator_withdraws_its_share() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::zero()).await?;
    env.delegate(1, acc(1), val(1), 75).await?;
    env.delegate(1, acc(2), val(1), 25).await?;
    env.reward(val(1), 40).await?;

    let rewards = env
        .module
        .delegation_rewards(&block(2), acc(1), val(1))
        .await?;
    assert_eq!(rewards, dec_stake("30"));

    env.tx(|dbtx| env.module.set_withdraw_address_tx(dbtx, acc(1), acc(9)))
        .await?;
    let (coins, events) = env
        .tx(|dbtx| {
            env.module
                .withdraw_delegation_rewards_tx(dbtx, &block(2), acc(1), val(1))
        })
        .await?;
    assert_eq!(coins, stake(30));
    assert_eq!(
        EventWithdrawRewards::find_all(&events),
        vec![EventWithdrawRewards {
            validator: val(1),
            delegator: acc(1),
            amount: stake(30),
        }]
    );
    assert_eq!(env.bank.balance(acc(9)), 30);
    assert_eq!(env.bank.balance(acc(1)), 0);

    // nothing new accrued since
    let rewards = env
        .module
        .delegation_rewards(&block(3), acc(1), val(1))
        .await?;
    assert!(rewards.is_zero());

    let (total_rewards, total) = env.module.delegation_total_rewards(&block(3), acc(2)).await?;
    assert_eq!(total_rewards, vec![(val(1), dec_stake("10"))]);
    assert_eq!(total, dec_stake("10"));

    assert_eq!(env.module.invariants().await, vec![]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn slash_reduces_later_rewards() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::zero()).await?;
    env.delegate(1, acc(1), val(1), 100).await?;

    env.reward(val(1), 10).await?;
    env.slash(2, val(1), Dec::percent(50)).await?;
    env.reward(val(1), 10).await?;

    let slashes = env
        .module
        .validator_slashes(val(1), BlockHeight::new(1), BlockHeight::new(3))
        .await;
    assert_eq!(slashes.len(), 1);

    // 10 before the slash, then the remaining half stake earns all of the 10
    let rewards = env
        .module
        .delegation_rewards(&block(3), acc(1), val(1))
        .await?;
    assert_eq!(rewards, dec_stake("20"));

    let (coins, _) = env
        .tx(|dbtx| {
            env.module
                .withdraw_delegation_rewards_tx(dbtx, &block(3), acc(1), val(1))
        })
        .await?;
    assert_eq!(coins, stake(20));

    assert_eq!(env.module.invariants().await, vec![]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn same_block_delegation_earns_nothing() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::zero()).await?;
    env.delegate(5, acc(1), val(1), 100).await?;
    env.reward(val(1), 10).await?;

    let rewards = env
        .module
        .delegation_rewards(&block(5), acc(1), val(1))
        .await?;
    assert!(rewards.is_zero());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn withdrawing_requires_delegation() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::zero()).await?;

    let res = env
        .tx(|dbtx| {
            env.module
                .withdraw_delegation_rewards_tx(dbtx, &block(2), acc(1), val(1))
        })
        .await;
    assert_matches!(res, Err(DistributionError::NoDelegationExists { .. }));

    let res = env
        .tx(|dbtx| {
            env.module
                .withdraw_delegation_rewards_tx(dbtx, &block(2), acc(1), val(7))
        })
        .await;
    assert_matches!(res, Err(DistributionError::NoValidatorExists { .. }));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn commission_withdrawal() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::percent(10)).await?;
    env.create_validator(val(2), Dec::zero()).await?;
    env.delegate(1, val(1).to_acc(), val(1), 100).await?;
    env.delegate(1, val(2).to_acc(), val(2), 100).await?;
    env.reward(val(1), 55).await?;
    env.reward(val(2), 10).await?;

    let msg = DistributionMsg::WithdrawValidatorCommission { validator: val(1) };
    let res = env
        .tx(|dbtx| env.module.process_msg_tx(dbtx, &block(2), acc(3), msg.clone()))
        .await;
    assert_matches!(res, Err(DistributionError::NotOperator { .. }));

    env.tx(|dbtx| {
        env.module
            .process_msg_tx(dbtx, &block(2), val(1).to_acc(), msg.clone())
    })
    .await?;
    assert_eq!(env.bank.balance(val(1).to_acc()), 5);
    assert_eq!(env.module.validator_commission(val(1)).await, dec_stake("0.5"));
    assert_eq!(env.module.outstanding_rewards(val(1)).await, dec_stake("50"));

    let res = env
        .tx(|dbtx| env.module.withdraw_validator_commission_tx(dbtx, val(2)))
        .await;
    assert_matches!(res, Err(DistributionError::NoValidatorCommission));

    assert_eq!(env.module.invariants().await, vec![]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn withdraw_address_rules() -> BoxedErrorResult<()> {
    let env = setup().await?;

    let res = env
        .tx(|dbtx| env.module.set_withdraw_address_tx(dbtx, acc(1), module_account()))
        .await;
    assert_matches!(res, Err(DistributionError::BlockedAddress { .. }));

    env.tx(|dbtx| {
        DistributionModule::set_params_tx(
            dbtx,
            &DistributionParams {
                withdraw_addr_enabled: false,
                ..Default::default()
            },
        )?;
        Ok(())
    })
    .await?;
    let res = env
        .tx(|dbtx| env.module.set_withdraw_address_tx(dbtx, acc(1), acc(2)))
        .await;
    assert_matches!(res, Err(DistributionError::WithdrawAddrDisabled));
    assert_eq!(env.module.withdraw_address(acc(1)).await, acc(1));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn community_pool_spend() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.bank.mint(acc(1), 50);

    env.tx(|dbtx| {
        env.module
            .process_msg_tx(dbtx, &block(1), acc(1), DistributionMsg::FundCommunityPool {
                amount: stake(50),
            })
    })
    .await?;
    assert_eq!(env.module.community_pool().await, dec_stake("50"));

    let spend = |amount, recipient| {
        DistributionProposal::from(CommunityPoolSpendProposal {
            recipient,
            amount: stake(amount),
        })
        .into_content("Spend", "Pay for audits")
    };

    let content = spend(30, acc(2));
    env.module.validate_content(&content)?;
    let events = env
        .module
        .db
        .write_with_expect_falliable(|dbtx| env.module.execute_proposal(dbtx, &content))
        .await?;
    assert_eq!(
        EventCommunityPoolSpend::find_all(&events),
        vec![EventCommunityPoolSpend {
            recipient: acc(2),
            amount: stake(30),
        }]
    );
    assert_eq!(env.bank.balance(acc(2)), 30);
    assert_eq!(env.module.community_pool().await, dec_stake("20"));

    // overspending fails and leaves the pool untouched
    let content = spend(100, acc(2));
    let res = env
        .module
        .db
        .write_with_expect_falliable(|dbtx| env.module.execute_proposal(dbtx, &content))
        .await;
    assert!(res.is_err());
    assert_eq!(env.module.community_pool().await, dec_stake("20"));

    let content = spend(1, module_account());
    let res = env
        .module
        .db
        .write_with_expect_falliable(|dbtx| env.module.execute_proposal(dbtx, &content))
        .await;
    assert!(res.is_err());

    let empty = DistributionProposal::from(CommunityPoolSpendProposal {
        recipient: acc(2),
        amount: Coins::empty(),
    })
    .into_content("Spend", "Nothing");
    assert!(env.module.validate_content(&empty).is_err());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn params_change_through_proposal() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let update = |params| {
        DistributionProposal::from(UpdateDistributionParamsProposal { params })
            .into_content("Params", "Raise the community tax")
    };

    let params = DistributionParams {
        community_tax: Dec::percent(10),
        withdraw_addr_enabled: false,
        ..Default::default()
    };
    let content = update(params.clone());
    env.module.validate_content(&content)?;
    let events = env
        .module
        .db
        .write_with_expect_falliable(|dbtx| env.module.execute_proposal(dbtx, &content))
        .await?;
    assert_eq!(
        EventUpdateParams::find_all(&events),
        vec![EventUpdateParams {
            params: params.clone()
        }]
    );
    assert_eq!(env.module.params().await, params);

    let invalid = update(DistributionParams {
        community_tax: Dec::percent(60),
        base_proposer_reward: Dec::percent(30),
        bonus_proposer_reward: Dec::percent(30),
        withdraw_addr_enabled: true,
    });
    assert!(env.module.validate_content(&invalid).is_err());
    assert_eq!(env.module.params().await, params);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn genesis_must_match_module_account() -> BoxedErrorResult<()> {
    let env = setup().await?;
    let genesis = DistributionGenesis {
        outstanding_rewards: vec![OutstandingRewardsRecord {
            validator: val(1),
            outstanding_rewards: dec_stake("10.5"),
        }],
        ..Default::default()
    };

    let res = env.tx(|dbtx| env.module.init_genesis_tx(dbtx, &genesis)).await;
    assert_matches!(res, Err(DistributionError::InvalidGenesis { .. }));

    env.bank.mint(module_account(), 10);
    env.tx(|dbtx| env.module.init_genesis_tx(dbtx, &genesis)).await?;
    assert_eq!(env.module.outstanding_rewards(val(1)).await, dec_stake("10.5"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn genesis_export_imports_back() -> BoxedErrorResult<()> {
    let env = setup().await?;
    env.create_validator(val(1), Dec::percent(5)).await?;
    env.delegate(1, acc(1), val(1), 100).await?;
    env.reward(val(1), 10).await?;
    env.slash(2, val(1), Dec::percent(10)).await?;

    let exported = env
        .module
        .db
        .write_with_expect(|dbtx| env.module.export_genesis(dbtx))
        .await;

    let other = setup().await?;
    other.bank.mint(module_account(), 10);
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
    assert_eq!(exported, reexported);

    let genesis: DistributionGenesis = serde_json::from_value(exported)?;
    assert_eq!(genesis.validator_slash_events.len(), 1);
    assert_eq!(genesis.delegator_starting_infos.len(), 1);
    Ok(())
}
