use std::sync::Arc;

use assert_matches::assert_matches;
use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::{BlockContext, BlockHeight, BlockInfo};
use lbm_core::coin::Coins;
use lbm_core::dec::Dec;
use lbm_core::module::ModuleKind;
use lbm_core::msg::{MsgRaw, Tx};
use lbm_core::timestamp::Timestamp;
use lbm_db::Database;
use lbm_module::event::EventKindExt as _;
use lbm_module::keepers::{DelegationInfo, ValidatorInfo};
use lbm_module_consortium::module::ValidatorAuth;

use crate::bank::{BalanceRecord, BankMsg, EventTransfer};
use crate::error::{AppError, DeliverTxError, StakingError};
use crate::genesis::AppGenesis;
use crate::msg::{AppBlock, AppMsg, AppTx};
use crate::staking::{EventRemoveValidator, EventSlash, StakingMsg, bonded_pool};
use crate::{App, DEFAULT_BOND_DENOM, fee_collector};

const GENESIS_SECS: u64 = 1_700_000_000;

fn stake(amount: u128) -> Coins {
    Coins::single(DEFAULT_BOND_DENOM, amount).expect("Valid denom")
}

fn acc(n: u8) -> AccAddress {
    AccAddress::from_bytes([n; 20])
}

fn val(n: u8) -> ValAddress {
    ValAddress::from_bytes([n; 20])
}

fn block(height: u64) -> BlockContext {
    BlockContext::new(height, Timestamp::from_unix_secs(GENESIS_SECS + height * 5))
}

fn genesis(balances: &[(AccAddress, u128)]) -> AppGenesis {
    let mut genesis = AppGenesis::new(Timestamp::from_unix_secs(GENESIS_SECS));
    genesis.bank.balances = balances
        .iter()
        .map(|(address, amount)| BalanceRecord {
            address: *address,
            coins: stake(*amount),
        })
        .collect();
    genesis
}

async fn new_app() -> App {
    let db = Arc::new(Database::new_in_memory().await.expect("Can't fail"));
    App::builder().db(db).build().await.expect("Can't fail")
}

async fn app_with(genesis: &AppGenesis) -> App {
    let app = new_app().await;
    app.init_chain(genesis).await.expect("Valid genesis");
    app
}

async fn deliver(
    app: &App,
    signer: AccAddress,
    msgs: impl IntoIterator<Item = AppMsg>,
) -> Result<Vec<lbm_module::event::ModuleEvent>, DeliverTxError> {
    app.deliver_tx(&block(1), &AppTx::new(signer, msgs).to_tx())
        .await
}

fn send(to: AccAddress, amount: u128) -> AppMsg {
    BankMsg::Send {
        to,
        amount: stake(amount),
    }
    .into()
}

fn create_validator(amount: u128) -> AppMsg {
    StakingMsg::CreateValidator {
        commission_rate: Dec::percent(10),
        amount,
    }
    .into()
}

#[tokio::test(flavor = "multi_thread")]
async fn bank_sends_and_rejects_blocked_recipients() {
    let app = app_with(&genesis(&[(acc(1), 1000)])).await;

    let events = deliver(&app, acc(1), [send(acc(2), 100)])
        .await
        .expect("Send succeeds");
    assert_eq!(
        EventTransfer::find_all(&events),
        vec![EventTransfer {
            from: acc(1),
            to: acc(2),
            amount: stake(100),
        }]
    );
    assert_eq!(app.bank().balance(acc(1)).await, stake(900));
    assert_eq!(app.bank().balance(acc(2)).await, stake(100));

    assert_matches!(
        deliver(&app, acc(1), [send(fee_collector(), 1)]).await,
        Err(DeliverTxError::Msg { index: 0, .. })
    );
    assert_matches!(
        deliver(&app, acc(1), [send(acc(2), 0)]).await,
        Err(DeliverTxError::Msg { .. })
    );
    assert_eq!(app.bank().balance(acc(1)).await, stake(900));
    assert_eq!(app.bank().supply().await, stake(1000));
}

#[tokio::test(flavor = "multi_thread")]
async fn messages_of_a_tx_are_atomic_but_the_fee_stays_paid() {
    let app = app_with(&genesis(&[(acc(1), 1000)])).await;

    let tx = AppTx::new(acc(1), [send(acc(2), 100), send(acc(3), 10_000)]).with_fee(stake(10));
    assert_matches!(
        app.deliver_tx(&block(1), &tx.to_tx()).await,
        Err(DeliverTxError::Msg { index: 1, .. })
    );
    assert_eq!(app.bank().balance(acc(1)).await, stake(990));
    assert_eq!(app.bank().balance(acc(2)).await, Coins::empty());
    assert_eq!(app.bank().balance(fee_collector()).await, stake(10));

    let tx = AppTx::new(acc(2), [send(acc(3), 1)]).with_fee(stake(1));
    assert_matches!(
        app.deliver_tx(&block(1), &tx.to_tx()).await,
        Err(DeliverTxError::Fee { .. })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_transactions_are_rejected() {
    let app = app_with(&genesis(&[(acc(1), 1000)])).await;

    assert_matches!(deliver(&app, acc(1), []).await, Err(DeliverTxError::EmptyTx));

    let tx = Tx {
        signer: acc(1),
        fee: Coins::empty(),
        msgs: vec![MsgRaw {
            module: ModuleKind::new(99),
            raw: Arc::from(&[][..]),
        }],
    };
    assert_matches!(
        app.deliver_tx(&block(1), &tx).await,
        Err(DeliverTxError::UnknownModule { index: 0, .. })
    );

    let tx = Tx {
        signer: acc(1),
        fee: Coins::empty(),
        msgs: vec![MsgRaw {
            module: crate::bank::KIND,
            raw: Arc::from(&[0xff, 0xff, 0xff][..]),
        }],
    };
    assert_matches!(
        app.deliver_tx(&block(1), &tx).await,
        Err(DeliverTxError::Msg { index: 0, .. })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn validators_live_while_they_have_delegations() {
    let app = app_with(&genesis(&[(acc(1), 1000), (acc(2), 1000)])).await;

    deliver(&app, acc(1), [create_validator(100)])
        .await
        .expect("Validator created");
    deliver(
        &app,
        acc(2),
        [StakingMsg::Delegate {
            validator: val(1),
            amount: 50,
        }
        .into()],
    )
    .await
    .expect("Delegated");

    let validator = app
        .staking()
        .get_validator(val(1))
        .await
        .expect("Validator exists");
    assert_eq!(validator.tokens, 150);
    assert_eq!(validator.delegator_shares, Dec::from(150u128));
    assert!(validator.bonded);
    assert_eq!(app.bank().balance(bonded_pool()).await, stake(150));
    assert_eq!(app.bank().balance(acc(2)).await, stake(950));

    assert_matches!(
        deliver(&app, acc(1), [create_validator(100)]).await,
        Err(DeliverTxError::Msg { .. })
    );
    assert_matches!(
        deliver(
            &app,
            acc(2),
            [StakingMsg::Undelegate {
                validator: val(1),
                amount: 51,
            }
            .into()],
        )
        .await,
        Err(DeliverTxError::Msg { .. })
    );

    deliver(
        &app,
        acc(2),
        [StakingMsg::Undelegate {
            validator: val(1),
            amount: 50,
        }
        .into()],
    )
    .await
    .expect("Undelegated");
    assert_eq!(app.staking().get_delegation(acc(2), val(1)).await, None);
    assert_eq!(app.bank().balance(acc(2)).await, stake(1000));

    let events = deliver(
        &app,
        acc(1),
        [StakingMsg::Undelegate {
            validator: val(1),
            amount: 100,
        }
        .into()],
    )
    .await
    .expect("Undelegated");
    assert_eq!(
        EventRemoveValidator::find_all(&events),
        vec![EventRemoveValidator { validator: val(1) }]
    );
    assert_eq!(app.staking().get_validator(val(1)).await, None);
    assert_eq!(app.bank().balance(bonded_pool()).await, Coins::empty());
    assert_eq!(app.bank().balance(acc(1)).await, stake(1000));
}

#[tokio::test(flavor = "multi_thread")]
async fn consortium_gates_validator_creation() {
    let mut genesis = genesis(&[(acc(1), 1000), (acc(2), 1000)]);
    genesis.consortium.params.enabled = true;
    genesis.consortium.validator_auths = vec![ValidatorAuth {
        operator_address: val(1),
        creation_allowed: true,
    }];
    let app = app_with(&genesis).await;

    assert_matches!(
        deliver(&app, acc(2), [create_validator(100)]).await,
        Err(DeliverTxError::Msg { .. })
    );
    assert_eq!(app.staking().get_validator(val(2)).await, None);
    assert_eq!(app.bank().balance(acc(2)).await, stake(1000));

    deliver(&app, acc(1), [create_validator(100)])
        .await
        .expect("Authorized operator");
}

#[tokio::test(flavor = "multi_thread")]
async fn slashing_burns_bonded_tokens() {
    let app = app_with(&genesis(&[(acc(1), 1000)])).await;
    deliver(&app, acc(1), [create_validator(1000)])
        .await
        .expect("Validator created");

    let events = app
        .staking()
        .slash(&block(2), val(1), &Dec::percent(10))
        .await
        .expect("Valid slash");
    assert_eq!(
        EventSlash::find_all(&events),
        vec![EventSlash {
            validator: val(1),
            fraction: Dec::percent(10),
            burned: 100,
        }]
    );
    assert_eq!(
        app.staking()
            .get_validator(val(1))
            .await
            .expect("Validator exists")
            .tokens,
        900
    );
    assert_eq!(app.bank().balance(bonded_pool()).await, stake(900));
    assert_eq!(app.bank().supply().await, stake(900));

    assert_matches!(
        app.staking().slash(&block(2), val(1), &Dec::zero()).await,
        Err(StakingError::InvalidSlashFraction)
    );
    assert_matches!(
        app.staking().slash(&block(2), val(2), &Dec::percent(10)).await,
        Err(StakingError::ValidatorNotFound { .. })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn fully_slashed_delegations_can_leave() {
    let app = app_with(&genesis(&[(acc(1), 1000), (acc(2), 1000)])).await;
    deliver(&app, acc(1), [create_validator(1000)])
        .await
        .expect("Validator created");
    deliver(
        &app,
        acc(2),
        [StakingMsg::Delegate {
            validator: val(1),
            amount: 500,
        }
        .into()],
    )
    .await
    .expect("Delegated");

    app.staking()
        .slash(&block(2), val(1), &Dec::one())
        .await
        .expect("Valid slash");
    assert_eq!(app.bank().balance(bonded_pool()).await, Coins::empty());

    // after the slash, so its rewards bookkeeping sees it
    let undelegate = |signer, amount| {
        let msg: AppMsg = StakingMsg::Undelegate {
            validator: val(1),
            amount,
        }
        .into();
        AppTx::new(signer, [msg]).to_tx()
    };
    app.deliver_tx(&block(3), &undelegate(acc(2), 500))
        .await
        .expect("Shares removed");
    assert_eq!(app.staking().get_delegation(acc(2), val(1)).await, None);
    assert_eq!(app.bank().balance(acc(2)).await, stake(500));
    assert!(app.staking().get_validator(val(1)).await.is_some());

    // the last shares go too, taking the validator with them
    let events = app
        .deliver_tx(&block(3), &undelegate(acc(1), 1))
        .await
        .expect("Shares removed");
    assert_eq!(
        EventRemoveValidator::find_all(&events),
        vec![EventRemoveValidator { validator: val(1) }]
    );
    assert_eq!(app.staking().get_validator(val(1)).await, None);
    assert_eq!(app.bank().balance(acc(1)).await, Coins::empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn blocks_must_follow_the_last_one() {
    let app = new_app().await;
    assert_eq!(app.last_block().await, None);
    assert_matches!(
        app.begin_block(&block(1), &BlockInfo::default()).await,
        Err(AppError::NotInitialized)
    );
    assert_matches!(app.export_genesis().await, Err(AppError::NotInitialized));

    let genesis = genesis(&[(acc(1), 1000)]);
    app.init_chain(&genesis).await.expect("Valid genesis");
    assert_eq!(
        app.last_block().await,
        Some(BlockContext::new(
            BlockHeight::ZERO,
            Timestamp::from_unix_secs(GENESIS_SECS)
        ))
    );
    assert_matches!(
        app.init_chain(&genesis).await,
        Err(AppError::AlreadyInitialized { .. })
    );

    assert_matches!(
        app.begin_block(&block(2), &BlockInfo::default()).await,
        Err(AppError::UnexpectedHeight { .. })
    );

    let outcome = app
        .apply_block(&AppBlock {
            height: BlockHeight::new(1),
            time: block(1).time,
            info: BlockInfo::default(),
            txs: vec![
                AppTx::new(acc(1), [send(acc(2), 10)]),
                AppTx::new(acc(2), [send(acc(3), 100)]),
            ],
        })
        .await
        .expect("Block applies");
    assert_eq!(outcome.txs.len(), 2);
    assert!(outcome.txs[0].is_ok());
    assert!(outcome.txs[1].is_err());
    assert_eq!(app.last_block().await, Some(block(1)));

    assert_matches!(
        app.begin_block(&block(1), &BlockInfo::default()).await,
        Err(AppError::UnexpectedHeight { .. })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn genesis_validators_go_through_the_hooks() {
    let mut genesis = genesis(&[(acc(1), 1000), (bonded_pool(), 100)]);
    genesis.staking.validators = vec![ValidatorInfo {
        operator: val(1),
        tokens: 100,
        delegator_shares: Dec::from(100u128),
        commission_rate: Dec::percent(10),
        bonded: true,
    }];
    genesis.staking.delegations = vec![DelegationInfo {
        delegator: acc(1),
        validator: val(1),
        shares: Dec::from(100u128),
    }];
    let app = app_with(&genesis).await;

    deliver(
        &app,
        acc(1),
        [StakingMsg::Delegate {
            validator: val(1),
            amount: 50,
        }
        .into()],
    )
    .await
    .expect("Distribution knows the delegation");
    assert!(app.distribution().invariants().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_genesis_is_rejected_as_a_whole() {
    let mut genesis = genesis(&[(acc(1), 1000)]);
    genesis.staking.validators = vec![ValidatorInfo {
        operator: val(1),
        tokens: 100,
        delegator_shares: Dec::zero(),
        commission_rate: Dec::percent(10),
        bonded: true,
    }];
    let app = new_app().await;
    assert_matches!(
        app.init_chain(&genesis).await,
        Err(AppError::Genesis {
            module: "staking",
            ..
        })
    );
    assert_eq!(app.last_block().await, None);
    assert_eq!(app.bank().balance(acc(1)).await, Coins::empty());

    let mut genesis = self::genesis(&[(acc(1), 1000), (acc(1), 5)]);
    genesis.initial_height = BlockHeight::new(5);
    assert_matches!(
        app.init_chain(&genesis).await,
        Err(AppError::Genesis { module: "bank", .. })
    );
}
