use lbm_core::address::{AccAddress, ValAddress};
use lbm_core::block::BlockHeight;
use lbm_core::module::ModuleKind;
use lbm_module::keepers::InsufficientFundsError;
use lbm_module::module::ModuleInitError;
use lbm_util_error::Whatever;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BankError {
    #[snafu(display("{addr} is not allowed to receive funds"))]
    BlockedRecipient { addr: AccAddress },
    #[snafu(display("Nothing to send"))]
    EmptyAmount,
    #[snafu(display("Coin supply overflow"))]
    SupplyOverflow,
    #[snafu(transparent)]
    InsufficientFunds { source: InsufficientFundsError },
    #[snafu(display("Invalid bank genesis: {reason}"))]
    InvalidBankGenesis { reason: String },
}

pub type BankResult<T> = Result<T, BankError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StakingError {
    #[snafu(display("Validator {operator} already exists"))]
    ValidatorExists { operator: ValAddress },
    #[snafu(display("Unknown validator {operator}"))]
    ValidatorNotFound { operator: ValAddress },
    #[snafu(display("{delegator} has no delegation to {validator}"))]
    DelegationNotFound {
        delegator: AccAddress,
        validator: ValAddress,
    },
    #[snafu(display("Delegation holds fewer shares than requested"))]
    InsufficientShares,
    #[snafu(display("Amount must be positive"))]
    ZeroAmount,
    #[snafu(display("Commission rate must be between 0 and 1"))]
    InvalidCommissionRate,
    #[snafu(display("Slash fraction must be between 0 and 1"))]
    InvalidSlashFraction,
    #[snafu(display("Validator creation rejected"))]
    CreationRejected { source: Whatever },
    #[snafu(display("Staking hook failed"))]
    Hook { source: Whatever },
    #[snafu(transparent)]
    InsufficientFunds { source: InsufficientFundsError },
    #[snafu(display("Invalid staking genesis: {reason}"))]
    InvalidStakingGenesis { reason: String },
}

pub type StakingResult<T> = Result<T, StakingError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("Failed to initialize a module"))]
    ModuleInit { source: ModuleInitError },
    #[snafu(display("Chain not initialized yet"))]
    NotInitialized,
    #[snafu(display("Chain already initialized at height {height}"))]
    AlreadyInitialized { height: BlockHeight },
    #[snafu(display("Invalid {module} genesis"))]
    Genesis {
        module: &'static str,
        source: Whatever,
    },
    #[snafu(display("Block {height} is not the next block, expected {expected}"))]
    UnexpectedHeight {
        height: BlockHeight,
        expected: BlockHeight,
    },
    #[snafu(display("Begin block failed in module {module}"))]
    BeginBlock {
        module: ModuleKind,
        source: Whatever,
    },
    #[snafu(display("End block failed in module {module}"))]
    EndBlock {
        module: ModuleKind,
        source: Whatever,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// Why a transaction was rejected
///
/// A transaction failing after its fee was paid keeps the fee charged,
/// but none of its messages take effect.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeliverTxError {
    #[snafu(display("Transaction has no messages"))]
    EmptyTx,
    #[snafu(display("Can't pay the fee"))]
    Fee { source: InsufficientFundsError },
    #[snafu(display("Message {index} addressed to unknown module {module}"))]
    UnknownModule { index: usize, module: ModuleKind },
    #[snafu(display("Message {index} to module {module} failed"))]
    Msg {
        index: usize,
        module: ModuleKind,
        source: Whatever,
    },
}
