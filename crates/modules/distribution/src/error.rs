use lbm_core::address::{AccAddress, ValAddress};
use lbm_module::keepers::InsufficientFundsError;
use lbm_module::proposal::ProposalContentError;
use lbm_db::error::{DbTxResult, TxSnafu};
use snafu::{ResultExt as _, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DistributionError {
    #[snafu(display("No delegation distribution info"))]
    EmptyDelegationDistInfo,
    #[snafu(display("Validator {validator} does not exist"))]
    NoValidatorExists { validator: ValAddress },
    #[snafu(display("Delegation of {delegator} to {validator} does not exist"))]
    NoDelegationExists {
        delegator: AccAddress,
        validator: ValAddress,
    },
    #[snafu(display("No validator commission to withdraw"))]
    NoValidatorCommission,
    #[snafu(display("Set withdraw address disabled"))]
    WithdrawAddrDisabled,
    #[snafu(display("{addr} is not allowed to receive external funds"))]
    BlockedAddress { addr: AccAddress },
    #[snafu(display("Community pool does not have sufficient coins to distribute"))]
    BadDistribution,
    #[snafu(display("{signer} is not the operator of {validator}"))]
    NotOperator {
        signer: AccAddress,
        validator: ValAddress,
    },
    #[snafu(display("Invalid params: {reason}"))]
    InvalidParams { reason: &'static str },
    #[snafu(display("Invalid proposal amount"))]
    InvalidProposalAmount,
    #[snafu(display("Invalid proposal"))]
    InvalidProposal { source: ProposalContentError },
    #[snafu(display("Invalid genesis: {reason}"))]
    InvalidGenesis { reason: String },
    /// Reward bookkeeping is inconsistent; the state is corrupted
    #[snafu(display("Rewards accounting broken: {reason}"))]
    Accounting { reason: String },
    #[snafu(transparent)]
    InsufficientFunds { source: InsufficientFundsError },
}

pub type DistributionResult<T> = Result<T, DistributionError>;

/// Fail the transaction with [`DistributionError::Accounting`]
pub(crate) fn accounting<T>(reason: impl Into<String>) -> DbTxResult<T, DistributionError> {
    AccountingSnafu {
        reason: reason.into(),
    }
    .fail()
    .context(TxSnafu)
}
