use lbm_core::address::AccAddress;
use lbm_module::keepers::InsufficientFundsError;
use lbm_module::proposal::ProposalContentError;
use lbm_util_error::Whatever;
use snafu::Snafu;

use crate::types::CodeId;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WasmError {
    #[snafu(display("Unknown code {code_id}"))]
    CodeNotFound { code_id: CodeId },
    #[snafu(display("Unknown contract {contract}"))]
    ContractNotFound { contract: AccAddress },
    #[snafu(display("Contract {contract} is inactive"))]
    InactiveContract { contract: AccAddress },
    #[snafu(display("Contract {contract} is already inactive"))]
    AlreadyInactive { contract: AccAddress },
    #[snafu(display("Contract {contract} is not inactive"))]
    ContractNotInactive { contract: AccAddress },
    #[snafu(display("{sender} is not the admin of {contract}"))]
    Unauthorized {
        sender: AccAddress,
        contract: AccAddress,
    },
    #[snafu(display("Invalid label: {reason}"))]
    InvalidLabel { reason: &'static str },
    #[snafu(display("Empty wasm code"))]
    EmptyCode,
    #[snafu(display("Wasm code larger than {max} bytes"))]
    CodeTooLarge { max: usize },
    #[snafu(display("Contract engine failed"))]
    Engine { source: Whatever },
    #[snafu(display("Invalid proposal"))]
    InvalidProposal { source: ProposalContentError },
    #[snafu(display("Invalid genesis: {reason}"))]
    InvalidGenesis { reason: String },
    #[snafu(transparent)]
    InsufficientFunds { source: InsufficientFundsError },
}

pub type WasmResult<T> = Result<T, WasmError>;
