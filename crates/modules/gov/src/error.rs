use lbm_core::module::ModuleKind;
use lbm_module::keepers::InsufficientFundsError;
use lbm_module::proposal::ProposalContentError;
use lbm_util_error::Whatever;
use snafu::Snafu;

use crate::types::{ProposalId, ProposalStatus};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GovError {
    #[snafu(display("Unknown proposal {proposal_id}"))]
    UnknownProposal { proposal_id: ProposalId },
    #[snafu(display("Proposal {proposal_id} is inactive ({status})"))]
    InactiveProposal {
        proposal_id: ProposalId,
        status: ProposalStatus,
    },
    #[snafu(display("No handler for proposal route {route}"))]
    NoProposalHandlerExists { route: ModuleKind },
    #[snafu(display("Invalid proposal content"))]
    InvalidProposalContent { source: Whatever },
    #[snafu(display("Invalid proposal"))]
    InvalidProposal { source: ProposalContentError },
    #[snafu(display("Deposit amount overflows"))]
    DepositOverflow,
    #[snafu(display("Invalid vote: {reason}"))]
    InvalidVote { reason: &'static str },
    #[snafu(display("Invalid params: {reason}"))]
    InvalidParams { reason: &'static str },
    #[snafu(display("Invalid genesis: {reason}"))]
    InvalidGenesis { reason: String },
    #[snafu(transparent)]
    InsufficientFunds { source: InsufficientFundsError },
}

pub type GovResult<T> = Result<T, GovError>;
