use lbm_core::address::ValAddress;
use lbm_module::proposal::ProposalContentError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConsortiumError {
    #[snafu(display("No validator auth for {operator}"))]
    ValidatorNotFound { operator: ValAddress },
    #[snafu(display("Validator {operator} is not allowed to be created"))]
    NotAllowed { operator: ValAddress },
    #[snafu(display("Consortium is disabled"))]
    Disabled,
    #[snafu(display("Consortium can't be enabled through a proposal"))]
    EnablingNotSupported,
    #[snafu(display("No validator auths in the proposal"))]
    EmptyAuths,
    #[snafu(display("Duplicate validator auth for {operator}"))]
    DuplicateAuth { operator: ValAddress },
    #[snafu(display("Invalid proposal"))]
    InvalidProposal { source: ProposalContentError },
}

pub type ConsortiumResult<T> = Result<T, ConsortiumError>;
