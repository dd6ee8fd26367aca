use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lbm_core::address::{AccAddress, ValAddress};
use lbm_module_gov::types::ProposalId;
use lbm_module_wasm::types::CodeId;

#[derive(Parser, Debug)]
#[command(version, about = "Run the LBM application over a local database")]
pub(crate) struct Opts {
    #[arg(long, env = "LBMD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Denomination of the staking token
    #[arg(
        long,
        env = "LBMD_BOND_DENOM",
        default_value = lbm_app::DEFAULT_BOND_DENOM,
        global = true
    )]
    pub bond_denom: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Start a new chain from a genesis file
    Init {
        #[arg(long)]
        genesis: PathBuf,
    },
    /// Apply the next block, read from a JSON file
    ApplyBlock {
        #[arg(long)]
        block: PathBuf,
    },
    /// Print the current state as a genesis file
    Export,
    #[command(subcommand)]
    Query(QueryCommands),
}

#[derive(Debug, Subcommand)]
pub(crate) enum QueryCommands {
    LastBlock,
    Balance {
        address: AccAddress,
    },
    Supply,
    Validator {
        operator: ValAddress,
    },
    Delegation {
        delegator: AccAddress,
        validator: ValAddress,
    },
    CommunityPool,
    /// Pending rewards of a delegator, of all its delegations by default
    Rewards {
        delegator: AccAddress,
        #[arg(long)]
        validator: Option<ValAddress>,
    },
    Commission {
        validator: ValAddress,
    },
    Proposal {
        proposal_id: ProposalId,
    },
    Proposals {
        #[arg(long)]
        voter: Option<AccAddress>,
        #[arg(long)]
        depositor: Option<AccAddress>,
    },
    Tally {
        proposal_id: ProposalId,
    },
    Consortium,
    Code {
        code_id: CodeId,
    },
    Contract {
        address: AccAddress,
    },
    InactiveContracts,
    /// Check the distribution invariants
    Invariants,
}
