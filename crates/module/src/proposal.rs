//! Governance proposal contents and their routing
//!
//! Gov stores and votes on [`ProposalContent`] without understanding it.
//! The module named by [`ProposalContent::route`] validates the content at
//! submission and executes it once the proposal passes.

use std::collections::BTreeMap;
use std::sync::Arc;

use bincode::{Decode, Encode};
use lbm_core::bincode::STD_BINCODE_CONFIG;
use lbm_core::module::ModuleKind;
use lbm_util_bincode::decode_whole;
use lbm_util_error::{Whatever, WhateverResult};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, Snafu, ensure};

use crate::event::ModuleEvent;
use crate::module::db::{DbTxResult, ModuleWriteTransactionCtx};

pub const MAX_TITLE_LEN: usize = 140;
pub const MAX_DESCRIPTION_LEN: usize = 10000;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ProposalContent {
    /// Module handling the proposal
    pub route: ModuleKind,
    pub title: String,
    pub description: String,
    /// Module-specific payload, see [`ProposalKind`]
    #[serde(with = "payload_hex")]
    pub raw: Arc<[u8]>,
}

mod payload_hex {
    use std::sync::Arc;

    use data_encoding::HEXLOWER;
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Arc<[u8]>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&HEXLOWER.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Arc<[u8]>, D::Error> {
        let s = String::deserialize(d)?;
        HEXLOWER
            .decode(s.as_bytes())
            .map(Arc::from)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Snafu)]
pub enum ProposalContentError {
    #[snafu(display("Proposal title can't be blank"))]
    BlankTitle,
    #[snafu(display("Proposal title longer than {MAX_TITLE_LEN}"))]
    TitleTooLong,
    #[snafu(display("Proposal description can't be blank"))]
    BlankDescription,
    #[snafu(display("Proposal description longer than {MAX_DESCRIPTION_LEN}"))]
    DescriptionTooLong,
    #[snafu(display("Proposal routed to {actual}, expected {expected}"))]
    WrongRoute {
        expected: ModuleKind,
        actual: ModuleKind,
    },
    #[snafu(display("Malformed proposal payload"))]
    MalformedPayload { source: bincode::error::DecodeError },
}

impl ProposalContent {
    /// Checks common to all the proposal types
    pub fn validate_basic(&self) -> Result<(), ProposalContentError> {
        ensure!(!self.title.trim().is_empty(), BlankTitleSnafu);
        ensure!(self.title.len() <= MAX_TITLE_LEN, TitleTooLongSnafu);
        ensure!(!self.description.trim().is_empty(), BlankDescriptionSnafu);
        ensure!(
            self.description.len() <= MAX_DESCRIPTION_LEN,
            DescriptionTooLongSnafu
        );
        Ok(())
    }
}

/// The proposal payload type of a module
pub trait ProposalKind: Encode + Decode<()> + Sized {
    const ROUTE: ModuleKind;

    fn into_content(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> ProposalContent {
        ProposalContent {
            route: Self::ROUTE,
            title: title.into(),
            description: description.into(),
            raw: bincode::encode_to_vec(self, STD_BINCODE_CONFIG)
                .expect("Can't fail")
                .into(),
        }
    }

    fn from_content(content: &ProposalContent) -> Result<Self, ProposalContentError> {
        ensure!(
            content.route == Self::ROUTE,
            WrongRouteSnafu {
                expected: Self::ROUTE,
                actual: content.route,
            }
        );
        decode_whole(&content.raw, STD_BINCODE_CONFIG).context(MalformedPayloadSnafu)
    }
}

/// A module able to execute proposals routed to it
pub trait ProposalHandler: Send + Sync {
    /// Stateless validation, done at submission
    fn validate_content(&self, content: &ProposalContent) -> WhateverResult<()>;

    /// Execute a passed proposal
    ///
    /// Runs in a transaction of its own, so on error everything the
    /// handler wrote is rolled back.
    fn execute_proposal(
        &self,
        dbtx: &ModuleWriteTransactionCtx,
        content: &ProposalContent,
    ) -> DbTxResult<Vec<ModuleEvent>, Whatever>;
}

pub type DynProposalHandler = Arc<dyn ProposalHandler>;

/// Maps proposal routes to their handlers
#[derive(Clone, Default)]
pub struct ProposalRouter {
    handlers: BTreeMap<ModuleKind, DynProposalHandler>,
}

impl ProposalRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: ModuleKind, handler: DynProposalHandler) -> Self {
        let prev = self.handlers.insert(route, handler);
        assert!(prev.is_none(), "Route {route} registered twice");
        self
    }

    pub fn has_route(&self, route: ModuleKind) -> bool {
        self.handlers.contains_key(&route)
    }

    pub fn handler(&self, route: ModuleKind) -> Option<&DynProposalHandler> {
        self.handlers.get(&route)
    }

    pub fn routes(&self) -> impl Iterator<Item = ModuleKind> + '_ {
        self.handlers.keys().copied()
    }
}
