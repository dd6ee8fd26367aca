use std::sync::Arc;

use bincode::{Decode, Encode};

use crate::address::AccAddress;
use crate::coin::Coins;
use crate::module::ModuleKind;

/// An encoded message addressed to a module
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MsgRaw {
    pub module: ModuleKind,
    pub raw: Arc<[u8]>,
}

/// Messages from one signer, executed atomically
///
/// Signature verification happens before a transaction reaches the modules.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Tx {
    pub signer: AccAddress,
    pub fee: Coins,
    pub msgs: Vec<MsgRaw>,
}
