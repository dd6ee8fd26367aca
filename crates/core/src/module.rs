use bincode::{Decode, Encode};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Identifies a module (and its store namespace)
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Encode,
    Decode,
    Debug,
    Display,
    From,
    Serialize,
    Deserialize,
)]
pub struct ModuleKind(u32);

impl ModuleKind {
    pub const fn new(kind: u32) -> Self {
        Self(kind)
    }
}
