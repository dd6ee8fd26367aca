use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ConsortiumParams {
    /// Is validator creation restricted to authorized operators
    pub enabled: bool,
}
