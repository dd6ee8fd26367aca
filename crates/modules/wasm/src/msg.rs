use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::coin::Coins;
use lbm_core::module::ModuleKind;
use lbm_module::msg::ModuleMsg;
use serde::{Deserialize, Serialize};

use crate::KIND;
use crate::types::CodeId;

/// Messages handled by the wasm module, sent by the signer
///
/// Contract messages are opaque to the module and passed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum WasmMsg {
    StoreCode {
        #[serde(with = "hex_bytes")]
        code: Vec<u8>,
    },
    InstantiateContract {
        code_id: CodeId,
        admin: Option<AccAddress>,
        label: String,
        #[serde(with = "hex_bytes")]
        msg: Vec<u8>,
        #[serde(default)]
        funds: Coins,
    },
    ExecuteContract {
        contract: AccAddress,
        #[serde(with = "hex_bytes")]
        msg: Vec<u8>,
        #[serde(default)]
        funds: Coins,
    },
    MigrateContract {
        contract: AccAddress,
        code_id: CodeId,
        #[serde(with = "hex_bytes")]
        msg: Vec<u8>,
    },
    UpdateAdmin {
        contract: AccAddress,
        new_admin: AccAddress,
    },
    ClearAdmin {
        contract: AccAddress,
    },
}

impl ModuleMsg for WasmMsg {
    const MODULE_KIND: ModuleKind = KIND;
}

mod hex_bytes {
    use data_encoding::HEXLOWER_PERMISSIVE;
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&data_encoding::HEXLOWER.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        HEXLOWER_PERMISSIVE
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
