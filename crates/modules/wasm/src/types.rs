use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::block::BlockHeight;
use lbm_util_array_type::{
    array_type_define, array_type_fixed_size_define, array_type_impl_debug_as_display,
    array_type_impl_hex_str, array_type_impl_serde, array_type_impl_serde_as_number,
};
use serde::{Deserialize, Serialize};

array_type_fixed_size_define! {
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct CodeId(u64);
}
array_type_impl_serde_as_number!(CodeId, u64);

array_type_fixed_size_define! {
    /// Sequence number of an instantiation, used to derive contract addresses
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct InstanceId(u64);
}
array_type_impl_serde_as_number!(InstanceId, u64);

array_type_define! {
    /// Hash of uploaded wasm code
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct Checksum[32];
}
array_type_impl_hex_str!(Checksum);
array_type_impl_serde!(Checksum);
array_type_impl_debug_as_display!(Checksum);

impl Checksum {
    pub fn of_code(code: &[u8]) -> Self {
        Self::from_bytes(*blake3::hash(code).as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct CodeInfo {
    pub checksum: Checksum,
    pub creator: AccAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ContractInfo {
    pub code_id: CodeId,
    pub creator: AccAddress,
    /// Account allowed to migrate the contract, if any
    pub admin: Option<AccAddress>,
    pub label: String,
    /// Height of the instantiation
    pub created: BlockHeight,
}

/// Address of the `instance_id`-th contract, instantiated from `code_id`
pub fn contract_address(code_id: CodeId, instance_id: InstanceId) -> AccAddress {
    let hash = blake3::Hasher::new()
        .update(b"wasm")
        .update(code_id.as_slice())
        .update(instance_id.as_slice())
        .finalize();
    let mut bytes = [0u8; AccAddress::LEN];
    bytes.copy_from_slice(&hash.as_bytes()[..AccAddress::LEN]);
    AccAddress::from_bytes(bytes)
}
