use bincode::{Decode, Encode};
use lbm_util_array_type::{
    array_type_define, array_type_impl_debug_as_display, array_type_impl_prefixed_base32_str,
    array_type_impl_rand, array_type_impl_serde,
};

array_type_define! {
    /// Account address
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct AccAddress[20];
}
array_type_impl_prefixed_base32_str!(AccAddress, "link1");
array_type_impl_serde!(AccAddress);
array_type_impl_debug_as_display!(AccAddress);
array_type_impl_rand!(AccAddress);

array_type_define! {
    /// Validator operator address
    ///
    /// Same bytes as the operator's [`AccAddress`], different type, so the
    /// two can't be mixed up by accident.
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct ValAddress[20];
}
array_type_impl_prefixed_base32_str!(ValAddress, "linkvaloper1");
array_type_impl_serde!(ValAddress);
array_type_impl_debug_as_display!(ValAddress);
array_type_impl_rand!(ValAddress);

impl AccAddress {
    /// Address of the account owned by the module `name`
    pub fn module(name: &str) -> Self {
        let hash = blake3::Hasher::new()
            .update(b"module")
            .update(name.as_bytes())
            .finalize();
        let mut bytes = [0u8; Self::LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..Self::LEN]);
        Self(bytes)
    }

    pub fn to_val(self) -> ValAddress {
        ValAddress(self.0)
    }
}

impl ValAddress {
    pub fn to_acc(self) -> AccAddress {
        AccAddress(self.0)
    }
}

impl From<ValAddress> for AccAddress {
    fn from(value: ValAddress) -> Self {
        value.to_acc()
    }
}

impl From<AccAddress> for ValAddress {
    fn from(value: AccAddress) -> Self {
        value.to_val()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn address_display_parse() {
        let addr: AccAddress = rand::random();
        let s = addr.to_string();
        assert!(s.starts_with("link1"));
        assert_eq!(AccAddress::from_str(&s), Ok(addr));

        let val = addr.to_val();
        let s = val.to_string();
        assert!(s.starts_with("linkvaloper1"));
        assert_eq!(ValAddress::from_str(&s), Ok(val));

        // wrong prefix
        assert!(AccAddress::from_str(&s).is_err());
        assert!(ValAddress::from_str(&addr.to_string()).is_err());
    }

    #[test]
    fn module_addresses_are_distinct() {
        assert_ne!(AccAddress::module("gov"), AccAddress::module("distribution"));
        assert_eq!(AccAddress::module("gov"), AccAddress::module("gov"));
    }

    #[test]
    fn address_json() {
        let addr: AccAddress = rand::random();
        let json = serde_json::to_string(&addr).expect("Can't fail");
        assert_eq!(json, format!("\"{addr}\""));
        let back: AccAddress = serde_json::from_str(&json).expect("Can't fail");
        assert_eq!(back, addr);
    }
}
