use bincode::{Decode, Encode};
use lbm_core::address::AccAddress;
use lbm_core::module::ModuleKind;
use lbm_module::event::{EventId, EventKind};
use serde::{Deserialize, Serialize};

use crate::KIND;
use crate::types::{Checksum, CodeId};

macro_rules! event_kind {
    ($name:ident, $id:expr, $str:expr) => {
        impl EventKind for $name {
            const MODULE_KIND: ModuleKind = KIND;
            const EVENT_ID: EventId = EventId::new($id);
            const NAME: &'static str = $str;
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventStoreCode {
    pub code_id: CodeId,
    pub checksum: Checksum,
}
event_kind!(EventStoreCode, 0, "store_code");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventInstantiate {
    pub contract: AccAddress,
    pub code_id: CodeId,
}
event_kind!(EventInstantiate, 1, "instantiate");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventExecute {
    pub contract: AccAddress,
}
event_kind!(EventExecute, 2, "execute");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventMigrate {
    pub contract: AccAddress,
    pub code_id: CodeId,
}
event_kind!(EventMigrate, 3, "migrate");

/// Admin changed, `None` when cleared
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventUpdateAdmin {
    pub contract: AccAddress,
    pub new_admin: Option<AccAddress>,
}
event_kind!(EventUpdateAdmin, 4, "update_admin");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventDeactivateContract {
    pub contract: AccAddress,
}
event_kind!(EventDeactivateContract, 5, "deactivate_contract");

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventActivateContract {
    pub contract: AccAddress,
}
event_kind!(EventActivateContract, 6, "activate_contract");
