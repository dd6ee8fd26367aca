use bincode::{Decode, Encode};
use lbm_core::module::ModuleKind;
use lbm_module::event::{EventId, EventKind};
use serde::{Deserialize, Serialize};

use crate::KIND;
use crate::module::ValidatorAuth;
use crate::params::ConsortiumParams;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventUpdateConsortiumParams {
    pub params: ConsortiumParams,
}

impl EventKind for EventUpdateConsortiumParams {
    const MODULE_KIND: ModuleKind = KIND;
    const EVENT_ID: EventId = EventId::new(0);
    const NAME: &'static str = "update_consortium_params";
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct EventUpdateValidatorAuth {
    pub auth: ValidatorAuth,
}

impl EventKind for EventUpdateValidatorAuth {
    const MODULE_KIND: ModuleKind = KIND;
    const EVENT_ID: EventId = EventId::new(1);
    const NAME: &'static str = "update_validator_auth";
}
