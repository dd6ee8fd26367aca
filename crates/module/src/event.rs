use std::fmt;
use std::sync::Arc;

use bincode::{Decode, Encode};
use derive_more::Deref;
use lbm_core::bincode::STD_BINCODE_CONFIG;
use lbm_core::module::ModuleKind;
use lbm_util_bincode::decode_whole;
use snafu::{ResultExt as _, Snafu, ensure};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct EventId(u32);

impl EventId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A typed event emitted by a module
pub trait EventKind: Encode + Decode<()> {
    const MODULE_KIND: ModuleKind;
    const EVENT_ID: EventId;
    /// Stable name, for logs and clients
    const NAME: &'static str;
}

/// An encoded event, tagged with the module and event it came from
#[derive(Clone, PartialEq, Eq, Deref)]
pub struct ModuleEvent {
    pub module_kind: ModuleKind,
    pub event_id: EventId,
    pub name: &'static str,
    #[deref]
    pub raw: Arc<[u8]>,
}

impl fmt::Debug for ModuleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEvent")
            .field("module_kind", &self.module_kind)
            .field("name", &self.name)
            .field("len", &self.raw.len())
            .finish()
    }
}

#[derive(Debug, Snafu)]
pub enum EventDecodeError {
    #[snafu(display("Expected event {expected}, got {actual}"))]
    WrongEvent {
        expected: &'static str,
        actual: &'static str,
    },
    #[snafu(display("Malformed event {name}"))]
    Malformed {
        name: &'static str,
        source: bincode::error::DecodeError,
    },
}

pub trait EventKindExt: EventKind + Sized {
    fn to_event(&self) -> ModuleEvent {
        ModuleEvent {
            module_kind: Self::MODULE_KIND,
            event_id: Self::EVENT_ID,
            name: Self::NAME,
            raw: bincode::encode_to_vec(self, STD_BINCODE_CONFIG)
                .expect("Can't fail")
                .into(),
        }
    }

    fn is(event: &ModuleEvent) -> bool {
        event.module_kind == Self::MODULE_KIND && event.event_id == Self::EVENT_ID
    }

    fn from_event(event: &ModuleEvent) -> Result<Self, EventDecodeError> {
        ensure!(
            Self::is(event),
            WrongEventSnafu {
                expected: Self::NAME,
                actual: event.name,
            }
        );
        decode_whole(&event.raw, STD_BINCODE_CONFIG).context(MalformedSnafu { name: Self::NAME })
    }

    /// All the events of this kind in `events`, in order
    fn find_all(events: &[ModuleEvent]) -> Vec<Self> {
        events
            .iter()
            .filter(|e| Self::is(e))
            .filter_map(|e| Self::from_event(e).ok())
            .collect()
    }
}

impl<T> EventKindExt for T where T: EventKind {}
