use lbm_core::bincode::STD_BINCODE_CONFIG;
use lbm_core::module::ModuleKind;
use lbm_core::msg::MsgRaw;
use lbm_util_bincode::decode_whole;
use snafu::{ResultExt as _, Snafu, ensure};

#[derive(Debug, Snafu)]
pub enum MsgDecodeError {
    #[snafu(display("Message addressed to module {actual}, expected {expected}"))]
    WrongModule {
        expected: ModuleKind,
        actual: ModuleKind,
    },
    #[snafu(display("Malformed message"))]
    MalformedMsg { source: bincode::error::DecodeError },
}

/// The message type of a module
pub trait ModuleMsg: bincode::Encode + bincode::Decode<()> + Sized {
    const MODULE_KIND: ModuleKind;

    fn encode_to_raw(&self) -> MsgRaw {
        MsgRaw {
            module: Self::MODULE_KIND,
            raw: bincode::encode_to_vec(self, STD_BINCODE_CONFIG)
                .expect("Can't fail")
                .into(),
        }
    }

    fn decode_from_raw(msg: &MsgRaw) -> Result<Self, MsgDecodeError> {
        ensure!(
            msg.module == Self::MODULE_KIND,
            WrongModuleSnafu {
                expected: Self::MODULE_KIND,
                actual: msg.module,
            }
        );
        decode_whole(&msg.raw, STD_BINCODE_CONFIG).context(MalformedMsgSnafu)
    }
}
