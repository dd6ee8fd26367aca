use core::fmt;

use bincode::{Decode, Encode};
use lbm_util_array_type::array_type_fixed_size_define;

array_type_fixed_size_define! {
    #[derive(Encode, Decode, Clone, Copy)]
    pub struct ConsensusVersionMajor(u16);
}

array_type_fixed_size_define! {
    #[derive(Encode, Decode, Clone, Copy)]
    pub struct ConsensusVersionMinor(u16);
}

/// Version of the state machine rules of a module
#[derive(Encode, Decode, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ConsensusVersion {
    /// Changing major version requires a state migration
    major: ConsensusVersionMajor,

    /// Minor versions only add behavior, state stays compatible
    minor: ConsensusVersionMinor,
}

impl fmt::Display for ConsensusVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}.{}", self.major, self.minor))
    }
}

impl ConsensusVersion {
    pub const fn new_const(major: ConsensusVersionMajor, minor: ConsensusVersionMinor) -> Self {
        Self { major, minor }
    }

    pub fn new(
        major: impl Into<ConsensusVersionMajor>,
        minor: impl Into<ConsensusVersionMinor>,
    ) -> Self {
        Self {
            major: major.into(),
            minor: minor.into(),
        }
    }

    pub fn major(self) -> ConsensusVersionMajor {
        self.major
    }

    pub fn minor(self) -> ConsensusVersionMinor {
        self.minor
    }

    /// Can code supporting `self` run state created at `other`
    pub fn supports(self, other: ConsensusVersion) -> bool {
        self.major == other.major && other.minor <= self.minor
    }
}
