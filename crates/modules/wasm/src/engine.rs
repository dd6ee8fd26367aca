//! The virtual machine running contract code
//!
//! Only the registry and gating of contracts lives in this module. Code
//! validation and execution are delegated to a [`WasmEngine`], called
//! after all the checks of the module passed.

use std::sync::Arc;

use lbm_core::address::AccAddress;
use lbm_core::coin::Coins;
use lbm_util_error::WhateverResult;
use snafu::ensure_whatever;

use crate::types::Checksum;

/// Every wasm binary starts with these bytes
pub const WASM_MAGIC: &[u8] = b"\0asm";

/// Environment of a contract call
#[derive(Debug, Clone, Copy)]
pub struct ContractEnv<'a> {
    pub contract: AccAddress,
    pub sender: AccAddress,
    pub funds: &'a Coins,
}

pub trait WasmEngine: Send + Sync {
    /// Validate and compile `code`, returning its checksum
    fn store_code(&self, code: &[u8]) -> WhateverResult<Checksum>;

    fn instantiate(
        &self,
        checksum: Checksum,
        env: ContractEnv<'_>,
        msg: &[u8],
    ) -> WhateverResult<Vec<u8>>;

    fn execute(&self, checksum: Checksum, env: ContractEnv<'_>, msg: &[u8])
    -> WhateverResult<Vec<u8>>;

    fn migrate(&self, checksum: Checksum, env: ContractEnv<'_>, msg: &[u8])
    -> WhateverResult<Vec<u8>>;
}

pub type DynWasmEngine = Arc<dyn WasmEngine>;

/// Engine accepting any wasm binary and running nothing
///
/// For chains that only track contracts, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryOnlyEngine;

impl WasmEngine for RegistryOnlyEngine {
    fn store_code(&self, code: &[u8]) -> WhateverResult<Checksum> {
        ensure_whatever!(code.starts_with(WASM_MAGIC), "Not a wasm binary");
        Ok(Checksum::of_code(code))
    }

    fn instantiate(
        &self,
        _checksum: Checksum,
        _env: ContractEnv<'_>,
        _msg: &[u8],
    ) -> WhateverResult<Vec<u8>> {
        Ok(vec![])
    }

    fn execute(
        &self,
        _checksum: Checksum,
        _env: ContractEnv<'_>,
        msg: &[u8],
    ) -> WhateverResult<Vec<u8>> {
        ensure_whatever!(!msg.is_empty(), "Empty execute message");
        Ok(vec![])
    }

    fn migrate(
        &self,
        _checksum: Checksum,
        _env: ContractEnv<'_>,
        _msg: &[u8],
    ) -> WhateverResult<Vec<u8>> {
        Ok(vec![])
    }
}
