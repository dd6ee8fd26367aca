//! Module kinds of all the known modules
//!
//! Kinds identify a module's messages, events and store namespace, so they
//! must never be reused.

use lbm_core::module::ModuleKind;

pub const CONSORTIUM: ModuleKind = ModuleKind::new(1);
pub const DISTRIBUTION: ModuleKind = ModuleKind::new(2);
pub const GOV: ModuleKind = ModuleKind::new(3);
pub const WASM: ModuleKind = ModuleKind::new(4);

/// Account balances, provided by the application
pub const BANK: ModuleKind = ModuleKind::new(10);
/// Validators and delegations, provided by the application
pub const STAKING: ModuleKind = ModuleKind::new(11);
