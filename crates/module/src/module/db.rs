use std::sync::Arc;

use lbm_core::module::ModuleKind;
use lbm_db::Database;
use lbm_db::ctx::WriteTransactionCtx;
pub use lbm_db::error::{DbError, DbResult, DbTxError, DbTxResult, TxSnafu, split_tx_error};
use redb::{TableError, TableHandle as _};
use redb_bincode::{ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition};

fn scoped_table_name(kind: ModuleKind, name: &str) -> String {
    format!("module_{kind}_{name}")
}

/// A wrapper around [`Database`] that encapsulates module's tables
///
/// This is done by prefixing all table names with `module_{module_kind}_`
#[derive(Clone)]
pub struct ModuleDatabase {
    module_kind: ModuleKind,
    inner: Arc<Database>,
}

impl ModuleDatabase {
    pub fn new(module_kind: ModuleKind, db: Arc<Database>) -> Self {
        Self {
            module_kind,
            inner: db,
        }
    }

    pub fn module_kind(&self) -> ModuleKind {
        self.module_kind
    }

    /// See [`Database::write_with_expect_falliable`]
    pub async fn write_with_expect_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ ModuleWriteTransactionCtx) -> DbTxResult<T, E>,
    ) -> Result<T, E>
    where
        E: snafu::Error + 'static,
    {
        self.inner
            .write_with_expect_falliable(|ctx| f(&ModuleWriteTransactionCtx::new(self.module_kind, ctx)))
            .await
    }

    /// See [`Database::write_with_expect`]
    pub async fn write_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ ModuleWriteTransactionCtx) -> DbResult<T>,
    ) -> T {
        self.inner
            .write_with_expect(|ctx| f(&ModuleWriteTransactionCtx::new(self.module_kind, ctx)))
            .await
    }

    /// Run `f` in a write transaction that is always rolled back
    ///
    /// For queries that need to go through keepers of other modules, which
    /// only operate on write transactions.
    pub async fn simulate_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ ModuleWriteTransactionCtx) -> DbResult<T>,
    ) -> T {
        self.inner
            .simulate_with_expect(|ctx| f(&ModuleWriteTransactionCtx::new(self.module_kind, ctx)))
            .await
    }

    /// See [`Database::read_with_expect_falliable`]
    pub async fn read_with_expect_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ ModuleReadTransaction) -> DbTxResult<T, E>,
    ) -> Result<T, E>
    where
        E: snafu::Error + 'static,
    {
        self.inner
            .read_with_expect_falliable(|ctx| f(&ModuleReadTransaction::new(self.module_kind, ctx)))
            .await
    }

    /// See [`Database::read_with_expect`]
    pub async fn read_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ ModuleReadTransaction) -> DbResult<T>,
    ) -> T {
        self.inner
            .read_with_expect(|ctx| f(&ModuleReadTransaction::new(self.module_kind, ctx)))
            .await
    }
}

/// Write transaction scoped to one module's tables
#[derive(Clone, Copy)]
pub struct ModuleWriteTransactionCtx<'a> {
    module_kind: ModuleKind,
    inner: &'a WriteTransactionCtx,
}

impl<'s> ModuleWriteTransactionCtx<'s> {
    pub fn new(module_kind: ModuleKind, inner: &'s WriteTransactionCtx) -> Self {
        Self { module_kind, inner }
    }

    pub fn module_kind(&self) -> ModuleKind {
        self.module_kind
    }

    /// The same transaction, scoped to the tables of module `module_kind`
    ///
    /// Used by keeper implementations, so that calls across modules are part
    /// of the same atomic transaction.
    pub fn rescope(&self, module_kind: ModuleKind) -> ModuleWriteTransactionCtx<'s> {
        Self {
            module_kind,
            inner: self.inner,
        }
    }

    pub fn open_table<K, V>(
        &self,
        table_def: &TableDefinition<'_, K, V>,
    ) -> Result<Table<'s, K, V>, TableError>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>,
    {
        self.inner.open_table(&TableDefinition::new(&scoped_table_name(
            self.module_kind,
            table_def.as_raw().name(),
        )))
    }

    pub fn on_commit(&self, f: impl FnOnce() + 'static) {
        self.inner.on_commit(f);
    }
}

pub struct ModuleReadTransaction<'a> {
    module_kind: ModuleKind,
    inner: &'a ReadTransaction,
}

impl<'s> ModuleReadTransaction<'s> {
    pub fn new(module_kind: ModuleKind, inner: &'s ReadTransaction) -> Self {
        Self { module_kind, inner }
    }

    pub fn open_table<K, V>(
        &self,
        table_def: &TableDefinition<'_, K, V>,
    ) -> Result<ReadOnlyTable<K, V>, TableError>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>,
    {
        self.inner.open_table(&TableDefinition::new(&scoped_table_name(
            self.module_kind,
            table_def.as_raw().name(),
        )))
    }
}

/// Read access common to read and write transactions
///
/// Lets table reading code be shared between queries and message
/// processing.
pub trait ModuleReadableTransaction<'s> {
    type Table<K, V>: ReadableTable<K, V>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>;

    fn open_table<K, V>(
        &self,
        table_def: &TableDefinition<'_, K, V>,
    ) -> Result<Self::Table<K, V>, TableError>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>;
}

impl<'s> ModuleReadableTransaction<'s> for ModuleReadTransaction<'s> {
    type Table<K, V>
        = ReadOnlyTable<K, V>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>;

    fn open_table<K, V>(
        &self,
        table_def: &TableDefinition<'_, K, V>,
    ) -> Result<ReadOnlyTable<K, V>, TableError>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>,
    {
        ModuleReadTransaction::open_table(self, table_def)
    }
}

impl<'s> ModuleReadableTransaction<'s> for ModuleWriteTransactionCtx<'s> {
    type Table<K, V>
        = Table<'s, K, V>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>;

    fn open_table<K, V>(
        &self,
        table_def: &TableDefinition<'_, K, V>,
    ) -> Result<Table<'s, K, V>, TableError>
    where
        K: bincode::Encode + bincode::Decode<()>,
        V: bincode::Encode + bincode::Decode<()>,
    {
        ModuleWriteTransactionCtx::open_table(self, table_def)
    }
}
