// SPDX-License-Identifier: MIT

//! Transactional storage for the application state
//!
//! Thin layer over `redb` (via `redb-bincode`): every state transition of
//! a block runs inside a single write transaction, which either commits
//! as a whole or leaves no trace.

pub mod ctx;
pub mod error;

use std::path::PathBuf;
use std::sync::Arc;

use ctx::WriteTransactionCtx;
use error::{
    CommitSnafu, DatabaseSnafu, DbResult, DbTxError, DbTxResult, InvalidPathSnafu, JoinSnafu,
    TransactionSnafu,
};
use lbm_util_error::fmt::FmtCompact as _;
use redb_bincode::ReadTransaction;
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{debug, instrument, warn};

const LOG_TARGET: &str = "lbm::db";

#[derive(Debug)]
pub struct Database {
    inner: redb_bincode::Database,
    commit_hook_order_lock: Arc<std::sync::Mutex<()>>,
    ephemeral: bool,
}

impl Database {
    pub async fn new_in_memory() -> DbResult<Database> {
        debug!(target: LOG_TARGET, "Opening in-memory database");
        let inner = redb::Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .context(DatabaseSnafu)?;
        Self::open_inner(inner, true).await
    }

    pub async fn open(path: impl Into<PathBuf>) -> DbResult<Database> {
        let path = path.into();
        tokio::fs::create_dir_all(path.parent().context(InvalidPathSnafu)?).await?;
        debug!(target: LOG_TARGET, path = %path.display(), "Opening database…");

        let inner = tokio::task::spawn_blocking(move || {
            let mut db = redb::Database::create(path)?;
            let _ = db.compact().inspect_err(|err| {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to compact database");
            });
            Ok(db)
        })
        .await
        .context(JoinSnafu)?
        .context(DatabaseSnafu)?;

        Self::open_inner(inner, false).await
    }

    #[instrument(skip_all)]
    async fn open_inner(inner: redb::Database, ephemeral: bool) -> DbResult<Database> {
        Ok(Self {
            inner: redb_bincode::Database::from(inner),
            commit_hook_order_lock: Arc::new(std::sync::Mutex::new(())),
            ephemeral,
        })
    }

    fn read_with_inner<T, E>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbTxResult<T, E>,
    ) -> DbTxResult<T, E>
    where
        E: snafu::Error + 'static,
    {
        tokio::task::block_in_place(|| {
            let dbtx = self.inner.begin_read().context(TransactionSnafu)?;
            f(&dbtx)
        })
    }

    /// Run `f` in a write transaction, committing only if it succeeded
    ///
    /// On any error the transaction is dropped, which aborts it.
    fn write_with_inner<T, E>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbTxResult<T, E>,
    ) -> DbTxResult<T, E>
    where
        E: snafu::Error + 'static,
    {
        tokio::task::block_in_place(|| {
            let dbtx = WriteTransactionCtx::new(
                self.inner.begin_write().context(TransactionSnafu)?,
                self.commit_hook_order_lock.clone(),
            );
            let res = f(&dbtx)?;
            dbtx.commit().context(CommitSnafu)?;

            Ok(res)
        })
    }

    fn expect_db_ok<T, E>(res: DbTxResult<T, E>) -> Result<T, E>
    where
        E: snafu::Error + 'static,
    {
        match res {
            Ok(o) => Ok(o),
            Err(DbTxError::DbError { source, location }) => {
                panic!("Database error: {source:#} at {location}")
            }
            Err(DbTxError::TxError {
                source,
                location: _,
            }) => Err(source),
        }
    }

    pub async fn write_with<T, E>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbTxResult<T, E>,
    ) -> DbTxResult<T, E>
    where
        E: snafu::Error + 'static,
    {
        self.write_with_inner(f)
    }

    /// Do a writeable database transaction that can fail for logical reasons
    ///
    /// Internal db errors cause a panic, logical errors abort the
    /// transaction and are returned.
    pub async fn write_with_expect_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbTxResult<T, E>,
    ) -> Result<T, E>
    where
        E: snafu::Error + 'static,
    {
        Self::expect_db_ok(self.write_with_inner(f))
    }

    /// Do a writeable database transaction and panic on internal db errors
    ///
    /// If the handler `f` can fail for logical reasons, use
    /// [`Self::write_with_expect_falliable`]
    pub async fn write_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbResult<T>,
    ) -> T {
        tokio::task::block_in_place(|| -> DbResult<T> {
            let dbtx = WriteTransactionCtx::new(
                self.inner.begin_write().context(TransactionSnafu)?,
                self.commit_hook_order_lock.clone(),
            );
            let res = f(&dbtx)?;
            dbtx.commit().context(CommitSnafu)?;
            Ok(res)
        })
        .expect("Fatal database error")
    }

    /// Run `f` in a write transaction that is never committed
    ///
    /// Commit hooks registered by `f` are dropped. Panics on internal db
    /// errors.
    pub async fn simulate_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ WriteTransactionCtx) -> DbResult<T>,
    ) -> T {
        tokio::task::block_in_place(|| -> DbResult<T> {
            let dbtx = WriteTransactionCtx::new(
                self.inner.begin_write().context(TransactionSnafu)?,
                self.commit_hook_order_lock.clone(),
            );
            f(&dbtx)
        })
        .expect("Fatal database error")
    }

    pub async fn read_with_expect_falliable<T, E>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbTxResult<T, E>,
    ) -> Result<T, E>
    where
        E: snafu::Error + 'static,
    {
        Self::expect_db_ok(self.read_with_inner(f))
    }

    pub async fn read_with_expect<T>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbResult<T>,
    ) -> T {
        tokio::task::block_in_place(|| -> DbResult<T> {
            let dbtx = self.inner.begin_read().context(TransactionSnafu)?;
            f(&dbtx)
        })
        .expect("Fatal database error")
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }
}

#[cfg(test)]
mod tests;
