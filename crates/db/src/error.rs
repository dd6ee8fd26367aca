use std::io;

use lbm_util_error::Whatever;
use snafu::{Location, Snafu};
use tokio::task::JoinError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DbError {
    #[snafu(display("Database error at {location}"))]
    Database {
        source: redb::DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Table {
        source: redb::TableError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Storage {
        source: redb::StorageError,
        #[snafu(implicit)]
        location: Location,
    },
    Transaction {
        source: redb::TransactionError,
        #[snafu(implicit)]
        location: Location,
    },
    Join {
        source: JoinError,
        #[snafu(implicit)]
        location: Location,
    },
    Commit {
        source: redb::CommitError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Io {
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    InvalidPath {
        #[snafu(implicit)]
        location: Location,
    },
}

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Database transaction error with a module-defined logical error
///
/// Either a storage issue bubbling up ([`DbTxError::DbError`]), which is
/// fatal, or a logical error `E` of the transaction handler
/// ([`DbTxError::TxError`]), which aborts the transaction and is reported to
/// the caller.
///
/// See [`DbTxError::tx_into`] and [`DbTxError::map`] for converting between
/// logical error types across module boundaries.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DbTxError<E>
where
    E: snafu::Error + 'static,
{
    #[snafu(transparent)]
    DbError {
        source: DbError,

        #[snafu(implicit)]
        location: Location,
    },
    TxError {
        source: E,
        #[snafu(implicit)]
        location: Location,
    },
}

impl<E> From<redb::TableError> for DbTxError<E>
where
    E: snafu::Error + 'static,
{
    fn from(value: redb::TableError) -> Self {
        DbError::from(value).into()
    }
}

impl<E> From<redb::StorageError> for DbTxError<E>
where
    E: snafu::Error + 'static,
{
    fn from(value: redb::StorageError) -> Self {
        DbError::from(value).into()
    }
}

/// A `Result` with `T` as success, and [`DbTxError`] as the error.
pub type DbTxResult<T, E> = std::result::Result<T, DbTxError<E>>;

impl<E> DbTxError<E>
where
    E: snafu::Error + 'static,
{
    pub fn tx_into<E2>(self) -> DbTxError<E2>
    where
        E2: From<E> + snafu::Error + 'static,
    {
        match self {
            DbTxError::DbError { source, location } => DbTxError::DbError { source, location },
            DbTxError::TxError { source, location } => DbTxError::TxError {
                source: source.into(),
                location,
            },
        }
    }

    pub fn map<E2>(self, f: impl FnOnce(E) -> E2) -> DbTxError<E2>
    where
        E2: snafu::Error + 'static,
    {
        match self {
            DbTxError::DbError { source, location } => DbTxError::DbError { source, location },
            DbTxError::TxError { source, location } => DbTxError::TxError {
                source: f(source),
                location,
            },
        }
    }

    /// Erase the logical error type
    pub fn whatever(self) -> DbTxError<Whatever>
    where
        E: Send + Sync,
    {
        self.map(Whatever::from_error)
    }

    /// The logical error, if this is not a storage error
    pub fn tx_error(&self) -> Option<&E> {
        match self {
            DbTxError::DbError { .. } => None,
            DbTxError::TxError { source, .. } => Some(source),
        }
    }
}

/// Separate storage errors from logical ones
///
/// Useful where the surrounding code can only propagate [`DbError`], like
/// read-only or simulated transactions.
pub fn split_tx_error<T, E>(res: DbTxResult<T, E>) -> DbResult<Result<T, E>>
where
    E: snafu::Error + 'static,
{
    match res {
        Ok(o) => Ok(Ok(o)),
        Err(DbTxError::TxError { source, .. }) => Ok(Err(source)),
        Err(DbTxError::DbError { source, .. }) => Err(source),
    }
}
