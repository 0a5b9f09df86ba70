use thiserror::Error;

/// Transaction-lifecycle and query errors surfaced by the unit of work.
///
/// The two state-machine variants are programmer errors: they are never
/// retried and never remediated automatically. `QueryFailed` is the only
/// variant that triggers automatic rollback (when a transaction is open).
#[derive(Debug, Error)]
pub enum DbError {
    /// `begin_transaction` called while this unit of work already holds one.
    #[error("cannot begin transaction, a transaction already exists for this unit of work")]
    TransactionAlreadyActive,

    /// Commit or rollback called with no open transaction.
    #[error("cannot {operation} transaction, a transaction does not exist for this unit of work")]
    NoActiveTransaction { operation: &'static str },

    /// Store-reported failure: constraint violation, connectivity loss, syntax error.
    #[error("query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}

impl DbError {
    pub(crate) fn no_active(operation: &'static str) -> Self {
        DbError::NoActiveTransaction { operation }
    }

    /// True when the underlying store rejected a write for violating a unique
    /// constraint. Handlers use this to map conflicts to client-facing errors.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::QueryFailed(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
