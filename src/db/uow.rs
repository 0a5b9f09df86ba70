use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error, warn};

use crate::db::error::{DbError, DbResult};
use crate::db::users::UsersRepository;

/// Per-request transaction coordinator.
///
/// A `UnitOfWork` holds at most one open transaction at a time. Repository
/// accessors re-evaluate the transactional context on every call, so queries
/// issued before `begin_transaction` run against the bare pool and queries
/// issued after it run inside the transaction, in program order.
///
/// Query failures observed while a transaction is open roll it back before
/// the error is propagated; after catching a query error, callers must check
/// [`in_transaction`](Self::in_transaction) before committing or rolling back
/// again. `&mut self` on every operation statically enforces one in-flight
/// operation per instance.
pub struct UnitOfWork {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
}

/// The executor a repository call binds to: the open transaction when one
/// exists, the shared pool otherwise.
pub(crate) enum QueryContext<'c> {
    Pool(&'c SqlitePool),
    Tx(&'c mut SqliteConnection),
}

impl UnitOfWork {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool, tx: None }
    }

    /// Open a transaction. All subsequent repository calls issued through
    /// this instance run inside it until it ends.
    ///
    /// Fails with [`DbError::TransactionAlreadyActive`] if one is open.
    pub async fn begin_transaction(&mut self) -> DbResult<()> {
        if self.tx.is_some() {
            return Err(DbError::TransactionAlreadyActive);
        }
        let tx = self.pool.begin().await?;
        self.tx = Some(tx);
        debug!("transaction begun");
        Ok(())
    }

    /// Durably apply all writes issued under the open transaction and return
    /// to the no-transaction state.
    ///
    /// Fails with [`DbError::NoActiveTransaction`] if none is open.
    pub async fn commit_transaction(&mut self) -> DbResult<()> {
        let tx = self.tx.take().ok_or_else(|| DbError::no_active("commit"))?;
        tx.commit().await?;
        debug!("transaction committed");
        Ok(())
    }

    /// Discard all writes issued under the open transaction.
    ///
    /// Fails with [`DbError::NoActiveTransaction`] if none is open.
    pub async fn rollback_transaction(&mut self) -> DbResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::no_active("rollback"))?;
        tx.rollback().await?;
        debug!("transaction rolled back");
        Ok(())
    }

    /// True iff a transaction is currently open on this instance.
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Users repository bound to the current transactional context. The
    /// binding is re-evaluated on every query, not captured here.
    pub fn users(&mut self) -> UsersRepository<'_> {
        UsersRepository::bind(self)
    }

    pub(crate) fn context(&mut self) -> QueryContext<'_> {
        match self.tx.as_mut() {
            Some(tx) => QueryContext::Tx(&mut **tx),
            None => QueryContext::Pool(&self.pool),
        }
    }

    /// Single observation point for every repository query result.
    ///
    /// On failure with an open transaction, rolls the transaction back before
    /// propagating the error, so a failed query never leaves a half-applied
    /// transaction behind.
    pub(crate) async fn observe<T>(
        &mut self,
        result: Result<T, sqlx::Error>,
        statement: &str,
    ) -> DbResult<T> {
        match result {
            Ok(value) => {
                debug!(statement, "query executed");
                Ok(value)
            }
            Err(err) => {
                error!(statement, error = %err, "query failed");
                if let Some(tx) = self.tx.take() {
                    match tx.rollback().await {
                        Ok(()) => warn!("transaction rolled back after query failure"),
                        Err(rollback_err) => error!(
                            error = %rollback_err,
                            "rollback after query failure also failed"
                        ),
                    }
                }
                Err(DbError::QueryFailed(err))
            }
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // An instance left open at disposal is a caller bug; the underlying
        // transaction still rolls back when dropped, so the pool is not wedged.
        if self.tx.is_some() {
            warn!("unit of work dropped with an open transaction, discarding its writes");
        }
    }
}
