use chrono::Utc;
use uuid::Uuid;

use crate::db::error::DbResult;
use crate::db::models::{NewUser, User};
use crate::db::uow::{QueryContext, UnitOfWork};

/// Dispatch one query against the unit of work's call-time context, then
/// funnel the result through its failure-observation point.
macro_rules! run_query {
    ($repo:expr, $sql:expr, $call:ident, $query:expr) => {{
        let result = match $repo.uow.context() {
            QueryContext::Pool(pool) => $query.$call(pool).await,
            QueryContext::Tx(conn) => $query.$call(conn).await,
        };
        $repo.uow.observe(result, $sql).await
    }};
}

/// Read/write access to the `users` table. Holds no connection of its own;
/// every call is bound to the owning [`UnitOfWork`]'s current context.
pub struct UsersRepository<'u> {
    uow: &'u mut UnitOfWork,
}

impl<'u> UsersRepository<'u> {
    pub(crate) fn bind(uow: &'u mut UnitOfWork) -> Self {
        Self { uow }
    }

    pub async fn get_by_username(&mut self, username: &str) -> DbResult<Option<User>> {
        const SQL: &str = "
        SELECT id, username, password, first_name, last_name, created_at, updated_at
        FROM users
        WHERE username = ?
        ";
        run_query!(
            self,
            SQL,
            fetch_optional,
            sqlx::query_as::<_, User>(SQL).bind(username)
        )
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<User>> {
        const SQL: &str = "
        SELECT id, username, password, first_name, last_name, created_at, updated_at
        FROM users
        WHERE id = ?
        ";
        run_query!(
            self,
            SQL,
            fetch_optional,
            sqlx::query_as::<_, User>(SQL).bind(id)
        )
    }

    /// Insert a new account. The identifier and timestamps are generated
    /// here, server-side, and the identifier is never reassigned.
    pub async fn create(&mut self, new_user: NewUser) -> DbResult<User> {
        const SQL: &str = "
        INSERT INTO users (id, username, password, first_name, last_name, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ";
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new_user.username,
            password: new_user.password,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            created_at: now,
            updated_at: now,
        };
        run_query!(
            self,
            SQL,
            execute,
            sqlx::query(SQL)
                .bind(&user.id)
                .bind(&user.username)
                .bind(&user.password)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(user.created_at)
                .bind(user.updated_at)
        )?;
        Ok(user)
    }

    /// Replace the stored password hash for an account.
    pub async fn update_password(&mut self, id: &str, password: &str) -> DbResult<()> {
        const SQL: &str = "
        UPDATE users
        SET password = ?, updated_at = ?
        WHERE id = ?
        ";
        run_query!(
            self,
            SQL,
            execute,
            sqlx::query(SQL).bind(password).bind(Utc::now()).bind(id)
        )?;
        Ok(())
    }
}
