use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

use crate::config::{Config, Environment};
use crate::db::error::DbResult;
use crate::db::schema::SQLITE_INIT;
use crate::db::uow::UnitOfWork;

/// Owns the process-wide connection pool and hands out per-request
/// [`UnitOfWork`] instances. There is deliberately no global provider: the
/// binary constructs one at startup and injects it into the router state.
#[derive(Clone)]
pub struct ConnectionProvider {
    pool: SqlitePool,
}

impl ConnectionProvider {
    /// Connect to the database at `database_url`, applying the schema DDL.
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;

        apply_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Connect using the environment-selected URL from configuration.
    pub async fn from_config(cfg: &Config) -> DbResult<Self> {
        let env: Environment = cfg.basic.env;
        info!(%env, "loading {env} database");
        let provider = Self::connect(cfg.database_url()).await?;
        info!(%env, "{env} database loaded successfully");
        Ok(provider)
    }

    /// Fresh coordinator for one logical request.
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.pool.clone())
    }
}

async fn apply_schema(pool: &SqlitePool) -> DbResult<()> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
