//! Database module: connection provider, unit of work, and repositories.
//!
//! Layout:
//! - `provider.rs`: pool ownership, schema init, per-request `UnitOfWork` factory
//! - `uow.rs`: transaction lifecycle coordinator (at most one open transaction)
//! - `users.rs`: `users` table repository, bound to the unit of work at call time
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)

pub mod error;
pub mod models;
pub mod provider;
pub mod schema;
pub mod uow;
pub mod users;

pub use error::{DbError, DbResult};
pub use models::{NewUser, User};
pub use provider::ConnectionProvider;
pub use schema::SQLITE_INIT;
pub use uow::UnitOfWork;
pub use users::UsersRepository;
