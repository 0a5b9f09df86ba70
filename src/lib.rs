pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod vmapi;

pub use db::{ConnectionProvider, UnitOfWork};
pub use error::ApiError;
