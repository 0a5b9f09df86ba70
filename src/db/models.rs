use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A portal account row. The identifier is a server-generated UUID assigned
/// at creation and never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Salted Argon2id hash, never the cleartext.
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `users`; id and timestamps are generated by the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    /// Already-hashed password material.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}
