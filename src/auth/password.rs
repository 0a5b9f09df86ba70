use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::auth::AuthError;

/// Hash a cleartext password with Argon2id and a fresh random salt.
///
/// Hashing is deliberately expensive, so it runs on the blocking pool rather
/// than stalling the async executor.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hash(err.to_string()))
    })
    .await
    .map_err(|err| AuthError::Hash(format!("hashing task aborted: {err}")))?
}

/// Verify a cleartext password against a stored salted hash, off the async
/// executor. Returns `Ok(false)` on mismatch; `Err` only when the stored
/// hash itself is malformed or the task is aborted.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, AuthError> {
    task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored_hash).map_err(|err| AuthError::Hash(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|err| AuthError::Hash(format!("verification task aborted: {err}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_roundtrip() {
        let hash = hash_password("hunter2hunter2".to_string()).await.unwrap();
        assert_ne!(hash, "hunter2hunter2");
        assert!(
            verify_password("hunter2hunter2".to_string(), hash.clone())
                .await
                .unwrap()
        );
        assert!(
            !verify_password("wrong-password".to_string(), hash)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        let result = verify_password("whatever".to_string(), "not-a-phc-string".to_string()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn same_password_hashes_differently_per_salt() {
        let first = hash_password("correct horse".to_string()).await.unwrap();
        let second = hash_password("correct horse".to_string()).await.unwrap();
        assert_ne!(first, second);
    }
}
