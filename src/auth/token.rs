use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::config::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a bearer token for `user_id`, valid for the configured window.
pub fn issue_token(user_id: &str, cfg: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now();
    let valid_for = Duration::seconds(i64::try_from(cfg.jwt_valid_secs).unwrap_or(i64::MAX));
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + valid_for).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_ref()),
    )
    .map_err(AuthError::from)
}

/// Decode and validate a bearer token, returning its claims.
pub fn verify_token(token: &str, cfg: &AuthConfig) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_valid_secs: 3600,
        }
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let cfg = test_config();
        let token = issue_token("user-1234", &cfg).unwrap();
        let claims = verify_token(&token, &cfg).unwrap();
        assert_eq!(claims.sub, "user-1234");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cfg = test_config();
        let token = issue_token("user-1234", &cfg).unwrap();

        let other = AuthConfig {
            jwt_secret: "another-secret".to_string(),
            jwt_valid_secs: 3600,
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = test_config();
        let now = Utc::now();
        // Past the default validation leeway.
        let claims = Claims {
            sub: "user-1234".to_string(),
            iat: (now - Duration::seconds(7200)).timestamp(),
            exp: (now - Duration::seconds(3600)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(cfg.jwt_secret.as_ref()),
        )
        .unwrap();

        assert!(verify_token(&token, &cfg).is_err());
    }
}
