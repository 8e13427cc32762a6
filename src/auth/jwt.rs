use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Student id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 bearer-token signer/verifier shared across the app.
pub struct JwtConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    pub fn issue(&self, student_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: student_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Returns the student id a valid token was issued for.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Your token has expired. Please log in again.".to_string())
                }
                _ => AppError::Unauthorized("Invalid token. Please log in again.".to_string()),
            }
        })?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token. Please log in again.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let jwt = JwtConfig::new("test-secret", 24);
        let id = Uuid::new_v4();
        let token = jwt.issue(id).unwrap();
        assert_eq!(jwt.verify(&token).unwrap(), id);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let jwt = JwtConfig::new("test-secret", 24);
        let other = JwtConfig::new("other-secret", 24);
        let token = jwt.issue(Uuid::new_v4()).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        // Negative expiry puts exp in the past, beyond the default leeway.
        let jwt = JwtConfig::new("test-secret", -2);
        let token = jwt.issue(Uuid::new_v4()).unwrap();
        let err = jwt.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m.contains("expired")));
    }
}
