use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session token encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("Session token decoding error: {0}")]
    Decoding(String),
    #[error("Invalid session token")]
    InvalidToken,
    #[error("Session token expired")]
    TokenExpired,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: String,
    pub exp: usize,
    pub iat: usize,
}

/// Signs and verifies the session cookie (HS256).
#[derive(Clone)]
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    /// Without a configured secret a random one is generated, so sessions do
    /// not survive a restart.
    pub fn from_optional_secret(secret: Option<&str>, lifetime: Duration) -> Self {
        match secret {
            Some(secret) => Self::new(secret.as_bytes(), lifetime),
            None => {
                log::warn!(
                    "SESSION_SECRET not set. Using a random per-process secret; sessions will not survive restarts."
                );
                let random: [u8; 32] = rand::random();
                Self::new(&random, lifetime)
            }
        }
    }

    pub fn issue(&self, session_id: Uuid) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sid: session_id.to_string(),
            exp: (now + self.lifetime).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(SessionError::Encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, SessionError> {
        if token.split('.').count() != 3 {
            return Err(SessionError::InvalidToken);
        }

        let validation = Validation::new(Algorithm::HS256);
        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => {
                let now = Utc::now().timestamp() as usize;
                if data.claims.exp < now {
                    return Err(SessionError::TokenExpired);
                }
                Uuid::parse_str(&data.claims.sid).map_err(|_| SessionError::InvalidToken)
            }
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(SessionError::TokenExpired),
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    Err(SessionError::InvalidToken)
                }
                _ => Err(SessionError::Decoding(err.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_session_id() {
        let signer = SessionSigner::new(b"test-secret", Duration::hours(1));
        let id = Uuid::new_v4();
        let token = signer.issue(id).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), id);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let ours = SessionSigner::new(b"secret-a", Duration::hours(1));
        let theirs = SessionSigner::new(b"secret-b", Duration::hours(1));
        let token = theirs.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(ours.verify(&token), Err(SessionError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = SessionSigner::new(b"test-secret", Duration::hours(-2));
        let token = signer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(signer.verify(&token), Err(SessionError::TokenExpired)));
    }

    #[test]
    fn garbage_is_rejected() {
        let signer = SessionSigner::from_optional_secret(None, Duration::hours(1));
        assert!(matches!(signer.verify("not-a-token"), Err(SessionError::InvalidToken)));
    }
}
