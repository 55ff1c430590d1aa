//! JWT session token management

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AuthError;

/// Token payload: an arbitrary JSON object
pub type Claims = Map<String, Value>;

/// Signing configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub secret: String,
    pub algorithm: String,
}

/// Outcome of validating the token carried by one request
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStatus {
    /// No token was presented
    Missing,
    /// Bad structure, bad signature, or no usable `exp` claim
    Malformed,
    /// Signature checks out but `exp` is not in the future
    Expired,
    Valid(Claims),
}

impl TokenStatus {
    /// Collapse to the payload, or `None` for every rejected case
    pub fn into_claims(self) -> Option<Claims> {
        match self {
            TokenStatus::Valid(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TokenStatus::Missing => "missing",
            TokenStatus::Malformed => "malformed",
            TokenStatus::Expired => "expired",
            TokenStatus::Valid(_) => "valid",
        }
    }
}

/// Issues and validates HMAC-signed session tokens
#[derive(Clone)]
pub struct TokenSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenSigner {
    /// Build a signer, rejecting an empty secret or a non-HMAC algorithm
    pub fn new(config: &TokenConfig) -> Result<Self, AuthError> {
        if config.secret.is_empty() {
            return Err(AuthError::Signing("signing secret is empty".to_string()));
        }

        let algorithm = Algorithm::from_str(config.algorithm.trim()).map_err(|_| {
            AuthError::Signing(format!("unknown signing algorithm: {}", config.algorithm))
        })?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::Signing(format!(
                "unsupported signing algorithm for a shared secret: {:?}",
                algorithm
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign a copy of `claims` with `exp` set to now + `ttl`
    ///
    /// Any `exp` already present in `claims` is replaced.
    pub fn create_token(&self, claims: &Claims, ttl: Duration) -> Result<String, AuthError> {
        let exp = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Signing("token lifetime out of range".to_string()))?;

        let mut payload = claims.clone();
        payload.insert("exp".to_string(), Value::from(exp.timestamp()));

        encode(&Header::new(self.algorithm), &payload, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and structure; expiry is left to `check_expiry`
    pub fn decode(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }

    /// Run decode and the expiry check on an optional token
    pub fn validate(&self, token: Option<&str>) -> TokenStatus {
        let Some(token) = token else {
            return TokenStatus::Missing;
        };
        let Some(claims) = self.decode(token) else {
            return TokenStatus::Malformed;
        };
        check_expiry(claims, Utc::now())
    }
}

/// Accept claims whose `exp` is strictly later than `now`
pub fn check_expiry(claims: Claims, now: DateTime<Utc>) -> TokenStatus {
    let Some(exp) = claims.get("exp").and_then(Value::as_f64) else {
        debug!("Rejected session token: missing or non-numeric exp claim");
        return TokenStatus::Malformed;
    };

    let now = now.timestamp_millis() as f64 / 1000.0;
    if exp <= now {
        debug!("Rejected session token: expired at {}", exp);
        return TokenStatus::Expired;
    }

    TokenStatus::Valid(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(&TokenConfig {
            secret: secret.to_string(),
            algorithm: "HS256".to_string(),
        })
        .unwrap()
    }

    fn claims(value: Value) -> Claims {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_token_creation_and_validation() {
        let signer = signer("test-secret-key");
        let input = claims(json!({"sub": "1", "scope": "user", "n": 3}));

        let token = signer.create_token(&input, Duration::minutes(15)).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let payload = signer.validate(Some(&token)).into_claims().unwrap();
        for (key, value) in &input {
            assert_eq!(payload.get(key), Some(value));
        }
        let exp = payload.get("exp").and_then(Value::as_i64).unwrap();
        assert!(exp > Utc::now().timestamp());
    }

    #[test]
    fn test_exp_is_overwritten() {
        let signer = signer("test-secret-key");
        let input = claims(json!({"sub": "1", "exp": 1}));

        let token = signer.create_token(&input, Duration::minutes(5)).unwrap();
        assert!(matches!(signer.validate(Some(&token)), TokenStatus::Valid(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer("test-secret-key");
        let input = claims(json!({"sub": "1"}));

        let token = signer.create_token(&input, Duration::seconds(-1)).unwrap();
        let status = signer.validate(Some(&token));
        assert_eq!(status, TokenStatus::Expired);
        assert!(status.into_claims().is_none());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = signer("our-secret");
        let theirs = signer("their-secret");
        let input = claims(json!({"sub": "1", "admin": true}));

        let token = theirs.create_token(&input, Duration::minutes(15)).unwrap();
        assert_eq!(ours.validate(Some(&token)), TokenStatus::Malformed);
    }

    #[test]
    fn test_foreign_algorithm_rejected() {
        let hs256 = signer("shared-secret");
        let hs512 = TokenSigner::new(&TokenConfig {
            secret: "shared-secret".to_string(),
            algorithm: "HS512".to_string(),
        })
        .unwrap();

        let token = hs512
            .create_token(&claims(json!({"sub": "1"})), Duration::minutes(15))
            .unwrap();
        assert_eq!(hs256.validate(Some(&token)), TokenStatus::Malformed);
    }

    #[test]
    fn test_invalid_token() {
        let signer = signer("test-secret-key");

        assert_eq!(signer.validate(Some("invalid-token")), TokenStatus::Malformed);
        assert_eq!(signer.validate(Some("")), TokenStatus::Malformed);
        assert_eq!(signer.validate(None), TokenStatus::Missing);
    }

    #[test]
    fn test_missing_exp_rejected() {
        let signer = signer("test-secret-key");
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "1"}),
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert_eq!(signer.validate(Some(&token)), TokenStatus::Malformed);
    }

    #[test]
    fn test_check_expiry_boundary() {
        let now = Utc::now();
        let at = |exp: Value| claims(json!({ "exp": exp }));

        let exact = (now.timestamp_millis() as f64) / 1000.0;
        assert_eq!(check_expiry(at(json!(exact)), now), TokenStatus::Expired);
        assert_eq!(check_expiry(at(json!(now.timestamp() - 1)), now), TokenStatus::Expired);
        assert!(matches!(
            check_expiry(at(json!(now.timestamp() + 60)), now),
            TokenStatus::Valid(_)
        ));
        assert!(matches!(
            check_expiry(at(json!(exact + 0.5)), now),
            TokenStatus::Valid(_)
        ));
        assert_eq!(check_expiry(at(json!("tomorrow")), now), TokenStatus::Malformed);
    }

    #[test]
    fn test_bad_configuration_rejected() {
        let empty = TokenSigner::new(&TokenConfig {
            secret: String::new(),
            algorithm: "HS256".to_string(),
        });
        assert!(matches!(empty, Err(AuthError::Signing(_))));

        let unknown = TokenSigner::new(&TokenConfig {
            secret: "s".to_string(),
            algorithm: "HS999".to_string(),
        });
        assert!(matches!(unknown, Err(AuthError::Signing(_))));

        let asymmetric = TokenSigner::new(&TokenConfig {
            secret: "s".to_string(),
            algorithm: "RS256".to_string(),
        });
        assert!(matches!(asymmetric, Err(AuthError::Signing(_))));
    }

    #[test]
    fn test_ttl_overflow_is_a_signing_error() {
        let signer = signer("test-secret-key");
        let result = signer.create_token(&Claims::new(), Duration::MAX);
        assert!(matches!(result, Err(AuthError::Signing(_))));
    }
}
