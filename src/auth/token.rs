//! HS256 JSON Web Tokens for bearer authentication.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::db::models::{Profile, Role};
use crate::error::LawdeskError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

impl Default for JwtHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Profile id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens with one shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    secret: Vec<u8>,
    ttl_secs: i64,
}

/// Longest accepted token lifetime: ten years.
const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

impl TokenKeys {
    /// `ttl_hours` is clamped to [`MAX_TTL_HOURS`].
    pub fn new(secret: impl AsRef<[u8]>, ttl_hours: u64) -> Self {
        let hours = i64::try_from(ttl_hours.min(MAX_TTL_HOURS)).unwrap_or(i64::MAX);
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_secs: hours.saturating_mul(3600),
        }
    }

    pub fn issue(&self, profile: &Profile) -> Result<String, LawdeskError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: profile.id.clone(),
            email: profile.email.clone(),
            role: profile.role,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        self.encode(&claims)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, LawdeskError> {
        let claims: Claims = self.decode(token)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(LawdeskError::InvalidToken("token expired".to_string()));
        }
        Ok(claims)
    }

    fn encode<T: Serialize>(&self, claims: &T) -> Result<String, LawdeskError> {
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&JwtHeader::default())?);
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature_b64 = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes())?);
        Ok(format!("{signing_input}.{signature_b64}"))
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, LawdeskError> {
        let invalid = |reason: &str| LawdeskError::InvalidToken(reason.to_string());

        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("malformed token"));
        };

        let provided = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| invalid("bad signature encoding"))?;
        let expected = self.sign(format!("{header_b64}.{payload_b64}").as_bytes())?;
        if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            return Err(invalid("signature mismatch"));
        }

        let header: JwtHeader = URL_SAFE_NO_PAD
            .decode(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| invalid("bad header"))?;
        if header.alg != "HS256" {
            return Err(invalid("unsupported algorithm"));
        }

        URL_SAFE_NO_PAD
            .decode(payload_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| invalid("bad payload"))
    }

    fn sign(&self, input: &[u8]) -> Result<Vec<u8>, LawdeskError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| LawdeskError::Config(format!("invalid jwt secret: {e}")))?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> Profile {
        Profile {
            id: "p-1".to_string(),
            email: "lawyer@example.com".to_string(),
            role,
            full_name: None,
            phone: None,
            address: None,
            license_number: None,
            specialization: None,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let keys = TokenKeys::new("test-secret", 1);
        let token = keys.issue(&profile(Role::Admin)).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "p-1");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenKeys::new("secret-a", 1)
            .issue(&profile(Role::Lawyer))
            .unwrap();
        assert!(matches!(
            TokenKeys::new("secret-b", 1).verify(&token),
            Err(LawdeskError::InvalidToken(_))
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = TokenKeys::new("test-secret", 1);
        let token = keys.issue(&profile(Role::Lawyer)).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            r#"{"sub":"p-1","email":"lawyer@example.com","role":"admin","iat":0,"exp":99999999999}"#,
        );
        parts[1] = &forged;
        assert!(keys.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", 0);
        let token = keys.issue(&profile(Role::Lawyer)).unwrap();
        assert!(matches!(
            keys.verify(&token),
            Err(LawdeskError::InvalidToken(reason)) if reason == "token expired"
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = TokenKeys::new("test-secret", 1);
        assert!(keys.verify("invalid-token").is_err());
        assert!(keys.verify("a.b.c.d").is_err());
    }

    #[test]
    fn huge_ttl_is_clamped() {
        let keys = TokenKeys::new("test-secret", u64::MAX);
        let token = keys.issue(&profile(Role::Lawyer)).unwrap();
        let claims = keys.verify(&token).unwrap();
        let max_secs = i64::try_from(MAX_TTL_HOURS * 3600).unwrap();
        assert_eq!(claims.exp - claims.iat, max_secs);
    }
}
