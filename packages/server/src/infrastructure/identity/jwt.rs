//! JWT based identity verification.
//!
//! Tokens carry `{ id, username, exp }`, the same claims the login endpoint
//! of the surrounding system issues.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, DisplayName, Identity, IdentityVerifier, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub exp: u64,
}

pub struct JwtIdentityVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `identity` valid for `ttl`.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, AuthError> {
        let exp = chrono::Utc::now().timestamp().max(0) as u64 + ttl.as_secs();
        self.encode_claims(&Claims {
            id: identity.id.value(),
            username: identity.display_name.as_str().to_string(),
            exp,
        })
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, credential: Option<&str>) -> Result<Identity, AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        let id = UserId::new(data.claims.id)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        let display_name = DisplayName::new(data.claims.username)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        Ok(Identity::new(id, display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn alice() -> Identity {
        Identity::new(
            UserId::new(1).unwrap(),
            DisplayName::new("alice".to_string()).unwrap(),
        )
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }

    #[test]
    fn test_issue_then_verify() {
        // テスト項目: 発行したトークンから同じ Identity が解決される
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(SECRET);
        let token = verifier.issue(&alice(), Duration::from_secs(3600)).unwrap();

        // when (操作):
        let identity = verifier.verify(Some(&token));

        // then (期待する結果):
        assert_eq!(identity, Ok(alice()));
    }

    #[test]
    fn test_missing_credential_is_unauthenticated() {
        // テスト項目: 認証情報がない・空の場合は Unauthenticated
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(SECRET);

        // when (操作) / then (期待する結果):
        assert_eq!(verifier.verify(None), Err(AuthError::Unauthenticated));
        assert_eq!(verifier.verify(Some("  ")), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        // テスト項目: 形式不正のトークンは InvalidCredential
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(SECRET);

        // when (操作):
        let result = verifier.verify(Some("not-a-jwt"));

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::InvalidCredential(_))));
    }

    #[test]
    fn test_wrong_signature_is_invalid() {
        // テスト項目: 別の秘密鍵で署名されたトークンは InvalidCredential
        // given (前提条件):
        let other = JwtIdentityVerifier::new("other-secret");
        let token = other.issue(&alice(), Duration::from_secs(3600)).unwrap();
        let verifier = JwtIdentityVerifier::new(SECRET);

        // when (操作):
        let result = verifier.verify(Some(&token));

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::InvalidCredential(_))));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        // テスト項目: 期限切れのトークンは InvalidCredential
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(SECRET);
        let token = verifier
            .encode_claims(&Claims {
                id: 1,
                username: "alice".to_string(),
                exp: now() - 3600,
            })
            .unwrap();

        // when (操作):
        let result = verifier.verify(Some(&token));

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::InvalidCredential(_))));
    }

    #[test]
    fn test_invalid_claims_are_rejected() {
        // テスト項目: ID が 0 以下、またはユーザー名が空のクレームは InvalidCredential
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(SECRET);
        let bad_id = verifier
            .encode_claims(&Claims {
                id: 0,
                username: "alice".to_string(),
                exp: now() + 3600,
            })
            .unwrap();
        let blank_name = verifier
            .encode_claims(&Claims {
                id: 1,
                username: " ".to_string(),
                exp: now() + 3600,
            })
            .unwrap();

        // when (操作) / then (期待する結果):
        assert!(matches!(
            verifier.verify(Some(&bad_id)),
            Err(AuthError::InvalidCredential(_))
        ));
        assert!(matches!(
            verifier.verify(Some(&blank_name)),
            Err(AuthError::InvalidCredential(_))
        ));
    }
}
