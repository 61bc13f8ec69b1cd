use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Default token lifetime: seven days.
pub const DEFAULT_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Value of the `typ` header field on every issued token.
pub const TOKEN_TYPE: &str = "token";

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signs and verifies identity tokens.
///
/// Tokens are `base64url(header).base64url(claims).base64url(signature)` without
/// padding, signed with HMAC-SHA256 under a single deployment secret. The codec
/// accepts HS256 only; the `alg` field of an incoming token is never used to pick
/// a verification algorithm.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenCodec {
    /// Create a new codec with a secret key and the default lifetime.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, DEFAULT_TTL_SECONDS)
    }

    /// Create a new codec with a custom default lifetime in seconds.
    pub fn with_ttl(secret: &[u8], ttl_seconds: i64) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // `exp` is checked when present but not required, with no clock leeway.
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        }
    }

    /// Lifetime applied by [`TokenCodec::sign`].
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign claims with the codec's default lifetime.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        self.sign_with_ttl(claims, self.ttl_seconds)
    }

    /// Sign claims, stamping `iat = now` and `exp = now + ttl_seconds`.
    ///
    /// Any `iat`/`exp` already present in `claims` is overwritten on the signed copy.
    ///
    /// # Arguments
    /// * `claims` - Claims to sign
    /// * `ttl_seconds` - Lifetime of the token; negative values produce an already expired token
    ///
    /// # Returns
    /// Token string
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized
    pub fn sign_with_ttl(&self, claims: &Claims, ttl_seconds: i64) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let stamped = claims
            .clone()
            .with_issued_at(now)
            .with_expiration(now.saturating_add(ttl_seconds));

        encode(&header(), &stamped, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Arguments
    /// * `token` - Token string to verify
    ///
    /// # Returns
    /// Decoded claims, including the stamped `iat` and `exp`
    ///
    /// # Errors
    /// * `MalformedToken` - Not exactly three non-empty segments, or a segment does not decode
    /// * `BadSignature` - Signature does not match the recomputed HMAC, or header names another algorithm
    /// * `Expired` - `exp` is present and lies in the past
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(TokenError::MalformedToken);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::MissingAlgorithm => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::MalformedToken,
            })?;

        // jsonwebtoken reads `exp` as u64 and skips negative values.
        if claims.is_expired(Utc::now().timestamp()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn header() -> Header {
    let mut header = Header::new(ALGORITHM);
    header.typ = Some(TOKEN_TYPE.to_string());
    header
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;
    use crate::gate::Role;
    use crate::token::Subject;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    fn decode_segment(segment: &str) -> serde_json::Value {
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let codec = TokenCodec::new(SECRET);
        let claims = Claims::for_user(42, "ann", Role::User);

        let token = codec.sign_with_ttl(&claims, 3600).expect("Failed to sign token");
        let decoded = codec.verify(&token).expect("Failed to verify token");

        assert_eq!(decoded.sub, Some(Subject::Number(42)));
        assert_eq!(decoded.username.as_deref(), Some("ann"));
        assert_eq!(decoded.role.as_deref(), Some("user"));

        let iat = decoded.iat.unwrap();
        assert_eq!(decoded.exp, Some(iat + 3600));
        assert!((Utc::now().timestamp() - iat).abs() <= 1);

        let expected = claims.with_issued_at(iat).with_expiration(iat + 3600);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_default_ttl_is_seven_days() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.sign(&Claims::new().with_subject("a")).unwrap();
        let decoded = codec.verify(&token).unwrap();
        assert_eq!(
            decoded.exp.unwrap() - decoded.iat.unwrap(),
            DEFAULT_TTL_SECONDS
        );
    }

    #[test]
    fn test_wire_format() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.sign(&Claims::new().with_subject("a")).unwrap();

        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));

        let header = decode_segment(segments[0]);
        assert_eq!(header, serde_json::json!({ "alg": "HS256", "typ": "token" }));

        // HMAC-SHA256 digest is 32 bytes, 43 base64url characters without padding.
        assert_eq!(segments[2].len(), 43);
    }

    #[test]
    fn test_verify_malformed_token() {
        let codec = TokenCodec::new(SECRET);

        for token in ["", "abc", "a.b", "a.b.c.d", "..", "a..c", ".b.c", "a.b."] {
            assert_eq!(codec.verify(token), Err(TokenError::MalformedToken), "{token}");
        }
    }

    #[test]
    fn test_verify_garbage_segments() {
        let codec = TokenCodec::new(SECRET);
        let result = codec.verify("invalid.token.here");
        assert!(matches!(
            result,
            Err(TokenError::MalformedToken) | Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let codec1 = TokenCodec::new(b"secret1_at_least_32_bytes_long_key!");
        let codec2 = TokenCodec::new(b"secret2_at_least_32_bytes_long_key!");

        let token = codec1.sign(&Claims::new().with_subject("user123")).unwrap();

        assert_eq!(codec2.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_expired_token() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .sign_with_ttl(&Claims::new().with_subject("user123"), -1)
            .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .sign(&Claims::for_user(1, "ann", Role::User))
            .unwrap();

        let forged_claims = codec
            .sign(&Claims::for_user(1, "ann", Role::Admin))
            .unwrap();

        let original: Vec<&str> = token.split('.').collect();
        let forged: Vec<&str> = forged_claims.split('.').collect();
        let spliced = format!("{}.{}.{}", original[0], forged[1], original[2]);

        assert_eq!(codec.verify(&spliced), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_single_character_flip_never_verifies() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .sign_with_ttl(&Claims::for_user(42, "ann", Role::User), 3600)
            .unwrap();

        for (index, original) in token.char_indices() {
            if original == '.' {
                continue;
            }
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(index..index + 1, &replacement.to_string());

            let result = codec.verify(&tampered);
            assert!(
                matches!(
                    result,
                    Err(TokenError::BadSignature) | Err(TokenError::MalformedToken)
                ),
                "flip at {index} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let codec = TokenCodec::new(SECRET);

        let mut header = Header::new(Algorithm::HS512);
        header.typ = Some(TOKEN_TYPE.to_string());
        let token = encode(
            &header,
            &Claims::new().with_subject("user123"),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_token_without_expiration_is_accepted() {
        let codec = TokenCodec::new(SECRET);
        let token = encode(
            &header(),
            &Claims::new().with_subject("user123"),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_negative_expiration_is_expired() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();

        let token = codec
            .sign_with_ttl(&Claims::new().with_subject(1), -(now + 10))
            .unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));

        let token = codec
            .sign_with_ttl(&Claims::new().with_subject(1), i64::MIN)
            .unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiration_equal_to_now_verifies() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();

        let token = encode(
            &header(),
            &Claims::new().with_subject(1).with_expiration(now + 1),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(codec.verify(&token).is_ok());

        let claims = Claims::new().with_expiration(now);
        assert!(!claims.is_expired(now));
        assert!(claims.is_expired(now + 1));
    }
}
