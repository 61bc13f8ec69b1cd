use crate::gate::AuthGate;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::password::PasswordRecord;
use crate::token::Claims;
use crate::token::TokenCodec;
use crate::token::TokenError;

/// Authentication coordinator combining password verification and token issuance.
///
/// Owns one password hasher and one token codec; the request gate shares the
/// codec so tokens issued here are exactly the ones the gate accepts.
#[derive(Clone)]
pub struct Authenticator {
    password_hasher: PasswordHasher,
    gate: AuthGate,
}

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// Signed access token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator with default token lifetime and iteration count.
    ///
    /// # Arguments
    /// * `secret` - Secret key for token signing
    pub fn new(secret: &[u8]) -> Self {
        Self::from_parts(PasswordHasher::new(), TokenCodec::new(secret))
    }

    /// Create an authenticator from an explicitly configured hasher and codec.
    pub fn from_parts(password_hasher: PasswordHasher, token_codec: TokenCodec) -> Self {
        Self {
            password_hasher,
            gate: AuthGate::new(token_codec),
        }
    }

    /// Request gate sharing this authenticator's codec.
    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn password_hasher(&self) -> &PasswordHasher {
        &self.password_hasher
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `HashingFailed` - Random salt could not be generated
    pub fn hash_password(&self, password: &str) -> Result<PasswordRecord, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a password against a stored record; malformed records never match.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue a token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password record
    /// * `claims` - Claims to sign into the token
    ///
    /// # Returns
    /// AuthenticationResult with access token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match or record is unusable
    /// * `TokenError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        claims: &Claims,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.issue_token(claims)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Issue a token without password verification.
    ///
    /// Used after registration, where the password was just hashed.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_token(&self, claims: &Claims) -> Result<String, TokenError> {
        self.gate.codec().sign(claims)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// * `MalformedToken`, `BadSignature`, `Expired` - see [`TokenCodec::verify`]
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.gate.codec().verify(token)
    }
}
