use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::errors::PasswordError;
use super::record::PasswordRecord;

/// Iteration count applied to newly hashed passwords.
pub const DEFAULT_ITERATIONS: u32 = 120_000;

/// Random salt length in bytes (hex-encoded to twice as many characters).
pub const SALT_LENGTH: usize = 16;

/// Derived key length in bytes.
pub const KEY_LENGTH: usize = 64;

/// Password hashing implementation.
///
/// Derives keys with PBKDF2-HMAC-SHA512 and stores them as [`PasswordRecord`]s.
/// Stateless apart from the iteration count used for new records, so a single
/// instance can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    /// Create a new password hasher using [`DEFAULT_ITERATIONS`].
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Create a hasher with a custom iteration count for new records.
    ///
    /// A count of zero is raised to one.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Iteration count written into new records.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Password record including scheme, iterations, salt and derived key
    ///
    /// # Errors
    /// * `HashingFailed` - The OS random number generator is unavailable
    pub fn hash(&self, password: &str) -> Result<PasswordRecord, PasswordError> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(self.hash_with_salt(password, &hex::encode(salt)))
    }

    /// Hash a plaintext password with a caller-supplied salt.
    ///
    /// Deterministic: the same password and salt always produce the same record.
    pub fn hash_with_salt(&self, password: &str, salt: &str) -> PasswordRecord {
        PasswordRecord {
            iterations: self.iterations,
            salt: salt.to_string(),
            hash: hex::encode(derive_key(password, salt, self.iterations)),
        }
    }

    /// Verify a password against a stored record string.
    ///
    /// Never fails: an unparseable record or unknown scheme is reported as a
    /// mismatch, indistinguishable from a wrong password.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored` - Record in `pbkdf2$iterations$salt$hash` form
    ///
    /// # Returns
    /// True if password matches, false otherwise
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        match stored.parse::<PasswordRecord>() {
            Ok(record) => self.verify_record(password, &record),
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting unparseable password record");
                false
            }
        }
    }

    /// Verify a password against an already parsed record.
    ///
    /// Uses the iteration count and salt embedded in the record, not the
    /// hasher's own setting.
    pub fn verify_record(&self, password: &str, record: &PasswordRecord) -> bool {
        let expected = match record.hash_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting unparseable password record");
                return false;
            }
        };

        let candidate = derive_key(password, &record.salt, record.iterations);

        // Length mismatch yields false inside ct_eq without an early exit on content.
        candidate.as_slice().ct_eq(expected.as_slice()).into()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_key(password: &str, salt: &str, iterations: u32) -> [u8; KEY_LENGTH] {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    key
}
