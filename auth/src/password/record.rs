use std::fmt;
use std::str::FromStr;

use super::errors::PasswordError;

/// Scheme tag of every record produced by this crate.
pub const SCHEME: &str = "pbkdf2";

const DELIMITER: char = '$';

/// Stored form of a hashed password.
///
/// Serializes as `pbkdf2$<iterations>$<salt>$<hash>` where `salt` is the
/// hex text used as PBKDF2 salt input and `hash` is the hex-encoded derived key.
/// The iteration count travels with the record so older records keep verifying
/// after the default changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRecord {
    pub iterations: u32,
    pub salt: String,
    pub hash: String,
}

impl PasswordRecord {
    /// Decode the stored hash into raw bytes.
    ///
    /// # Errors
    /// * `MalformedRecord` - Hash field is not valid hex
    pub fn hash_bytes(&self) -> Result<Vec<u8>, PasswordError> {
        hex::decode(&self.hash)
            .map_err(|e| PasswordError::MalformedRecord(format!("hash is not hex: {}", e)))
    }
}

impl fmt::Display for PasswordRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.iterations, self.salt, self.hash
        )
    }
}

impl FromStr for PasswordRecord {
    type Err = PasswordError;

    /// Parse a stored record.
    ///
    /// # Errors
    /// * `UnrecognizedScheme` - First field is not `pbkdf2`
    /// * `MalformedRecord` - Wrong field count, bad iteration count or empty salt/hash
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(DELIMITER).collect();

        let scheme = fields.first().copied().unwrap_or_default();
        if scheme != SCHEME {
            return Err(PasswordError::UnrecognizedScheme(scheme.to_string()));
        }

        let [_, iterations, salt, hash] = fields.as_slice() else {
            return Err(PasswordError::MalformedRecord(format!(
                "expected 4 fields, got {}",
                fields.len()
            )));
        };

        let iterations: u32 = iterations.parse().map_err(|_| {
            PasswordError::MalformedRecord(format!("invalid iteration count: {}", iterations))
        })?;
        if iterations == 0 {
            return Err(PasswordError::MalformedRecord(
                "iteration count must be positive".to_string(),
            ));
        }

        if salt.is_empty() || hash.is_empty() {
            return Err(PasswordError::MalformedRecord(
                "salt and hash must not be empty".to_string(),
            ));
        }

        Ok(Self {
            iterations,
            salt: salt.to_string(),
            hash: hash.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_wire_format() {
        let record = PasswordRecord {
            iterations: 120000,
            salt: "00ff".to_string(),
            hash: "abcd".to_string(),
        };
        assert_eq!(record.to_string(), "pbkdf2$120000$00ff$abcd");
    }

    #[test]
    fn test_parse_valid_record() {
        let record: PasswordRecord = "pbkdf2$1000$deadbeef$cafe".parse().unwrap();
        assert_eq!(record.iterations, 1000);
        assert_eq!(record.salt, "deadbeef");
        assert_eq!(record.hash_bytes().unwrap(), vec![0xca, 0xfe]);
    }

    #[test]
    fn test_parse_unknown_scheme() {
        let result = "bcrypt$10$salt$hash".parse::<PasswordRecord>();
        assert_eq!(
            result,
            Err(PasswordError::UnrecognizedScheme("bcrypt".to_string()))
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            "garbage".parse::<PasswordRecord>(),
            Err(PasswordError::UnrecognizedScheme(_))
        ));
        assert!(matches!(
            "".parse::<PasswordRecord>(),
            Err(PasswordError::UnrecognizedScheme(_))
        ));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        assert!(matches!(
            "pbkdf2$1000$salt".parse::<PasswordRecord>(),
            Err(PasswordError::MalformedRecord(_))
        ));
        assert!(matches!(
            "pbkdf2$1000$salt$hash$extra".parse::<PasswordRecord>(),
            Err(PasswordError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_parse_bad_iterations() {
        assert!(matches!(
            "pbkdf2$many$salt$abcd".parse::<PasswordRecord>(),
            Err(PasswordError::MalformedRecord(_))
        ));
        assert!(matches!(
            "pbkdf2$0$salt$abcd".parse::<PasswordRecord>(),
            Err(PasswordError::MalformedRecord(_))
        ));
        assert!(matches!(
            "pbkdf2$-5$salt$abcd".parse::<PasswordRecord>(),
            Err(PasswordError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_hash_bytes_rejects_non_hex() {
        let record: PasswordRecord = "pbkdf2$1000$salt$zz".parse().unwrap();
        assert!(record.hash_bytes().is_err());
    }
}
